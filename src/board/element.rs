//! Whiteboard elements and snapshots.
//!
//! DESIGN
//! ======
//! An element is a flat JSON object whose `tool` field selects the variant.
//! Geometry and style are shared by every tool; text, table and image
//! elements carry their own payload. Any participant may change or delete
//! any element. Ids are unique within a snapshot and deleting a missing id
//! is a no-op.

use serde::{Deserialize, Serialize};

/// The full ordered element list at one instant.
pub type Snapshot = Vec<Element>;

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub brush_size: f64,
    /// Flat `[x0, y0, x1, y1, ...]` path for strokes, lines and curves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ElementKind {
    Pencil,
    Highlighter,
    WhiteEraser,
    Eraser,
    Curve,
    Rect,
    Circle,
    Triangle,
    Arrow,
    Line,
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
    },
    Table {
        rows: usize,
        cols: usize,
        cell_width: f64,
        cell_height: f64,
        /// `rows` x `cols` grid of cell text.
        data: Vec<Vec<String>>,
    },
    Image {
        src: String,
    },
}

impl Element {
    /// A bare element of `kind` at the origin with unit scale.
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            color: String::new(),
            fill_color: None,
            brush_size: 0.0,
            points: Vec::new(),
        }
    }

    /// Empty `rows` x `cols` table.
    #[must_use]
    pub fn table(id: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self::new(
            id,
            ElementKind::Table { rows, cols, cell_width: 100.0, cell_height: 40.0, data: vec![vec![String::new(); cols]; rows] },
        )
    }

    /// Overwrite one table cell. False for non-tables or out-of-range cells.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let ElementKind::Table { data, .. } = &mut self.kind else {
            return false;
        };
        match data.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }
}

/// Find an element by id.
#[must_use]
pub fn find<'a>(snapshot: &'a [Element], id: &str) -> Option<&'a Element> {
    snapshot.iter().find(|el| el.id == id)
}

/// Replace the element with the same id in place, or append it.
pub fn upsert(snapshot: &mut Snapshot, element: Element) {
    match snapshot.iter_mut().find(|el| el.id == element.id) {
        Some(existing) => *existing = element,
        None => snapshot.push(element),
    }
}

/// Delete by id. Missing ids are ignored; returns whether anything was removed.
pub fn remove(snapshot: &mut Snapshot, id: &str) -> bool {
    let before = snapshot.len();
    snapshot.retain(|el| el.id != id);
    snapshot.len() != before
}

#[cfg(test)]
#[path = "element_test.rs"]
mod tests;
