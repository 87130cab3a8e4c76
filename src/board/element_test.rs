use super::*;
use serde_json::json;

#[test]
fn stroke_reads_client_shape() {
    let el: Element = serde_json::from_value(json!({
        "id": "el_1", "tool": "white-eraser", "color": "#ffffff", "brushSize": 3,
        "points": [0, 0, 5, 5], "x": 0, "y": 0, "width": 0, "height": 0,
        "scaleX": 1, "scaleY": 1, "rotation": 0
    }))
    .unwrap();
    assert_eq!(el.kind, ElementKind::WhiteEraser);
    assert_eq!(el.points, vec![0.0, 0.0, 5.0, 5.0]);
    assert!((el.brush_size - 3.0).abs() < f64::EPSILON);
}

#[test]
fn missing_scale_defaults_to_one() {
    let el: Element = serde_json::from_value(json!({"id": "r", "tool": "rect", "width": 10, "height": 5})).unwrap();
    assert!((el.scale_x - 1.0).abs() < f64::EPSILON);
    assert!((el.scale_y - 1.0).abs() < f64::EPSILON);
    assert!(el.fill_color.is_none());
}

#[test]
fn text_and_table_carry_tool_payload() {
    let text: Element =
        serde_json::from_value(json!({"id": "t", "tool": "text", "text": "hello", "fontSize": 12})).unwrap();
    assert_eq!(text.kind, ElementKind::Text { text: "hello".into(), font_size: Some(12.0) });

    let table = Element::table("tb", 2, 3);
    let value = serde_json::to_value(&table).unwrap();
    assert_eq!(value["tool"], "table");
    assert_eq!(value["cellWidth"], 100.0);
    assert_eq!(value["data"], json!([["", "", ""], ["", "", ""]]));
}

#[test]
fn unknown_tool_is_rejected() {
    assert!(serde_json::from_value::<Element>(json!({"id": "b", "tool": "bucket"})).is_err());
}

#[test]
fn set_cell_bounds_checked() {
    let mut table = Element::table("tb", 2, 2);
    assert!(table.set_cell(1, 1, "x"));
    assert!(!table.set_cell(2, 0, "y"));

    let ElementKind::Table { data, .. } = &table.kind else {
        panic!("table expected");
    };
    assert_eq!(data[1][1], "x");

    let mut rect = Element::new("r", ElementKind::Rect);
    assert!(!rect.set_cell(0, 0, "z"));
}

#[test]
fn upsert_replaces_in_place() {
    let mut snapshot = vec![Element::new("a", ElementKind::Rect), Element::new("b", ElementKind::Circle)];
    let mut moved = Element::new("a", ElementKind::Rect);
    moved.x = 42.0;

    upsert(&mut snapshot, moved.clone());
    upsert(&mut snapshot, Element::new("c", ElementKind::Line));

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0], moved);
    assert_eq!(find(&snapshot, "c").map(|el| &el.kind), Some(&ElementKind::Line));
}

#[test]
fn remove_missing_id_is_noop() {
    let mut snapshot = vec![Element::new("a", ElementKind::Rect)];
    assert!(!remove(&mut snapshot, "zzz"));
    assert!(remove(&mut snapshot, "a"));
    assert!(!remove(&mut snapshot, "a"));
    assert!(snapshot.is_empty());
}
