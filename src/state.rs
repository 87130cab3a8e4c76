//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! carries a handle to the hub (which owns all live room state), the room
//! directory used for admission lookups and snapshot saves, and the loaded
//! configuration. Everything inside is cheap to clone.

use std::sync::Arc;

use crate::config::Config;
use crate::hub::HubHandle;
use crate::services::rooms::RoomDirectory;

#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub rooms: Arc<dyn RoomDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(hub: HubHandle, rooms: Arc<dyn RoomDirectory>, config: Config) -> Self {
        Self { hub, rooms, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
