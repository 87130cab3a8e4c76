//! Client-side board model.
//!
//! ARCHITECTURE
//! ============
//! The server relays elements and chat messages as opaque JSON. This module
//! is what a client (or a test harness standing in for one) uses to make
//! sense of them: typed elements, a linear undo history, the chat log with
//! its poll vote rule, remote cursors, and `BoardSession`, which ties them
//! together and produces outbound frames for local actions.

pub mod chat;
pub mod cursors;
pub mod element;
pub mod history;
pub mod session;

pub use element::{Element, ElementKind, Snapshot};
pub use history::History;
pub use session::BoardSession;
