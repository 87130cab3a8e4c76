//! Boardroom — real-time session coordination for shared whiteboard rooms.
//!
//! ARCHITECTURE
//! ============
//! Clients hold one websocket each. The websocket task (`routes::ws`) parses
//! JSON frames, performs the few lookups that need I/O (room descriptors,
//! snapshot saves), and hands everything else to the coordinator (`hub`).
//! The coordinator owns all membership state and processes one command at a
//! time, so admission, fan-out and signaling never race each other.
//!
//! The `board` module is the client-side counterpart: the element model,
//! undo history, chat log and the board mirror that applies inbound events.

pub mod board;
pub mod config;
pub mod db;
pub mod frame;
pub mod hub;
pub mod protocol;
pub mod routes;
pub mod services;
pub mod state;
