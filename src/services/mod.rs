//! External collaborators the coordinator depends on.
//!
//! ARCHITECTURE
//! ============
//! Room records live in a shared database owned by the room CRUD service.
//! The coordinator only reads descriptors, enrolls users into public rooms
//! and saves whiteboard snapshots, all through the `RoomDirectory` trait so
//! tests and database-less runs can swap in an in-memory store.

pub mod rooms;
