//! Hub — the coordinator that owns all live room state.
//!
//! DESIGN
//! ======
//! One task owns the [`RoomRegistry`] and the table of connected clients.
//! Websocket loops talk to it through a [`HubHandle`], which queues
//! [`Command`]s on a bounded channel. Commands are processed one at a time
//! and each runs to completion before the next is read, so membership
//! changes are atomic without any locks.
//!
//! Handlers never send directly. They mutate the registry and return a list
//! of [`Delivery`] values, which the hub then fans out to client channels.
//!
//! SYSTEM CONTEXT
//! ==============
//! Directory lookups happen in the websocket task before a `Join` command is
//! queued; the hub itself never awaits I/O.
//!
//! ERROR HANDLING
//! ==============
//! Outbound sends are best effort: a full or closed client channel skips that
//! client. A malformed frame is logged and dropped without touching state.

pub mod admission;
pub mod registry;
pub mod router;
pub mod signaling;

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::frame::{ErrorCode, Frame, FrameError};
use crate::protocol::{ApproveJoin, DenyJoin, ReturningSignal, RoomId, RoomRef, SendingSignal, SocketId, UserIdentity, event};
use crate::services::rooms::RoomDescriptor;
use admission::{AdmissionError, Decision};
use registry::{Location, RoomRegistry};

// =============================================================================
// DELIVERY
// =============================================================================

/// A frame addressed to a room or to one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Every active member of `room_id` except `exclude`.
    Room { room_id: RoomId, frame: Frame, exclude: Option<SocketId> },
    /// One connection, member or not.
    Direct { target: SocketId, frame: Frame },
}

impl Delivery {
    pub fn room(room_id: impl Into<RoomId>, frame: Frame, exclude: Option<SocketId>) -> Self {
        Self::Room { room_id: room_id.into(), frame, exclude }
    }

    #[must_use]
    pub fn direct(target: SocketId, frame: Frame) -> Self {
        Self::Direct { target, frame }
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        match self {
            Self::Room { frame, .. } | Self::Direct { frame, .. } => frame,
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

pub enum Command {
    Connect {
        socket_id: SocketId,
        tx: mpsc::Sender<Frame>,
    },
    Disconnect {
        socket_id: SocketId,
    },
    /// A `join_room` whose directory lookup has already completed.
    Join {
        socket_id: SocketId,
        user: UserIdentity,
        room: Result<RoomDescriptor, AdmissionError>,
        reply: oneshot::Sender<Decision>,
    },
    Event {
        socket_id: SocketId,
        frame: Frame,
    },
    IsMember {
        socket_id: SocketId,
        room_id: RoomId,
        reply: oneshot::Sender<bool>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("hub is no longer running")]
pub struct HubClosed;

impl ErrorCode for HubClosed {
    fn error_code(&self) -> &'static str {
        "E_HUB_CLOSED"
    }
}

// =============================================================================
// HUB
// =============================================================================

#[derive(Default)]
pub struct Hub {
    registry: RoomRegistry,
    clients: HashMap<SocketId, mpsc::Sender<Frame>>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Process one command to completion.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { socket_id, tx } => {
                self.clients.insert(socket_id, tx);
            }
            Command::Disconnect { socket_id } => {
                let deliveries = admission::depart(&mut self.registry, socket_id);
                self.deliver(deliveries);
                self.clients.remove(&socket_id);
            }
            Command::Join { socket_id, user, room, reply } => {
                let (decision, deliveries) = admission::request(&mut self.registry, socket_id, user, room);
                self.deliver(deliveries);
                let _ = reply.send(decision);
            }
            Command::Event { socket_id, frame } => match self.handle_event(socket_id, &frame) {
                Ok(deliveries) => self.deliver(deliveries),
                Err(e) => {
                    warn!(%socket_id, error = %e, error_code = e.error_code(), "malformed frame dropped");
                }
            },
            Command::IsMember { socket_id, room_id, reply } => {
                let _ = reply.send(self.registry.is_member(&room_id, socket_id));
            }
        }
    }

    fn handle_event(&mut self, socket_id: SocketId, frame: &Frame) -> Result<Vec<Delivery>, FrameError> {
        let registry = &mut self.registry;
        let deliveries = match frame.event.as_str() {
            event::LEAVE_ROOM => {
                let leave: RoomRef = frame.payload()?;
                // Members leave; waiting connections withdraw their request.
                let placed = match registry.location(socket_id) {
                    Some(Location::Member(room_id) | Location::Waiting(room_id)) => *room_id == leave.room_id,
                    None => false,
                };
                if placed {
                    admission::depart(registry, socket_id)
                } else {
                    debug!(%socket_id, room_id = %leave.room_id, "leave_room for other room ignored");
                    Vec::new()
                }
            }
            event::APPROVE_JOIN => {
                let approve: ApproveJoin = frame.payload()?;
                admission::approve(registry, socket_id, approve.socket_id, &approve.room_id)
            }
            event::DENY_JOIN => {
                let deny: DenyJoin = frame.payload()?;
                admission::deny(registry, socket_id, deny.socket_id, deny.room_id.as_deref())
            }
            event::JOIN_VIDEO => {
                let room_id: RoomId = frame.payload()?;
                signaling::join_video(registry, socket_id, &room_id)
            }
            event::LEAVE_VIDEO => {
                let room_id: RoomId = frame.payload()?;
                signaling::leave_video(registry, socket_id, &room_id)
            }
            event::SENDING_SIGNAL => signaling::sending_signal(registry, socket_id, frame.payload::<SendingSignal>()?),
            event::RETURNING_SIGNAL => {
                signaling::returning_signal(registry, socket_id, frame.payload::<ReturningSignal>()?)
            }
            _ => router::route(registry, socket_id, frame)?,
        };
        Ok(deliveries)
    }

    fn deliver(&self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            match delivery {
                Delivery::Room { room_id, frame, exclude } => {
                    let Some(room) = self.registry.room(&room_id) else {
                        continue;
                    };
                    for participant in room.participants() {
                        if Some(participant.socket_id) == exclude {
                            continue;
                        }
                        self.send(participant.socket_id, &frame);
                    }
                }
                Delivery::Direct { target, frame } => self.send(target, &frame),
            }
        }
    }

    fn send(&self, target: SocketId, frame: &Frame) {
        let Some(tx) = self.clients.get(&target) else {
            debug!(%target, event = %frame.event, "no client for delivery");
            return;
        };
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        info!(rooms = self.registry.room_count(), "hub stopped");
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable sender side of the hub.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Command>,
}

impl HubHandle {
    /// Register a connection's outbound channel.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the hub task has stopped.
    pub async fn connect(&self, socket_id: SocketId, tx: mpsc::Sender<Frame>) -> Result<(), HubClosed> {
        self.send(Command::Connect { socket_id, tx }).await
    }

    /// Tear down a connection: leave its room or waiting area, drop its channel.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the hub task has stopped.
    pub async fn disconnect(&self, socket_id: SocketId) -> Result<(), HubClosed> {
        self.send(Command::Disconnect { socket_id }).await
    }

    /// Submit a join attempt and wait for its decision.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the hub task has stopped.
    pub async fn join(
        &self,
        socket_id: SocketId,
        user: UserIdentity,
        room: Result<RoomDescriptor, AdmissionError>,
    ) -> Result<Decision, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Join { socket_id, user, room, reply }).await?;
        rx.await.map_err(|_| HubClosed)
    }

    /// Queue any other inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the hub task has stopped.
    pub async fn dispatch(&self, socket_id: SocketId, frame: Frame) -> Result<(), HubClosed> {
        self.send(Command::Event { socket_id, frame }).await
    }

    /// Whether `socket_id` is currently an active member of `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the hub task has stopped.
    pub async fn is_member(&self, socket_id: SocketId, room_id: impl Into<RoomId>) -> Result<bool, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::IsMember { socket_id, room_id: room_id.into(), reply }).await?;
        rx.await.map_err(|_| HubClosed)
    }

    async fn send(&self, command: Command) -> Result<(), HubClosed> {
        self.tx.send(command).await.map_err(|_| HubClosed)
    }
}

/// Start the hub task. Commands beyond `queue` apply backpressure to senders.
#[must_use]
pub fn spawn(queue: usize) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue.max(1));
    let task = tokio::spawn(Hub::new().run(rx));
    (HubHandle { tx }, task)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
