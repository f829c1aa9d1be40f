// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Remote shell sessions
//!
//! A [`Session`] owns exactly one transport handle for one endpoint. The
//! transport itself sits behind the [`Transport`] / [`SessionHandle`] traits;
//! [`SshTransport`] drives the system OpenSSH client.
//!
//! Liveness is monotonic: a handle reports `is_alive() == true` until the
//! transport observes the remote shell going away, and never again after.
//! Reconnecting means opening a new session.

mod output;
mod ssh;

pub use output::{OutputDecoder, MAX_PENDING_LINE};
pub use ssh::{SshTransport, DEFAULT_SSH_ARGS, DEFAULT_SSH_PROGRAM, DEFAULT_TERMINATE_GRACE};

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::endpoint::Endpoint;
use crate::error::{SendError, SpawnError, TerminateError};

/// Identifier of a session within its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub usize);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display area assigned to one session. The presentation layer decides
/// what it actually is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub session: SessionId,
    pub endpoint: Endpoint,
    pub title: String,
}

impl Surface {
    pub fn for_endpoint(session: SessionId, endpoint: &Endpoint) -> Self {
        Self {
            session,
            endpoint: endpoint.clone(),
            title: endpoint.to_string(),
        }
    }
}

/// Point-in-time view of a session, used for listings and prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub endpoint: Endpoint,
    pub title: String,
    pub alive: bool,
}

/// Events reported by transports on the cluster's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Remote output for the session's surface
    Output { id: SessionId, text: String },
    /// The remote shell is gone; sent after the handle reports not alive
    Exited { id: SessionId, code: Option<i32> },
}

pub type SessionEvents = mpsc::UnboundedSender<SessionEvent>;

/// Shared liveness flag that can only go from alive to dead.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    dead: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        !self.dead.load(Ordering::Acquire)
    }

    pub fn mark_dead(&self) {
        self.dead.store(true, Ordering::Release);
    }
}

/// Handle to one open remote shell.
///
/// `send` queues input and must not block. `terminate` requests shutdown and
/// returns without waiting for the remote side.
pub trait SessionHandle: Send + Sync {
    fn send(&self, data: &[u8]) -> Result<(), SendError>;
    fn terminate(&self) -> Result<(), TerminateError>;
    fn is_alive(&self) -> bool;
}

/// Capability to open remote shells.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        id: SessionId,
        endpoint: &Endpoint,
        events: SessionEvents,
    ) -> Result<Box<dyn SessionHandle>, SpawnError>;
}

/// One remote shell owned by a cluster registry.
pub struct Session {
    id: SessionId,
    endpoint: Endpoint,
    surface: Surface,
    handle: Box<dyn SessionHandle>,
}

impl Session {
    pub fn new(id: SessionId, endpoint: Endpoint, handle: Box<dyn SessionHandle>) -> Self {
        let surface = Surface::for_endpoint(id, &endpoint);
        Self {
            id,
            endpoint,
            surface,
            handle,
        }
    }

    /// Open a session through `transport`.
    pub async fn spawn(
        transport: &dyn Transport,
        id: SessionId,
        endpoint: Endpoint,
        events: SessionEvents,
    ) -> Result<Self, SpawnError> {
        let handle = transport.open(id, &endpoint, events).await?;
        tracing::debug!("Opened session {} to {}", id, endpoint);
        Ok(Self::new(id, endpoint, handle))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    /// Queue input for the remote shell. A dead session swallows the input.
    pub fn send(&self, data: &[u8]) -> Result<(), SendError> {
        if !self.is_alive() {
            tracing::trace!("Dropping {} byte(s) for dead session {}", data.len(), self.id);
            return Ok(());
        }
        self.handle.send(data)
    }

    pub fn terminate(&self) -> Result<(), TerminateError> {
        self.handle.terminate()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            endpoint: self.endpoint.clone(),
            title: self.surface.title.clone(),
            alive: self.is_alive(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("alive", &self.is_alive())
            .finish()
    }
}
