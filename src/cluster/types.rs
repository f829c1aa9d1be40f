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

//! Core types of the cluster controller

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::broadcast::BroadcastReport;
use crate::control::Command;
use crate::presentation::{format_prompt, ControlSurface, Presenter};
use crate::registry::{ClusterId, Registry};
use crate::session::SessionInfo;

/// Label shown in front of the control prompt.
pub const PROMPT_LABEL: &str = "cssh";

/// What a control line turned into.
///
/// Nothing here is shown to the user; it exists so callers and tests can
/// tell outcomes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A recognized command ran
    Command(Command),
    /// Command-shaped line with an unknown keyword
    Ignored(String),
    /// A data line was fanned out
    Broadcast(BroadcastReport),
}

/// Outcome of closing a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Sessions a terminate was requested for, dead ones included
    pub attempted: usize,
    /// Terminate requests the transport refused
    pub failed: usize,
    /// Set when an earlier close already did the work
    pub already_closed: bool,
}

pub(super) struct ControllerInner {
    pub(super) id: ClusterId,
    pub(super) destination: String,
    pub(super) registry: Mutex<Registry>,
    pub(super) control: Arc<dyn ControlSurface>,
    pub(super) presenter: Arc<dyn Presenter>,
    pub(super) shutdown: CancellationToken,
    pub(super) closed: AtomicBool,
}

/// Handle to one open cluster.
///
/// Cheap to clone; all clones drive the same registry and control surface.
#[derive(Clone)]
pub struct ClusterController {
    pub(super) inner: Arc<ControllerInner>,
}

impl ClusterController {
    pub(super) fn new(
        destination: impl Into<String>,
        registry: Registry,
        control: Arc<dyn ControlSurface>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                id: registry.cluster_id(),
                destination: destination.into(),
                registry: Mutex::new(registry),
                control,
                presenter,
                shutdown: CancellationToken::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> ClusterId {
        self.inner.id
    }

    /// The destination this cluster was opened for.
    pub fn destination(&self) -> &str {
        &self.inner.destination
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Resolves once the cluster has been closed by any means.
    pub async fn closed(&self) {
        self.inner.shutdown.cancelled().await;
    }

    /// Snapshot of the registry in order, dead sessions included.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.inner.registry.lock().await.listing()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    pub async fn live_count(&self) -> usize {
        self.inner.registry.lock().await.live_count()
    }

    /// Ask the control surface for the next line.
    pub async fn render_prompt(&self) {
        let prompt = {
            let registry = self.inner.registry.lock().await;
            format_prompt(PROMPT_LABEL, &registry.listing())
        };
        self.inner.control.prompt(&prompt);
    }

    pub(super) fn same_as(&self, other: &ClusterController) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ClusterController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterController")
            .field("id", &self.inner.id)
            .field("destination", &self.inner.destination)
            .field("closed", &self.is_closed())
            .finish()
    }
}
