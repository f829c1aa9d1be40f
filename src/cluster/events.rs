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

//! Session event pump

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::ClusterController;
use crate::session::{SessionEvent, SessionId, Surface};

/// Text printed on the control surface when the last session goes away.
pub const ALL_EXITED_NOTICE: &str = "All sessions exited";

/// Forward session events until the cluster closes or every transport is gone.
///
/// Surfaces are captured up front so output that arrives after its session
/// was removed still reaches the presenter.
pub(super) fn spawn_event_pump(
    controller: ClusterController,
    surfaces: Vec<Surface>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) -> JoinHandle<()> {
    let surfaces: HashMap<SessionId, Surface> = surfaces
        .into_iter()
        .map(|surface| (surface.session, surface))
        .collect();
    let shutdown = controller.inner.shutdown.clone();

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                SessionEvent::Output { id, text } => match surfaces.get(&id) {
                    Some(surface) => controller.inner.presenter.output(surface, &text),
                    None => tracing::trace!("Dropping output for unknown session {id}"),
                },
                SessionEvent::Exited { id, code } => {
                    if controller.session_exited(id, code).await {
                        controller.inner.control.print(ALL_EXITED_NOTICE);
                        controller.close().await;
                        break;
                    }
                }
            }
        }
        tracing::debug!("Event pump for {} stopped", controller.destination());
    })
}

impl ClusterController {
    /// Drop an exited session. Returns true when that emptied a cluster that
    /// is still open.
    async fn session_exited(&self, id: SessionId, code: Option<i32>) -> bool {
        let mut registry = self.inner.registry.lock().await;
        if let Some(session) = registry.remove(id) {
            match code {
                Some(code) => tracing::info!("Session to {} exited with status {code}", session.endpoint()),
                None => tracing::info!("Session to {} was terminated", session.endpoint()),
            }
        }
        registry.is_empty() && !self.is_closed()
    }
}
