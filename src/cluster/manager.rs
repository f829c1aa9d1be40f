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

//! Cluster lifecycle: resolve, spawn, register

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::mpsc;

use super::events::spawn_event_pump;
use super::types::{ClusterController, TeardownReport};
use crate::error::{ClusterError, SpawnError};
use crate::history::History;
use crate::presentation::{ControlSurface, Presenter};
use crate::registry::{ClusterId, Registry};
use crate::resolver::{EndpointResolver, ResolveMode};
use crate::session::{Session, SessionId, Transport};

/// What to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One session to `[user@]host`, no lookup
    Single(String),
    /// One session per address `[user@]host` resolves to
    Cluster(String),
    /// One session per entry; entries may use host ranges
    List(Vec<String>),
}

impl Target {
    /// Text recorded in history and shown to the user.
    pub fn destination(&self) -> String {
        match self {
            Target::Single(destination) | Target::Cluster(destination) => destination.clone(),
            Target::List(entries) => entries.join(","),
        }
    }

    fn key(&self) -> String {
        match self {
            Target::Single(destination) => format!("single:{destination}"),
            Target::Cluster(destination) => format!("cluster:{destination}"),
            Target::List(entries) => format!("list:{}", entries.join(",")),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination())
    }
}

/// Opens clusters and keeps one controller per destination.
pub struct ClusterManager {
    resolver: EndpointResolver,
    transport: Arc<dyn Transport>,
    presenter: Arc<dyn Presenter>,
    history: Arc<History>,
    clusters: Mutex<HashMap<String, ClusterController>>,
}

impl ClusterManager {
    pub fn new(
        resolver: EndpointResolver,
        transport: Arc<dyn Transport>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            resolver,
            transport,
            presenter,
            history: History::global(),
            clusters: Mutex::new(HashMap::new()),
        }
    }

    /// Record destinations in `history` instead of the process-wide one.
    pub fn with_history(mut self, history: Arc<History>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// The open controller for `target`, if any.
    pub fn find(&self, target: &Target) -> Option<ClusterController> {
        self.clusters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&target.key())
            .filter(|controller| !controller.is_closed())
            .cloned()
    }

    /// Open `target`, or return the controller already open for it.
    ///
    /// Resolution failures abort with nothing left behind. Endpoints that
    /// fail to spawn are reported once on `control` and left out of the
    /// registry; if all of them fail the controller is returned empty.
    pub async fn open(
        &self,
        target: Target,
        control: Arc<dyn ControlSurface>,
    ) -> Result<ClusterController, ClusterError> {
        let destination = target.destination();
        self.history.append(destination.clone());

        if let Some(existing) = self.find(&target) {
            tracing::debug!("Reusing open cluster for {destination}");
            return Ok(existing);
        }

        let endpoints = match &target {
            Target::Single(destination) => {
                self.resolver.resolve(destination, ResolveMode::Single).await?
            }
            Target::Cluster(destination) => {
                self.resolver.resolve(destination, ResolveMode::Cluster).await?
            }
            Target::List(entries) => self.resolver.resolve_list(entries)?,
        };
        tracing::info!("Opening {} session(s) for {destination}", endpoints.len());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let spawns = endpoints.into_iter().enumerate().map(|(i, endpoint)| {
            let transport = Arc::clone(&self.transport);
            let events = events_tx.clone();
            async move { Session::spawn(transport.as_ref(), SessionId(i + 1), endpoint, events).await }
        });
        let results = join_all(spawns).await;
        drop(events_tx);

        let mut registry = Registry::new(ClusterId::new());
        let mut failures: Vec<SpawnError> = Vec::new();
        for result in results {
            match result {
                Ok(session) => registry.push(session),
                Err(e) => {
                    tracing::warn!("{e}");
                    failures.push(e);
                }
            }
        }
        let surfaces = registry.surfaces();

        let controller = ClusterController::new(
            destination.clone(),
            registry,
            Arc::clone(&control),
            Arc::clone(&self.presenter),
        );

        // Another open for the same destination may have finished first
        let key = target.key();
        let earlier = {
            let mut clusters = self.clusters.lock().unwrap_or_else(PoisonError::into_inner);
            let earlier = clusters
                .get(&key)
                .filter(|existing| !existing.is_closed())
                .cloned();
            if earlier.is_none() {
                clusters.insert(key, controller.clone());
            }
            earlier
        };
        if let Some(existing) = earlier {
            tracing::debug!("Lost open race for {destination}, keeping the earlier cluster");
            controller.discard().await;
            return Ok(existing);
        }

        for surface in &surfaces {
            self.presenter.display(surface);
        }
        if !failures.is_empty() {
            control.print(&render_failures(&failures));
        }
        controller.list_sessions().await;
        controller.render_prompt().await;

        spawn_event_pump(controller.clone(), surfaces, events_rx);
        Ok(controller)
    }

    /// Close `controller` and forget it. Safe to call more than once.
    pub async fn close(&self, controller: &ClusterController) -> TeardownReport {
        {
            let mut clusters = self.clusters.lock().unwrap_or_else(PoisonError::into_inner);
            clusters.retain(|_, open| !open.same_as(controller));
        }
        controller.close().await
    }

    /// Close every open cluster.
    pub async fn close_all(&self) {
        let controllers: Vec<ClusterController> = self
            .clusters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, controller)| controller)
            .collect();
        for controller in controllers {
            controller.close().await;
        }
    }
}

fn render_failures(failures: &[SpawnError]) -> String {
    let mut text = format!("Failed to open {} session(s):", failures.len());
    for failure in failures {
        text.push_str(&format!("\n  {}: {}", failure.endpoint, failure.reason));
    }
    text
}
