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

//! In-memory collaborators for driving a cluster without ssh, DNS or a
//! terminal.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cssh::cluster::ClusterManager;
use cssh::endpoint::Endpoint;
use cssh::error::{ResolutionError, SendError, SpawnError, TerminateError};
use cssh::history::History;
use cssh::presentation::{ControlSurface, Presenter};
use cssh::resolver::{EndpointResolver, Lookup};
use cssh::session::{
    Liveness, SessionEvent, SessionEvents, SessionHandle, SessionId, Surface, Transport,
};

/// Shared record of everything the mock transport saw.
#[derive(Default)]
pub struct TransportLog {
    /// (host, bytes) in the order sends were issued across all sessions
    pub sent: Mutex<Vec<(String, Vec<u8>)>>,
    pub terminated: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
    sessions: Mutex<HashMap<String, (SessionId, Liveness, SessionEvents)>>,
}

impl TransportLog {
    pub fn sent_to(&self, host: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, data)| String::from_utf8_lossy(data).into_owned())
            .collect()
    }

    pub fn send_order(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(host, _)| host.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Flip a session to dead without telling anyone.
    pub fn mark_dead(&self, host: &str) {
        if let Some((_, liveness, _)) = self.sessions.lock().unwrap().get(host) {
            liveness.mark_dead();
        }
    }

    /// Simulate the remote shell exiting.
    pub fn exit(&self, host: &str, code: i32) {
        if let Some((id, liveness, events)) = self.sessions.lock().unwrap().get(host) {
            liveness.mark_dead();
            let _ = events.send(SessionEvent::Exited {
                id: *id,
                code: Some(code),
            });
        }
    }

    /// Simulate remote output.
    pub fn output(&self, host: &str, text: &str) {
        if let Some((id, _, events)) = self.sessions.lock().unwrap().get(host) {
            let _ = events.send(SessionEvent::Output {
                id: *id,
                text: text.to_string(),
            });
        }
    }
}

#[derive(Default)]
pub struct MockTransport {
    refuse_spawn: HashSet<String>,
    refuse_send: HashSet<String>,
    yield_on_open: bool,
    pub log: Arc<TransportLog>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening a session to `host` fails.
    pub fn failing_spawn(mut self, host: &str) -> Self {
        self.refuse_spawn.insert(host.to_string());
        self
    }

    /// Every open yields to the scheduler once before completing, so
    /// concurrent opens interleave.
    pub fn yielding(mut self) -> Self {
        self.yield_on_open = true;
        self
    }

    /// Sessions to `host` open, but every send fails.
    pub fn failing_send(mut self, host: &str) -> Self {
        self.refuse_send.insert(host.to_string());
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &self,
        id: SessionId,
        endpoint: &Endpoint,
        events: SessionEvents,
    ) -> Result<Box<dyn SessionHandle>, SpawnError> {
        if self.yield_on_open {
            tokio::task::yield_now().await;
        }
        if self.refuse_spawn.contains(&endpoint.host) {
            return Err(SpawnError::new(endpoint, "connection refused"));
        }

        let liveness = Liveness::new();
        self.log.opened.lock().unwrap().push(endpoint.host.clone());
        self.log
            .sessions
            .lock()
            .unwrap()
            .insert(endpoint.host.clone(), (id, liveness.clone(), events));

        Ok(Box::new(MockHandle {
            host: endpoint.host.clone(),
            liveness,
            refuse_send: self.refuse_send.contains(&endpoint.host),
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockHandle {
    host: String,
    liveness: Liveness,
    refuse_send: bool,
    log: Arc<TransportLog>,
}

impl SessionHandle for MockHandle {
    fn send(&self, data: &[u8]) -> Result<(), SendError> {
        if self.refuse_send {
            return Err(SendError::Transport("broken pipe".to_string()));
        }
        self.log
            .sent
            .lock()
            .unwrap()
            .push((self.host.clone(), data.to_vec()));
        Ok(())
    }

    fn terminate(&self) -> Result<(), TerminateError> {
        self.log.terminated.lock().unwrap().push(self.host.clone());
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }
}

/// Lookup answering from a fixed table; unknown names have no addresses.
#[derive(Default)]
pub struct StaticLookup {
    table: HashMap<String, Vec<String>>,
}

impl StaticLookup {
    pub fn with(mut self, host: &str, addresses: &[&str]) -> Self {
        self.table.insert(
            host.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl Lookup for StaticLookup {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(&self, host: &str) -> Result<Vec<String>, ResolutionError> {
        Ok(self.table.get(host).cloned().unwrap_or_default())
    }
}

/// Lookup whose mechanism cannot be invoked.
pub struct UnavailableLookup;

#[async_trait]
impl Lookup for UnavailableLookup {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn lookup(&self, _host: &str) -> Result<Vec<String>, ResolutionError> {
        Err(ResolutionError::Unavailable {
            mechanism: "unavailable".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
        })
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub displayed: Mutex<Vec<Surface>>,
    pub outputs: Mutex<Vec<(String, String)>>,
    pub relayouts: Mutex<Vec<(Vec<Surface>, String)>>,
    pub closed_all: AtomicUsize,
}

impl RecordingPresenter {
    pub fn displayed_titles(&self) -> Vec<String> {
        self.displayed
            .lock()
            .unwrap()
            .iter()
            .map(|surface| surface.title.clone())
            .collect()
    }

    pub fn close_all_count(&self) -> usize {
        self.closed_all.load(Ordering::SeqCst)
    }
}

impl Presenter for RecordingPresenter {
    fn display(&self, surface: &Surface) {
        self.displayed.lock().unwrap().push(surface.clone());
    }

    fn output(&self, surface: &Surface, text: &str) {
        self.outputs
            .lock()
            .unwrap()
            .push((surface.title.clone(), text.to_string()));
    }

    fn relayout(&self, surfaces: &[Surface], control: &str) {
        self.relayouts
            .lock()
            .unwrap()
            .push((surfaces.to_vec(), control.to_string()));
    }

    fn close_all_surfaces(&self) {
        self.closed_all.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct RecordingControl {
    title: String,
    pub prints: Mutex<Vec<String>>,
    /// Every prompt request, including ones after close
    pub prompts: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl RecordingControl {
    pub fn new(title: &str) -> Arc<Self> {
        Arc::new(Self {
            title: title.to_string(),
            prints: Mutex::default(),
            prompts: Mutex::default(),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn prints(&self) -> Vec<String> {
        self.prints.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl ControlSurface for RecordingControl {
    fn title(&self) -> &str {
        &self.title
    }

    fn print(&self, text: &str) {
        self.prints.lock().unwrap().push(text.to_string());
    }

    fn prompt(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a test needs to open clusters and inspect the results.
pub struct Harness {
    pub manager: ClusterManager,
    pub log: Arc<TransportLog>,
    pub presenter: Arc<RecordingPresenter>,
    pub history: Arc<History>,
}

impl Harness {
    pub fn new(lookup: impl Lookup + 'static, transport: MockTransport) -> Self {
        let log = Arc::clone(&transport.log);
        let presenter = Arc::new(RecordingPresenter::default());
        let history = Arc::new(History::new());
        let resolver =
            EndpointResolver::new(Arc::new(lookup)).with_default_user(Some("alice".to_string()));
        let manager = ClusterManager::new(resolver, Arc::new(transport), presenter.clone())
            .with_history(Arc::clone(&history));

        Self {
            manager,
            log,
            presenter,
            history,
        }
    }
}

/// Poll `condition` until it holds or a second has passed.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
