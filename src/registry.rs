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

//! Ordered session registry of one cluster
//!
//! Insertion order is the order sessions are tiled, listed, broadcast to and
//! terminated in. Removing sessions never reorders the survivors.

use std::fmt;
use uuid::Uuid;

use crate::session::{Session, SessionId, SessionInfo, Surface};

/// Identifier of one cluster controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(Uuid);

impl ClusterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClusterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct Registry {
    cluster_id: ClusterId,
    sessions: Vec<Session>,
}

impl Registry {
    pub fn new(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            sessions: Vec::new(),
        }
    }

    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    pub fn push(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let index = self.sessions.iter().position(|session| session.id() == id)?;
        Some(self.sessions.remove(index))
    }

    /// Drain all sessions, in order.
    pub fn clear(&mut self) -> Vec<Session> {
        std::mem::take(&mut self.sessions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.sessions.iter().filter(|session| session.is_alive()).count()
    }

    pub fn listing(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(Session::info).collect()
    }

    /// Listing of the sessions still alive. Dead ones stay registered until
    /// their exit is handled or the cluster closes.
    pub fn live_listing(&self) -> Vec<SessionInfo> {
        self.sessions
            .iter()
            .filter(|session| session.is_alive())
            .map(Session::info)
            .collect()
    }

    pub fn surfaces(&self) -> Vec<Surface> {
        self.sessions
            .iter()
            .map(|session| session.surface().clone())
            .collect()
    }
}
