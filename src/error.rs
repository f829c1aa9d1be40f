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

//! Error types for the cluster controller.
//!
//! Errors fall into two groups:
//!
//! - Cluster-wide failures ([`ResolutionError`], wrapped by [`ClusterError`])
//!   abort `open` and leave no state behind.
//! - Per-session failures ([`SpawnError`], [`SendError`], [`TerminateError`])
//!   never cross the lifecycle manager boundary. They are absorbed into
//!   registry membership and liveness, and at most reported as informational
//!   text on the control surface.

use std::io;
use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::hostlist::HostlistError;

/// Failure to turn a destination into endpoints.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The external lookup mechanism could not be invoked at all
    #[error("name resolution unavailable ({mechanism}): {source}")]
    Unavailable {
        mechanism: String,
        #[source]
        source: io::Error,
    },

    /// The destination string is not a usable `[user@]host`
    #[error("invalid destination '{destination}': {reason}")]
    InvalidDestination { destination: String, reason: String },

    /// A host range expression in an explicit list could not be expanded
    #[error(transparent)]
    Hostlist(#[from] HostlistError),
}

impl ResolutionError {
    pub fn invalid(destination: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDestination {
            destination: destination.into(),
            reason: reason.into(),
        }
    }
}

/// One endpoint could not be turned into a session.
#[derive(Debug, Error)]
#[error("failed to open session to {endpoint}: {reason}")]
pub struct SpawnError {
    pub endpoint: Endpoint,
    pub reason: String,
}

impl SpawnError {
    pub fn new(endpoint: &Endpoint, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.clone(),
            reason: reason.into(),
        }
    }
}

/// Input could not be queued for a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("session input channel is closed")]
    Closed,

    #[error("transport rejected input: {0}")]
    Transport(String),
}

/// A terminate request could not be delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to terminate session: {reason}")]
pub struct TerminateError {
    pub reason: String,
}

impl TerminateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that affect the existence of a whole cluster.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
