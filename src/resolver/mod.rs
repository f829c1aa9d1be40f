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

//! Endpoint resolution
//!
//! Turns a destination into the ordered, duplicate-free set of endpoints a
//! cluster is built from. Three modes are supported:
//!
//! - single: `[user@]host` is one endpoint, no lookup
//! - cluster: `host` is looked up and every address becomes an endpoint;
//!   a lookup with no answer (or one that times out) falls back to the
//!   literal host
//! - list: an explicit list of `[user@]host` entries, each of which may use
//!   host range notation (see [`crate::hostlist`])

mod lookup;

pub use lookup::{parse_host_output, HostCommandLookup, Lookup, SystemLookup};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::endpoint::{split_destination, Endpoint};
use crate::error::ResolutionError;
use crate::hostlist::{expand_hostlist, too_many, MAX_HOSTS};

/// Default bound on a single name lookup.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// How a single destination string is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Exactly one endpoint, no lookup
    Single,
    /// One endpoint per address the host resolves to
    Cluster,
}

pub struct EndpointResolver {
    lookup: Arc<dyn Lookup>,
    timeout: Duration,
    default_user: Option<String>,
}

impl EndpointResolver {
    pub fn new(lookup: Arc<dyn Lookup>) -> Self {
        Self {
            lookup,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
            default_user: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// User for destinations without a `user@` prefix. When unset, the login
    /// name of the invoking user is used.
    pub fn with_default_user(mut self, user: Option<String>) -> Self {
        self.default_user = user;
        self
    }

    pub async fn resolve(
        &self,
        destination: &str,
        mode: ResolveMode,
    ) -> Result<Vec<Endpoint>, ResolutionError> {
        let base = Endpoint::parse(destination, self.default_user.as_deref())?;
        if mode == ResolveMode::Single {
            return Ok(vec![base]);
        }

        let addresses = match tokio::time::timeout(self.timeout, self.lookup.lookup(&base.host))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "{} lookup for {} timed out after {:?}, using the name as is",
                    self.lookup.name(),
                    base.host,
                    self.timeout
                );
                Vec::new()
            }
        };

        let endpoints = dedup_endpoints(
            addresses
                .into_iter()
                .map(|address| address.trim().to_string())
                .filter(|address| is_plausible_host(address))
                .map(|address| base.with_host(address)),
        );

        if endpoints.is_empty() {
            tracing::debug!("{} resolved to no addresses, treating it literally", base.host);
            return Ok(vec![base]);
        }

        tracing::info!("{} resolved to {} endpoint(s)", destination, endpoints.len());
        Ok(endpoints)
    }

    /// Resolve an explicit host list. Entries are taken literally (no lookup)
    /// after range expansion. The distinct endpoints of the whole list are
    /// capped at [`MAX_HOSTS`].
    pub fn resolve_list<S: AsRef<str>>(
        &self,
        entries: &[S],
    ) -> Result<Vec<Endpoint>, ResolutionError> {
        let joined = || {
            entries
                .iter()
                .map(|entry| entry.as_ref())
                .collect::<Vec<&str>>()
                .join(",")
        };
        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let (user, host_expr) = split_destination(entry)?;
            let user = user.or(self.default_user.as_deref());

            for host in expand_hostlist(host_expr)? {
                let destination = match user {
                    Some(user) => format!("{user}@{host}"),
                    None => host,
                };
                let endpoint = Endpoint::parse(&destination, None)?;
                if seen.insert(endpoint.clone()) {
                    endpoints.push(endpoint);
                }
            }
            if endpoints.len() > MAX_HOSTS {
                return Err(too_many(&joined(), endpoints.len()).into());
            }
        }

        if endpoints.is_empty() {
            return Err(ResolutionError::invalid(joined(), "host list is empty"));
        }

        Ok(endpoints)
    }
}

/// Drop repeated endpoints, keeping the first occurrence of each.
pub fn dedup_endpoints(endpoints: impl IntoIterator<Item = Endpoint>) -> Vec<Endpoint> {
    let mut seen = HashSet::new();
    endpoints
        .into_iter()
        .filter(|endpoint| seen.insert(endpoint.clone()))
        .collect()
}

fn is_plausible_host(address: &str) -> bool {
    !address.is_empty()
        && !address.starts_with('-')
        && !address.chars().any(|c| c.is_whitespace() || c.is_control())
}
