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

//! Name lookup back-ends.

use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::ResolutionError;

/// External name-resolution capability.
///
/// An empty result is not an error: callers fall back to the literal host.
/// Errors are reserved for a mechanism that cannot be invoked at all.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Short name used in log lines and errors.
    fn name(&self) -> &str;

    async fn lookup(&self, host: &str) -> Result<Vec<String>, ResolutionError>;
}

/// Lookup through the platform resolver (`getaddrinfo`).
#[derive(Debug, Default, Clone)]
pub struct SystemLookup;

#[async_trait]
impl Lookup for SystemLookup {
    fn name(&self) -> &str {
        "system"
    }

    async fn lookup(&self, host: &str) -> Result<Vec<String>, ResolutionError> {
        match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => Ok(addrs.map(|addr| addr.ip().to_string()).collect()),
            Err(e) => {
                // NXDOMAIN and friends surface as io errors here
                tracing::debug!("System lookup for {} returned no addresses: {}", host, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Lookup by running the `host(1)` utility and scraping its output.
#[derive(Debug, Clone)]
pub struct HostCommandLookup {
    program: String,
}

impl Default for HostCommandLookup {
    fn default() -> Self {
        Self::new("host")
    }
}

impl HostCommandLookup {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Lookup for HostCommandLookup {
    fn name(&self) -> &str {
        &self.program
    }

    async fn lookup(&self, host: &str) -> Result<Vec<String>, ResolutionError> {
        let output = Command::new(&self.program)
            .arg(host)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ResolutionError::Unavailable {
                mechanism: self.program.clone(),
                source,
            })?;

        // host(1) exits non-zero for unknown names; that is simply "no addresses"
        if !output.status.success() {
            tracing::debug!("{} {} exited with {}", self.program, host, output.status);
        }

        Ok(parse_host_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract addresses from `host(1)` output.
///
/// Only `... has address A` and `... has IPv6 address A` lines count, and only
/// when `A` parses as an IP address. Alias lines, mail exchangers, truncated
/// or otherwise garbled lines are dropped.
pub fn parse_host_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(" has address ") || line.contains(" has IPv6 address "))
        .filter_map(|line| line.split_whitespace().last())
        .filter_map(|candidate| candidate.parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
        .collect()
}
