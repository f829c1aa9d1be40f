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

//! Configuration types.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub interactive: InteractiveConfig,

    #[serde(default)]
    pub clusters: HashMap<String, ClusterConfig>,
}

/// Settings applied to every destination unless a flag overrides them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    pub user: Option<String>,
    pub resolver: Option<ResolverKind>,
    /// Seconds
    pub resolve_timeout: Option<u64>,
    pub ssh_program: Option<String>,
    pub ssh_args: Option<Vec<String>>,
    /// Seconds between SIGTERM and kill
    pub terminate_grace: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InteractiveConfig {
    #[serde(default)]
    pub show_timestamps: bool,
    pub history_file: Option<String>,
}

/// A named host list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClusterConfig {
    pub user: Option<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

/// Name lookup back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// The system resolver (getaddrinfo)
    #[default]
    System,
    /// The host(1) utility
    Host,
}
