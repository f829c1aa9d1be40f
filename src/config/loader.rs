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

//! Configuration loading and priority management.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::types::{ClusterConfig, Config, ResolverKind};
use super::utils::{expand_env_vars, expand_tilde};
use crate::resolver::DEFAULT_RESOLVE_TIMEOUT;
use crate::session::{DEFAULT_SSH_ARGS, DEFAULT_SSH_PROGRAM, DEFAULT_TERMINATE_GRACE};

const CONFIG_FILE_NAME: &str = "config.yaml";
const LOCAL_CONFIG_FILE: &str = "cssh.yaml";
pub const DEFAULT_HISTORY_FILE: &str = "~/.cssh_history";

impl Config {
    /// Load configuration from a file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", expanded_path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| format!("Failed to read configuration file at {}", expanded_path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse YAML configuration file at {}", expanded_path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid configuration")
    }

    /// Load configuration with priority order:
    /// 1. Explicit --config path
    /// 2. ./cssh.yaml
    /// 3. $XDG_CONFIG_HOME/cssh/config.yaml, or the platform config directory
    /// 4. Built-in defaults
    pub async fn load_with_priority(cli_config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config_path {
            let expanded = expand_tilde(path);
            if expanded.exists() {
                tracing::debug!("Using explicitly specified config file: {:?}", expanded);
                return Self::load(&expanded).await;
            }
            tracing::debug!(
                "Config file {:?} not found, continuing with other sources",
                expanded
            );
        }

        for candidate in Self::standard_locations() {
            if candidate.exists() {
                tracing::debug!("Found config at {:?}", candidate);
                return Self::load(&candidate).await;
            }
        }

        tracing::debug!("No config file found, using default configuration");
        Ok(Self::default())
    }

    fn standard_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
            locations.push(PathBuf::from(xdg_config_home).join("cssh").join(CONFIG_FILE_NAME));
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "cssh") {
            locations.push(proj_dirs.config_dir().join(CONFIG_FILE_NAME));
        }

        locations
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.get(name)
    }

    /// Host list entries of a named cluster, with the cluster's user applied
    /// to entries that carry none and environment variables expanded.
    pub fn cluster_entries(&self, name: &str) -> Option<Vec<String>> {
        let cluster = self.cluster(name)?;
        let entries = cluster
            .hosts
            .iter()
            .map(|host| expand_env_vars(host))
            .map(|host| match (&cluster.user, host.contains('@')) {
                (Some(user), false) => format!("{user}@{host}"),
                _ => host,
            })
            .collect();
        Some(entries)
    }

    pub fn resolver_kind(&self) -> ResolverKind {
        self.defaults.resolver.unwrap_or_default()
    }

    pub fn resolve_timeout(&self) -> Duration {
        self.defaults
            .resolve_timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RESOLVE_TIMEOUT)
    }

    pub fn terminate_grace(&self) -> Duration {
        self.defaults
            .terminate_grace
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TERMINATE_GRACE)
    }

    pub fn ssh_program(&self) -> String {
        self.defaults
            .ssh_program
            .clone()
            .unwrap_or_else(|| DEFAULT_SSH_PROGRAM.to_string())
    }

    pub fn ssh_args(&self) -> Vec<String> {
        self.defaults.ssh_args.clone().unwrap_or_else(|| {
            DEFAULT_SSH_ARGS.iter().map(|arg| arg.to_string()).collect()
        })
    }

    pub fn default_user(&self) -> Option<String> {
        self.defaults.user.as_deref().map(expand_env_vars)
    }

    pub fn history_path(&self) -> PathBuf {
        let configured = self
            .interactive
            .history_file
            .as_deref()
            .unwrap_or(DEFAULT_HISTORY_FILE);
        expand_tilde(Path::new(&expand_env_vars(configured)))
    }
}
