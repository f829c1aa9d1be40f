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

//! Application initialization and configuration loading

use anyhow::{Context, Result};
use cssh::{
    cli::Cli,
    cluster::{ClusterManager, Target},
    config::{Config, ResolverKind},
    presentation::TerminalPresenter,
    resolver::{EndpointResolver, HostCommandLookup, Lookup, SystemLookup},
    session::SshTransport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Application context after initialization
pub struct AppContext {
    pub target: Target,
    pub manager: ClusterManager,
    pub transport: Arc<SshTransport>,
    pub history_path: PathBuf,
}

pub async fn initialize_app(cli: &Cli) -> Result<AppContext> {
    let config = Config::load_with_priority(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let target = determine_target(cli, &config)?;
    tracing::debug!("Target: {:?}", target);

    let resolver = build_resolver(cli, &config);
    let transport = Arc::new(build_transport(cli, &config));
    let presenter = Arc::new(TerminalPresenter::new(
        cli.timestamps || config.interactive.show_timestamps,
    ));
    let manager = ClusterManager::new(resolver, transport.clone(), presenter);
    let history_path = config.history_path();

    Ok(AppContext {
        target,
        manager,
        transport,
        history_path,
    })
}

/// Decide what to open from `-H`, `-c` or the positional destination.
pub fn determine_target(cli: &Cli, config: &Config) -> Result<Target> {
    if let Some(hosts) = &cli.hosts {
        return Ok(Target::List(hosts.clone()));
    }

    if let Some(name) = &cli.cluster {
        let entries = config
            .cluster_entries(name)
            .with_context(|| format!("Cluster '{name}' not found in configuration"))?;
        if entries.is_empty() {
            anyhow::bail!("Cluster '{name}' has no hosts");
        }
        return Ok(Target::List(entries));
    }

    match &cli.destination {
        Some(destination) if cli.single => Ok(Target::Single(destination.clone())),
        Some(destination) => Ok(Target::Cluster(destination.clone())),
        None => anyhow::bail!("No destination given. Try 'cssh --help' for usage"),
    }
}

pub fn build_resolver(cli: &Cli, config: &Config) -> EndpointResolver {
    let lookup: Arc<dyn Lookup> = match cli.resolver.unwrap_or_else(|| config.resolver_kind()) {
        ResolverKind::System => Arc::new(SystemLookup),
        ResolverKind::Host => Arc::new(HostCommandLookup::default()),
    };
    let timeout = cli
        .resolve_timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.resolve_timeout());

    EndpointResolver::new(lookup)
        .with_timeout(timeout)
        .with_default_user(cli.user.clone().or_else(|| config.default_user()))
}

pub fn build_transport(cli: &Cli, config: &Config) -> SshTransport {
    let program = cli
        .ssh_program
        .clone()
        .unwrap_or_else(|| config.ssh_program());
    let mut args = config.ssh_args();
    args.extend(cli.ssh_options.iter().cloned());

    SshTransport::new(program, args).with_terminate_grace(config.terminate_grace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config() -> Config {
        Config::from_yaml(
            "clusters:\n  web:\n    user: deploy\n    hosts: [\"web[1-2]\"]\n  empty:\n    hosts: []\n",
        )
        .unwrap()
    }

    #[test]
    fn test_determine_target() {
        let config = config();
        let target = |args: &[&str]| determine_target(&Cli::try_parse_from(args).unwrap(), &config);

        assert_eq!(
            target(&["cssh", "alice@cluster"]).unwrap(),
            Target::Cluster("alice@cluster".to_string())
        );
        assert_eq!(
            target(&["cssh", "-1", "bastion"]).unwrap(),
            Target::Single("bastion".to_string())
        );
        assert_eq!(
            target(&["cssh", "-H", "a,b"]).unwrap(),
            Target::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            target(&["cssh", "-c", "web"]).unwrap(),
            Target::List(vec!["deploy@web[1-2]".to_string()])
        );
        assert!(target(&["cssh", "-c", "missing"]).is_err());
        assert!(target(&["cssh", "-c", "empty"]).is_err());
        assert!(target(&["cssh"]).is_err());
    }
}
