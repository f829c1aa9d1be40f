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

use clap::Parser;
use std::path::PathBuf;

use crate::config::ResolverKind;

#[derive(Parser, Debug)]
#[command(
    name = "cssh",
    version,
    about = "Cluster SSH - one shell per host, one control line for all of them",
    long_about = "cssh resolves a destination into one or more hosts, opens an interactive ssh session\nto each of them and broadcasts every line typed at the control prompt to all sessions.\nA host name that resolves to several addresses becomes one session per address.\n\nControl commands:\n  ,bufs   list live sessions\n  ,tile   lay out session surfaces\n  ,quit   close every session and exit",
    after_help = "EXAMPLES:\n  Every address of a name:   cssh alice@cluster.example.com\n  Explicit host list:        cssh -H \"web[1-3].example.com,db.example.com\"\n  Named cluster from config: cssh -c web\n  One host, no expansion:    cssh -1 bastion.example.com"
)]
pub struct Cli {
    #[arg(help = "Destination in [user@]host form")]
    pub destination: Option<String>,

    #[arg(
        short = 'H',
        long,
        value_delimiter = ',',
        conflicts_with_all = ["destination", "cluster"],
        help = "Comma-separated list of hosts in [user@]host form\nRanges are expanded: 'node[01-04]', 'web[1-3].example.com'"
    )]
    pub hosts: Option<Vec<String>>,

    #[arg(
        short = 'c',
        long,
        conflicts_with = "destination",
        help = "Cluster name from configuration file"
    )]
    pub cluster: Option<String>,

    #[arg(
        short = '1',
        long,
        requires = "destination",
        help = "Open DESTINATION as a single session without address expansion"
    )]
    pub single: bool,

    #[arg(short = 'l', long, help = "Default login name for hosts without user@")]
    pub user: Option<String>,

    #[arg(
        long,
        help = "Configuration file path\nConfig loading priority:\n  1. This flag's value\n  2. Current directory (./cssh.yaml)\n  3. User config (~/.config/cssh/config.yaml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Name lookup back-end")]
    pub resolver: Option<ResolverKind>,

    #[arg(long, value_name = "SECS", help = "Name lookup timeout in seconds [default: 5]")]
    pub resolve_timeout: Option<u64>,

    #[arg(long = "ssh", value_name = "PROGRAM", help = "ssh client program [default: ssh]")]
    pub ssh_program: Option<String>,

    #[arg(
        short = 'o',
        long = "ssh-option",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Extra argument for the ssh client (repeatable)"
    )]
    pub ssh_options: Vec<String>,

    #[arg(long, help = "Prefix session output with the local time")]
    pub timestamps: bool,

    #[arg(long, help = "List clusters defined in the configuration file and exit")]
    pub list_clusters: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}
