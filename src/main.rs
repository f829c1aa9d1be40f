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

use anyhow::Result;
use clap::Parser;

use cssh::{cli::Cli, config::Config, utils::init_logging};

mod app;

use app::{dispatcher::run_cluster, initialization::initialize_app, list::list_clusters};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.list_clusters {
        let config = Config::load_with_priority(cli.config.as_deref()).await?;
        list_clusters(&config);
        return Ok(());
    }

    let ctx = initialize_app(&cli).await?;
    run_cluster(ctx).await
}
