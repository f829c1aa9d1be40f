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

use owo_colors::OwoColorize;

use cssh::config::Config;

pub fn list_clusters(config: &Config) {
    if config.clusters.is_empty() {
        println!("{}", "No clusters configured".dimmed());
        return;
    }

    let mut names: Vec<&String> = config.clusters.keys().collect();
    names.sort();

    println!("\n{} {}\n", "▶".cyan(), "Available clusters".bold());
    for name in names {
        let Some(entries) = config.cluster_entries(name) else {
            continue;
        };
        println!(
            "  {} {} ({} {})",
            "●".blue(),
            name.bold(),
            entries.len().to_string().yellow(),
            if entries.len() == 1 { "entry" } else { "entries" }
        );
        for entry in &entries {
            println!("    {} {}", "•".dimmed(), entry.dimmed());
        }
    }
    println!();
}
