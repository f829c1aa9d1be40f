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

//! Cluster controller
//!
//! A cluster is one destination opened as a group of remote shells that are
//! driven from a single control line.
//!
//! ## Layout
//!
//! - `types`: the controller handle and the status values it returns
//! - `manager`: [`ClusterManager`], which resolves, spawns and registers
//!   sessions and hands out one controller per destination
//! - `commands`: control line dispatch (`,tile`, `,quit`, `,bufs`, data)
//! - `broadcast`: best-effort fan-out of a data line to live sessions
//! - `teardown`: idempotent close of a whole cluster
//! - `events`: the per-controller task that consumes session events
//!
//! Per-session failures stop at this module. Spawn failures become a single
//! notice on the control surface; send and terminate failures are only
//! counted in the returned reports.

mod broadcast;
mod commands;
mod events;
mod manager;
mod teardown;
mod types;

pub use broadcast::{broadcast, BroadcastReport};
pub use commands::render_listing;
pub use manager::{ClusterManager, Target};
pub use types::{ClusterController, Dispatch, TeardownReport, PROMPT_LABEL};
