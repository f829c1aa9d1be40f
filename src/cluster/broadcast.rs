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

//! Data line fan-out

use crate::registry::Registry;
use crate::session::SessionId;

/// Line terminator appended to every broadcast line.
pub const LINE_TERMINATOR: &str = "\n";

/// Per-line delivery tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Live sessions the line was offered to
    pub attempted: usize,
    pub delivered: usize,
    /// Dead sessions passed over
    pub skipped: usize,
    /// Live sessions whose transport refused the line
    pub failed: Vec<SessionId>,
}

/// Send `line` plus a terminator to every live session, in registry order.
///
/// A failing session never stops delivery to the ones after it.
pub fn broadcast(registry: &Registry, line: &str) -> BroadcastReport {
    let framed = format!("{line}{LINE_TERMINATOR}");
    let mut report = BroadcastReport::default();

    for session in registry.iter() {
        if !session.is_alive() {
            report.skipped += 1;
            continue;
        }

        report.attempted += 1;
        match session.send(framed.as_bytes()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::debug!("Failed to send to {}: {e}", session.endpoint());
                report.failed.push(session.id());
            }
        }
    }

    tracing::trace!(
        "Broadcast {} byte(s): {}/{} delivered, {} skipped",
        framed.len(),
        report.delivered,
        report.attempted,
        report.skipped
    );
    report
}
