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

//! Control prompt formatting

use crate::session::SessionInfo;

/// Above this many sessions the prompt switches to a compact count.
pub const MAX_INDIVIDUAL_DISPLAY: usize = 10;

/// Build the control prompt from the current session listing.
///
/// Small clusters get one marker per session (`●` live, `○` dead) in
/// registry order; larger ones get `live/total`.
pub fn format_prompt(label: &str, sessions: &[SessionInfo]) -> String {
    let total = sessions.len();
    let live = sessions.iter().filter(|s| s.alive).count();

    if total == 0 {
        return format!("[-] {label}> ");
    }

    if total > MAX_INDIVIDUAL_DISPLAY {
        if live == total {
            return format!("[All {live}/{total}] {label}> ");
        }
        return format!("[{live}/{total}] {label}> ");
    }

    let markers = sessions
        .iter()
        .map(|s| if s.alive { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join("");
    format!("[{markers}] {label}> ")
}
