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

//! Control line dispatch

use super::broadcast::broadcast;
use super::types::{ClusterController, Dispatch};
use crate::control::{classify, Command, Input};
use crate::session::SessionInfo;

impl ClusterController {
    /// Handle one line from the control surface.
    ///
    /// Whatever the line turns out to be, exactly one prompt is rendered
    /// afterwards.
    pub async fn handle_line(&self, line: &str) -> Dispatch {
        let dispatch = match classify(line) {
            Input::Command(Command::Quit) => {
                self.close().await;
                Dispatch::Command(Command::Quit)
            }
            Input::Command(Command::Bufs) => {
                self.list_sessions().await;
                Dispatch::Command(Command::Bufs)
            }
            Input::Command(Command::Tile) => {
                self.tile().await;
                Dispatch::Command(Command::Tile)
            }
            Input::Command(Command::Unrecognized(name)) => {
                tracing::debug!("Ignoring unrecognized command ',{name}'");
                Dispatch::Ignored(name)
            }
            Input::Data(data) => {
                let registry = self.inner.registry.lock().await;
                Dispatch::Broadcast(broadcast(&registry, &data))
            }
        };

        self.render_prompt().await;
        dispatch
    }

    /// Print the live sessions in order. The registry is not modified.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let listing = self.inner.registry.lock().await.live_listing();

        self.inner.control.print(&render_listing(&listing));
        listing
    }

    /// Ask the presenter to tile every surface next to the control surface.
    pub async fn tile(&self) {
        let surfaces = self.inner.registry.lock().await.surfaces();
        self.inner
            .presenter
            .relayout(&surfaces, self.inner.control.title());
    }
}

/// Text of a `,bufs` listing.
pub fn render_listing(sessions: &[SessionInfo]) -> String {
    if sessions.is_empty() {
        return "No live sessions".to_string();
    }

    let mut text = format!("Sessions ({}):", sessions.len());
    for (i, session) in sessions.iter().enumerate() {
        text.push_str(&format!("\n  [{}] {}", i + 1, session.title));
    }
    text
}
