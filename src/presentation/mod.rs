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

//! Presentation collaborators
//!
//! The cluster controller never touches screens or windows. It reports what
//! happened through two narrow interfaces:
//!
//! - [`Presenter`] owns the per-session display surfaces and receives
//!   display, output, relayout and close events.
//! - [`ControlSurface`] is the single interactive channel of a cluster. The
//!   controller prints informational text to it and asks it for a prompt
//!   once per handled line.
//!
//! [`TerminalPresenter`] and [`TerminalControl`] render both to the local
//! terminal.

mod prompt;
mod terminal;

pub use prompt::{format_prompt, MAX_INDIVIDUAL_DISPLAY};
pub use terminal::{render_grid, tile_grid, ControlLine, TerminalControl, TerminalPresenter};

use crate::session::Surface;

/// Sink for session display events.
pub trait Presenter: Send + Sync {
    /// A session was opened and owns `surface` from now on.
    fn display(&self, surface: &Surface);

    /// Remote output for `surface`.
    fn output(&self, surface: &Surface, text: &str);

    /// Lay out `surfaces` (in this order) next to the control surface.
    fn relayout(&self, surfaces: &[Surface], control: &str);

    /// The cluster is gone; release everything shown for it.
    fn close_all_surfaces(&self);
}

/// The interactive control channel of one cluster.
pub trait ControlSurface: Send + Sync {
    fn title(&self) -> &str;

    /// Informational text for the user.
    fn print(&self, text: &str);

    /// Signal readiness for the next control line.
    fn prompt(&self, prompt: &str);

    /// Stop accepting input. Later prompts are ignored.
    fn close(&self);
}
