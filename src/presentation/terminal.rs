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

//! Local terminal rendering of a cluster

use std::path::PathBuf;
use std::sync::{mpsc as std_mpsc, Mutex, PoisonError};
use std::thread;

use owo_colors::OwoColorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use super::{ControlSurface, Presenter};
use crate::session::Surface;

const HISTORY_SIZE: usize = 1000;
const FALLBACK_TERMINAL_WIDTH: u16 = 80;

/// Rows and columns of a grid that fits `count` tiles.
///
/// Columns are `ceil(sqrt(count))`, rows are whatever that leaves.
pub fn tile_grid(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let mut cols = 1;
    while cols * cols < count {
        cols += 1;
    }
    let rows = count.div_ceil(cols);
    (rows, cols)
}

/// Render surface titles as text rows of a tile grid, `width` columns wide.
pub fn render_grid(surfaces: &[Surface], width: usize) -> Vec<String> {
    let (_, cols) = tile_grid(surfaces.len());
    if cols == 0 {
        return Vec::new();
    }
    let cell = (width / cols).max(8);

    surfaces
        .chunks(cols)
        .map(|row| {
            row.iter()
                .map(|surface| {
                    let label = format!("[{}] {}", surface.session, surface.title);
                    let label: String = label.chars().take(cell - 1).collect();
                    format!("{label:<cell$}")
                })
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Presenter that interleaves every session's output on stdout, one
/// prefixed line at a time.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    show_timestamps: bool,
}

impl TerminalPresenter {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }
}

impl Presenter for TerminalPresenter {
    fn display(&self, surface: &Surface) {
        println!(
            "{} {} {}",
            "✓".green(),
            surface.title.cyan(),
            format!("({})", surface.session).dimmed()
        );
    }

    fn output(&self, surface: &Surface, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            if self.show_timestamps {
                let timestamp = chrono::Local::now().format("%H:%M:%S");
                println!(
                    "[{} {}] {}",
                    timestamp.to_string().dimmed(),
                    surface.title.cyan(),
                    line
                );
            } else {
                println!("[{}] {}", surface.title.cyan(), line);
            }
        }
    }

    fn relayout(&self, surfaces: &[Surface], control: &str) {
        let width = crossterm::terminal::size()
            .map(|(w, _)| w)
            .unwrap_or(FALLBACK_TERMINAL_WIDTH) as usize;
        let (rows, cols) = tile_grid(surfaces.len());

        println!(
            "{} {}x{} ({})",
            "Layout".bold(),
            rows,
            cols,
            control.dimmed()
        );
        for row in render_grid(surfaces, width) {
            println!("  {row}");
        }
    }

    fn close_all_surfaces(&self) {
        println!("{}", "All session surfaces closed".dimmed());
    }
}

/// What the user did at the control prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLine {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D, or the terminal went away
    Eof,
}

/// Control surface backed by a line editor on the local terminal.
///
/// The editor blocks, so it lives on its own thread. Each
/// [`ControlSurface::prompt`] call lets it read exactly one line, which is
/// delivered on the channel returned by [`TerminalControl::spawn`].
pub struct TerminalControl {
    title: String,
    requests: Mutex<Option<std_mpsc::Sender<String>>>,
}

impl TerminalControl {
    pub fn spawn(
        title: impl Into<String>,
        history_file: Option<PathBuf>,
    ) -> (std::sync::Arc<Self>, mpsc::UnboundedReceiver<ControlLine>) {
        let (request_tx, request_rx) = std_mpsc::channel::<String>();
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        thread::spawn(move || read_lines(request_rx, line_tx, history_file));

        let control = std::sync::Arc::new(Self {
            title: title.into(),
            requests: Mutex::new(Some(request_tx)),
        });
        (control, line_rx)
    }
}

impl ControlSurface for TerminalControl {
    fn title(&self) -> &str {
        &self.title
    }

    fn print(&self, text: &str) {
        println!("{text}");
    }

    fn prompt(&self, prompt: &str) {
        let requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = requests.as_ref() {
            let _ = tx.send(prompt.to_string());
        }
    }

    fn close(&self) {
        // Dropping the sender ends the editor thread after its current read
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

fn read_lines(
    requests: std_mpsc::Receiver<String>,
    lines: mpsc::UnboundedSender<ControlLine>,
    history_file: Option<PathBuf>,
) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            tracing::error!("Failed to initialise line editor: {e}");
            let _ = lines.send(ControlLine::Eof);
            return;
        }
    };
    let _ = rl.set_max_history_size(HISTORY_SIZE);

    if let Some(path) = history_file.as_ref().filter(|p| p.exists()) {
        if let Err(e) = rl.load_history(path) {
            tracing::debug!("Could not load history from {}: {e}", path.display());
        }
    }

    while let Ok(prompt) = requests.recv() {
        let event = match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                ControlLine::Line(line)
            }
            Err(ReadlineError::Interrupted) => ControlLine::Interrupted,
            Err(ReadlineError::Eof) => ControlLine::Eof,
            Err(e) => {
                tracing::error!("Line editor failed: {e}");
                ControlLine::Eof
            }
        };
        if lines.send(event).is_err() {
            break;
        }
    }

    if let Some(path) = history_file {
        if let Err(e) = rl.save_history(&path) {
            tracing::debug!("Could not save history to {}: {e}", path.display());
        }
    }
}
