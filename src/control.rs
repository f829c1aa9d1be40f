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

//! Control-line classification
//!
//! A line whose first character is the sentinel `,` is a control command;
//! everything else is data for the sessions. Recognized commands form a
//! closed set. Command-shaped lines that match none of them classify as
//! [`Command::Unrecognized`] and are ignored by the controller.

use std::fmt;

/// First character of every control command.
pub const COMMAND_SENTINEL: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `,tile` - ask the presentation layer to lay out all session surfaces
    Tile,
    /// `,quit` - tear down the control surface and every session
    Quit,
    /// `,bufs` - list the cluster's sessions
    Bufs,
    /// Command-shaped line that names no known command (sentinel stripped)
    Unrecognized(String),
}

impl Command {
    /// Every recognized command, in help order.
    pub const RECOGNIZED: [Command; 3] = [Command::Tile, Command::Quit, Command::Bufs];

    pub fn keyword(&self) -> &str {
        match self {
            Command::Tile => "tile",
            Command::Quit => "quit",
            Command::Bufs => "bufs",
            Command::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unrecognized(_))
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "tile" => Command::Tile,
            "quit" => Command::Quit,
            "bufs" => Command::Bufs,
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COMMAND_SENTINEL}{}", self.keyword())
    }
}

/// Classification of one control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Forwarded verbatim to every live session
    Data(String),
}

/// Classify a control line.
///
/// Trailing whitespace (including a line terminator) is ignored when matching
/// keywords. Data keeps the line exactly as given, minus a trailing line
/// terminator.
pub fn classify(line: &str) -> Input {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    match line.strip_prefix(COMMAND_SENTINEL) {
        Some(rest) => Input::Command(Command::from_keyword(rest.trim_end())),
        None => Input::Data(line.to_string()),
    }
}
