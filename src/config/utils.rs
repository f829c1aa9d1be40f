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

//! Configuration utility functions.

use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()));

    match home {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Expand `${VAR}` and `$VAR` references. Unknown variables are left as
/// written.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = matches!(chars.peek(), Some((_, '{')));
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        let closed = braced && matches!(chars.peek(), Some((_, '}')));
        if braced && !closed {
            // Not a reference; copy what was consumed
            result.push_str("${");
            result.push_str(&name);
            continue;
        }
        if closed {
            chars.next();
        }

        if name.is_empty() {
            result.push_str(if braced { "${}" } else { "$" });
            continue;
        }

        match std::env::var(&name) {
            Ok(value) => result.push_str(&value),
            Err(_) => {
                tracing::debug!("Environment variable {} not found", name);
                let end = chars.peek().map(|&(i, _)| i).unwrap_or(input.len());
                result.push_str(&input[start..end]);
            }
        }
    }

    result
}
