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

use thiserror::Error;

/// Errors that can occur while expanding a host range expression
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostlistError {
    /// Empty bracket expression (e.g., `node[]`)
    #[error("empty bracket expression in '{expression}'")]
    EmptyBracket { expression: String },

    /// Unclosed bracket (e.g., `node[1-5`)
    #[error("unclosed bracket in '{expression}'")]
    UnclosedBracket { expression: String },

    /// Closing bracket without an opening one, or a nested opening bracket
    #[error("unbalanced brackets in '{expression}'")]
    UnbalancedBracket { expression: String },

    /// Range item that is not `N` or `A-B` with decimal digits
    #[error("invalid range item '{item}' in '{expression}'")]
    InvalidItem { expression: String, item: String },

    /// Reversed range (e.g., `node[5-1]`)
    #[error("reversed range '{start}-{end}' in '{expression}' (start must be <= end)")]
    ReversedRange {
        expression: String,
        start: u64,
        end: u64,
    },

    /// Expansion would open more sessions than allowed
    #[error("'{expression}' expands to {count} hosts, exceeding the limit of {limit}")]
    TooManyHosts {
        expression: String,
        count: usize,
        limit: usize,
    },
}
