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

//! Host range expansion for explicit host lists
//!
//! A compact pdsh-style notation lets one list entry stand for many hosts:
//!
//! - Simple range: `node[1-3]` -> `node1, node2, node3`
//! - Zero-padded range: `node[01-03]` -> `node01, node02, node03`
//! - Values and ranges: `node[1,4-5]` -> `node1, node4, node5`
//! - Several brackets expand as a cartesian product:
//!   `rack[1-2]-node[1-2]` -> `rack1-node1, rack1-node2, rack2-node1, rack2-node2`
//!
//! ```rust
//! use cssh::hostlist::expand_hostlist;
//!
//! let hosts = expand_hostlist("web[1-3].example.com").unwrap();
//! assert_eq!(hosts, vec!["web1.example.com", "web2.example.com", "web3.example.com"]);
//! ```

mod error;

pub use error::HostlistError;

/// Upper bound on the hosts one expression may produce. Every host becomes a
/// local ssh process, so this is far below what pdsh-style tools accept.
pub const MAX_HOSTS: usize = 1024;

enum Segment {
    Literal(String),
    Range(Vec<String>),
}

/// Expand a host expression into hostnames, in expression order.
pub fn expand_hostlist(expr: &str) -> Result<Vec<String>, HostlistError> {
    let mut hosts = vec![String::new()];

    for segment in parse_segments(expr)? {
        match segment {
            Segment::Literal(text) => {
                for host in &mut hosts {
                    host.push_str(&text);
                }
            }
            Segment::Range(values) => {
                let count = hosts.len().saturating_mul(values.len());
                if count > MAX_HOSTS {
                    return Err(too_many(expr, count));
                }
                hosts = hosts
                    .iter()
                    .flat_map(|host| values.iter().map(move |value| format!("{host}{value}")))
                    .collect();
            }
        }
    }

    hosts.retain(|host| !host.is_empty());
    Ok(hosts)
}

fn parse_segments(expr: &str) -> Result<Vec<Segment>, HostlistError> {
    let mut segments = Vec::new();
    let mut rest = expr;

    while let Some(pos) = rest.find(['[', ']']) {
        if rest[pos..].starts_with(']') {
            return Err(HostlistError::UnbalancedBracket {
                expression: expr.to_string(),
            });
        }
        if pos > 0 {
            segments.push(Segment::Literal(rest[..pos].to_string()));
        }

        let after = &rest[pos + 1..];
        let close = after.find(']').ok_or_else(|| HostlistError::UnclosedBracket {
            expression: expr.to_string(),
        })?;
        let body = &after[..close];
        if body.contains('[') {
            return Err(HostlistError::UnbalancedBracket {
                expression: expr.to_string(),
            });
        }

        segments.push(Segment::Range(expand_range_body(expr, body)?));
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

fn expand_range_body(expr: &str, body: &str) -> Result<Vec<String>, HostlistError> {
    if body.trim().is_empty() {
        return Err(HostlistError::EmptyBracket {
            expression: expr.to_string(),
        });
    }

    let mut values = Vec::new();
    for item in body.split(',') {
        let item = item.trim();
        let invalid = || HostlistError::InvalidItem {
            expression: expr.to_string(),
            item: item.to_string(),
        };

        let (start_text, end_text) = item.split_once('-').unwrap_or((item, item));
        if !is_decimal(start_text) || !is_decimal(end_text) {
            return Err(invalid());
        }
        let start: u64 = start_text.parse().map_err(|_| invalid())?;
        let end: u64 = end_text.parse().map_err(|_| invalid())?;
        if start > end {
            return Err(HostlistError::ReversedRange {
                expression: expr.to_string(),
                start,
                end,
            });
        }

        let count = (end - start)
            .checked_add(1)
            .and_then(|span| span.checked_add(values.len() as u64));
        match count {
            Some(count) if count <= MAX_HOSTS as u64 => {}
            _ => {
                let count = count.and_then(|c| usize::try_from(c).ok()).unwrap_or(usize::MAX);
                return Err(too_many(expr, count));
            }
        }

        // Leading zero on the start value fixes the width, as in node[01-10]
        let width = if start_text.len() > 1 && start_text.starts_with('0') {
            start_text.len()
        } else {
            0
        };
        values.extend((start..=end).map(|n| format!("{n:0width$}")));
    }

    Ok(values)
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn too_many(expr: &str, count: usize) -> HostlistError {
    HostlistError::TooManyHosts {
        expression: expr.to_string(),
        count,
        limit: MAX_HOSTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_host() {
        assert_eq!(expand_hostlist("db.example.com").unwrap(), vec!["db.example.com"]);
        assert!(expand_hostlist("").unwrap().is_empty());
    }

    #[test]
    fn test_simple_range() {
        assert_eq!(
            expand_hostlist("node[1-3]").unwrap(),
            vec!["node1", "node2", "node3"]
        );
    }

    #[test]
    fn test_zero_padded_range() {
        assert_eq!(
            expand_hostlist("node[08-10]").unwrap(),
            vec!["node08", "node09", "node10"]
        );
    }

    #[test]
    fn test_values_and_ranges() {
        assert_eq!(
            expand_hostlist("web[1,4-5].example.com").unwrap(),
            vec!["web1.example.com", "web4.example.com", "web5.example.com"]
        );
    }

    #[test]
    fn test_cartesian_product() {
        assert_eq!(
            expand_hostlist("rack[1-2]-node[1-2]").unwrap(),
            vec!["rack1-node1", "rack1-node2", "rack2-node1", "rack2-node2"]
        );
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(matches!(
            expand_hostlist("node[]"),
            Err(HostlistError::EmptyBracket { .. })
        ));
        assert!(matches!(
            expand_hostlist("node[1-3"),
            Err(HostlistError::UnclosedBracket { .. })
        ));
        assert!(matches!(
            expand_hostlist("node]1["),
            Err(HostlistError::UnbalancedBracket { .. })
        ));
        assert!(matches!(
            expand_hostlist("node[[1-2]]"),
            Err(HostlistError::UnbalancedBracket { .. })
        ));
        assert!(matches!(
            expand_hostlist("node[a-c]"),
            Err(HostlistError::InvalidItem { .. })
        ));
        assert!(matches!(
            expand_hostlist("node[5-1]"),
            Err(HostlistError::ReversedRange { start: 5, end: 1, .. })
        ));
    }

    #[test]
    fn test_expansion_limit() {
        assert!(matches!(
            expand_hostlist("node[1-5000]"),
            Err(HostlistError::TooManyHosts { .. })
        ));
        assert!(matches!(
            expand_hostlist("a[1-100]b[1-100]"),
            Err(HostlistError::TooManyHosts { count: 10000, .. })
        ));
    }

    #[test]
    fn test_range_at_integer_limit_is_rejected() {
        assert!(matches!(
            expand_hostlist("n[0-18446744073709551615]"),
            Err(HostlistError::TooManyHosts { count: usize::MAX, .. })
        ));
        assert_eq!(
            expand_hostlist("n[1,18446744073709551614-18446744073709551615]").unwrap(),
            vec!["n1", "n18446744073709551614", "n18446744073709551615"]
        );
        assert!(matches!(
            expand_hostlist("n[1-1000,5-100]"),
            Err(HostlistError::TooManyHosts { count: 1096, .. })
        ));
    }
}
