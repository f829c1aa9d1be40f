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

use std::fmt;

use crate::error::ResolutionError;

/// One remote shell target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub user: String,
    pub host: String,
}

impl Endpoint {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// Parse `[user@]host`.
    ///
    /// The user falls back to `default_user`, then to the login name of the
    /// invoking user.
    pub fn parse(destination: &str, default_user: Option<&str>) -> Result<Self, ResolutionError> {
        let (user, host) = split_destination(destination)?;
        let user = user
            .or(default_user)
            .map(str::to_string)
            .unwrap_or_else(login_name);
        validate_part(destination, "user", &user)?;
        Ok(Self::new(user, host))
    }

    /// Same user, different host.
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self::new(self.user.clone(), host)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// Split `[user@]host` into its parts without applying any default user.
///
/// The last `@` separates user from host, so login names that contain `@`
/// (directory-backed accounts) survive.
pub fn split_destination(destination: &str) -> Result<(Option<&str>, &str), ResolutionError> {
    let destination_trimmed = destination.trim();
    if destination_trimmed.is_empty() {
        return Err(ResolutionError::invalid(destination, "destination is empty"));
    }

    let (user, host) = match destination_trimmed.rsplit_once('@') {
        Some((user, host)) => {
            validate_part(destination, "user", user)?;
            (Some(user), host)
        }
        None => (None, destination_trimmed),
    };
    validate_part(destination, "host", host)?;

    Ok((user, host))
}

/// Login name of the invoking user.
pub fn login_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| whoami::fallible::username().ok())
        .unwrap_or_else(|| "root".to_string())
}

fn validate_part(destination: &str, field: &str, value: &str) -> Result<(), ResolutionError> {
    if value.is_empty() {
        return Err(ResolutionError::invalid(
            destination,
            format!("{field} is empty"),
        ));
    }
    // Anything starting with '-' would be read as an option by the ssh client
    if value.starts_with('-') {
        return Err(ResolutionError::invalid(
            destination,
            format!("{field} must not start with '-'"),
        ));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ResolutionError::invalid(
            destination,
            format!("{field} contains whitespace or control characters"),
        ));
    }
    Ok(())
}
