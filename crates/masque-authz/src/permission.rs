//! Permission capability and the wildcard permission grammar.
//!
//! # Purpose
//! Defines the [`Permission`] trait (an implication pre-order) and
//! [`WildcardPermission`], the default string-backed implementation.
//!
//! # How it fits
//! Resolvers turn permission strings into [`SharedPermission`] values; the
//! matcher and subjects only ever call [`Permission::implies`], so any other
//! grammar can be plugged in without touching evaluation code.
//!
//! # Key invariants
//! - `implies` is reflexive: every permission implies itself.
//! - Wildcard strings are `part(:part)*`, each part a `,`-separated token list.
//! - A token may be a glob; `*` alone grants the whole part.
//! - A shorter permission implies any longer one sharing its prefix.
//!
//! # Examples
//! ```rust
//! use masque_authz::{Permission, WildcardPermission};
//!
//! let granted = WildcardPermission::parse("read:*").unwrap();
//! let wanted = WildcardPermission::parse("read:doc1").unwrap();
//! assert!(granted.implies(&wanted));
//! assert!(!wanted.implies(&granted));
//! ```
//!
//! # Common pitfalls
//! - Mixing permission implementations: a wildcard permission never implies a
//!   permission of another concrete type.
use crate::{AuthzError, AuthzResult, PermissionResolver};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

const PART_DIVIDER: char = ':';
const TOKEN_DIVIDER: char = ',';
const WILDCARD_TOKEN: &str = "*";

/// A capability token ordered by implication.
pub trait Permission: fmt::Debug + Send + Sync {
    /// True if holding `self` grants everything `other` grants.
    fn implies(&self, other: &dyn Permission) -> bool;

    /// Downcast hook so implementations can compare against their own type.
    fn as_any(&self) -> &dyn Any;
}

pub type SharedPermission = Arc<dyn Permission>;

/// Colon/comma separated permission with glob tokens, e.g. `repo:read,write:docs-*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardPermission {
    parts: Vec<Vec<String>>,
}

impl WildcardPermission {
    /// Parse a case-insensitive wildcard permission.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidPermission`] for empty input or empty parts.
    pub fn parse(value: &str) -> AuthzResult<Self> {
        Self::parse_with_case(value, false)
    }

    /// Parse a wildcard permission, lower-casing tokens unless `case_sensitive`.
    pub fn parse_with_case(value: &str, case_sensitive: bool) -> AuthzResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AuthzError::invalid(value, "permission string is empty"));
        }

        let mut parts = Vec::new();
        for part in trimmed.split(PART_DIVIDER) {
            let tokens: Vec<String> = part
                .split(TOKEN_DIVIDER)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| {
                    if case_sensitive {
                        token.to_string()
                    } else {
                        token.to_lowercase()
                    }
                })
                .collect();
            if tokens.is_empty() {
                return Err(AuthzError::invalid(value, "permission part is empty"));
            }
            parts.push(tokens);
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Vec<String>] {
        &self.parts
    }

    pub fn shared(self) -> SharedPermission {
        Arc::new(self)
    }

    fn part_covers(granted: &[String], requested: &[String]) -> bool {
        requested.iter().all(|token| {
            granted
                .iter()
                .any(|pattern| crate::wildcard_match(pattern, token))
        })
    }
}

impl Permission for WildcardPermission {
    fn implies(&self, other: &dyn Permission) -> bool {
        let Some(other) = other.as_any().downcast_ref::<WildcardPermission>() else {
            return false;
        };

        for (index, requested) in other.parts.iter().enumerate() {
            let Some(granted) = self.parts.get(index) else {
                // Everything past our last part is implicitly granted.
                return true;
            };
            if !Self::part_covers(granted, requested) {
                return false;
            }
        }

        // Extra trailing parts must be wildcards, or the grant is narrower than the request.
        self.parts
            .iter()
            .skip(other.parts.len())
            .all(|part| part.iter().any(|token| token == WILDCARD_TOKEN))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::str::FromStr for WildcardPermission {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for WildcardPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|tokens| tokens.join(","))
            .collect();
        f.write_str(&rendered.join(":"))
    }
}

impl serde::Serialize for WildcardPermission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for WildcardPermission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A permission argument as callers hand it to a subject: raw text or a
/// resolved permission object.
#[derive(Clone, Copy)]
pub enum PermissionArg<'a> {
    Text(&'a str),
    Object(&'a dyn Permission),
}

impl<'a> PermissionArg<'a> {
    /// Evaluate `check` against the resolved permission.
    ///
    /// Text arguments go through `resolver` first; objects are used as-is.
    pub fn evaluate<F>(&self, resolver: &dyn PermissionResolver, check: F) -> AuthzResult<bool>
    where
        F: FnOnce(&dyn Permission) -> bool,
    {
        match *self {
            PermissionArg::Object(permission) => Ok(check(permission)),
            PermissionArg::Text(text) => {
                let resolved = resolver.resolve(text)?;
                Ok(check(resolved.as_ref()))
            }
        }
    }
}

impl fmt::Debug for PermissionArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionArg::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PermissionArg::Object(permission) => f.debug_tuple("Object").field(permission).finish(),
        }
    }
}

impl fmt::Display for PermissionArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionArg::Text(text) => f.write_str(text),
            PermissionArg::Object(permission) => write!(f, "{permission:?}"),
        }
    }
}

impl<'a> From<&'a str> for PermissionArg<'a> {
    fn from(value: &'a str) -> Self {
        PermissionArg::Text(value)
    }
}

impl<'a> From<&'a String> for PermissionArg<'a> {
    fn from(value: &'a String) -> Self {
        PermissionArg::Text(value.as_str())
    }
}

impl<'a> From<&'a dyn Permission> for PermissionArg<'a> {
    fn from(value: &'a dyn Permission) -> Self {
        PermissionArg::Object(value)
    }
}

impl<'a> From<&'a WildcardPermission> for PermissionArg<'a> {
    fn from(value: &'a WildcardPermission) -> Self {
        PermissionArg::Object(value)
    }
}

impl<'a> From<&'a SharedPermission> for PermissionArg<'a> {
    fn from(value: &'a SharedPermission) -> Self {
        PermissionArg::Object(value.as_ref())
    }
}
