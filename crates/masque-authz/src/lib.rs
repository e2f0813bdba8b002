//! Permission primitives shared by subjects and the anonymous overlay.
//!
//! # Purpose
//! Centralizes the permission capability (an implication pre-order), the
//! wildcard permission grammar, permission matching and string resolution.
//!
//! # How it fits
//! Subjects evaluate authorization by asking granted permissions whether they
//! imply a requested one. Nothing outside this crate depends on the string
//! grammar; callers go through [`PermissionResolver`].
//!
//! # Key invariants
//! - [`Permission::implies`] is reflexive and transitive.
//! - Resolution is pure; resolving the same string twice is equivalent.
//!
//! # Examples
//! ```rust
//! use masque_authz::{PermissionMatcher, PermissionResolver, WildcardPermissionResolver};
//!
//! let resolver = WildcardPermissionResolver::new();
//! let matcher = PermissionMatcher::from_strings(&resolver, &["read:*"]).unwrap();
//! let wanted = resolver.resolve("read:doc1").unwrap();
//! assert!(matcher.allows(wanted.as_ref()));
//! ```

mod errors;
mod matcher;
mod permission;
mod resolver;

pub use errors::{AuthzError, AuthzResult};
pub use matcher::{PermissionMatcher, wildcard_match};
pub use permission::{Permission, PermissionArg, SharedPermission, WildcardPermission};
pub use resolver::{PermissionResolver, WildcardPermissionResolver};
