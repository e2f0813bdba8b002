//! Anonymous identity overlay for subjects without an established principal.
//!
//! # Purpose
//! Lets unauthenticated callers act under a configured anonymous identity,
//! role set and permission set, without ever leaking those grants onto a real
//! identity.
//!
//! # How it fits
//! - [`AnonymousProfile`]: immutable anonymous settings, produced by a
//!   [`ConfigurationSource`] (for example a [`LiveConfigurationSource`] built
//!   from [`AnonymousSettings`]).
//! - [`IdentityOverlay`]: decorator around any [`masque_subject::Subject`].
//! - [`OverlayFactory`]: wraps a subject factory so every subject gets one.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use masque_anonymous::{AnonymousProfile, LiveConfigurationSource, OverlayFactory};
//! use masque_authz::WildcardPermissionResolver;
//! use masque_subject::{InMemoryRealm, InMemorySubjectFactory, Subject, SubjectContext};
//!
//! let resolver = Arc::new(WildcardPermissionResolver::new());
//! let profile = AnonymousProfile::builder()
//!     .enabled(true)
//!     .principal("anonymous")
//!     .role("guest")
//!     .resolve_permissions(resolver.as_ref(), &["read:*"])
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let realm = Arc::new(InMemoryRealm::with_wildcard_permissions("memory"));
//! let factory = OverlayFactory::new(
//!     InMemorySubjectFactory::new(realm),
//!     Arc::new(LiveConfigurationSource::new(profile)),
//!     resolver,
//! );
//!
//! let mut subject = factory.create(&SubjectContext::new());
//! subject.activate();
//! assert!(subject.has_role("guest"));
//! assert!(subject.is_permitted("read:doc1".into()));
//! assert!(!subject.is_permitted("write:doc1".into()));
//! ```

mod config;
mod factory;
mod overlay;
mod profile;
mod source;

pub use config::{AnonymousSettings, DEFAULT_ANONYMOUS_PRINCIPAL};
pub use factory::OverlayFactory;
pub use overlay::{Activation, IdentityOverlay};
pub use profile::{AnonymousProfile, AnonymousProfileBuilder, ProfileError, UNKNOWN_REALM};
pub use source::{ConfigurationSource, LiveConfigurationSource};
