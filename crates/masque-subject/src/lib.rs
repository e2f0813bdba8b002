//! Subject contract and supporting types.
//!
//! # Purpose
//! Describes the caller context an application checks for permissions,
//! roles, sessions and identity, plus an in-memory implementation.
//!
//! # How it fits
//! Decorators such as the anonymous overlay wrap any [`Subject`]; request
//! pipelines obtain subjects from a [`SubjectFactory`].
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use masque_subject::{AuthenticationToken, InMemoryRealm, InMemorySubject, Subject};
//!
//! let realm = InMemoryRealm::with_wildcard_permissions("memory");
//! realm.add_account("alice", "secret", &["user"], &["docs:*"]).unwrap();
//! let mut subject = InMemorySubject::new(Arc::new(realm));
//! subject.login(&AuthenticationToken::new("alice", "secret")).unwrap();
//! assert!(subject.is_permitted("docs:read".into()));
//! ```

mod errors;
mod memory;
mod principal;
mod session;
mod subject;
mod token;

pub use errors::{SubjectError, SubjectResult};
pub use memory::{DEFAULT_REALM, InMemoryRealm, InMemorySubject, InMemorySubjectFactory};
pub use principal::{EmptyPrincipalCollection, Principal, PrincipalCollection, RealmPrincipal};
pub use session::Session;
pub use subject::{Subject, SubjectContext, SubjectFactory, Task};
pub use token::AuthenticationToken;
