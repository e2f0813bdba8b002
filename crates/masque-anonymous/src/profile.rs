//! Immutable description of the anonymous identity.
//!
//! # Key invariants
//! - A disabled profile has no principal, no realm, no roles and no
//!   permissions, and always allows session creation.
//! - An enabled profile always has a principal.
//!
//! Construction goes through [`AnonymousProfileBuilder::build`], the only
//! place these invariants are enforced.
use masque_authz::{
    AuthzError, Permission, PermissionMatcher, PermissionResolver, SharedPermission,
};
use masque_subject::{Principal, PrincipalCollection};
use std::collections::BTreeSet;
use thiserror::Error;

/// Realm label used when the configuration does not name one.
pub const UNKNOWN_REALM: &str = "n/a";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("anonymous access is enabled but no principal is configured")]
    MissingPrincipal,
    #[error(transparent)]
    Authz(#[from] AuthzError),
}

#[derive(Debug, Clone)]
pub struct AnonymousProfile {
    enabled: bool,
    session_creation_allowed: bool,
    principal: Option<Principal>,
    originating_realm: Option<String>,
    roles: BTreeSet<String>,
    permissions: PermissionMatcher,
}

impl AnonymousProfile {
    pub fn builder() -> AnonymousProfileBuilder {
        AnonymousProfileBuilder::default()
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            session_creation_allowed: true,
            principal: None,
            originating_realm: None,
            roles: BTreeSet::new(),
            permissions: PermissionMatcher::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_session_creation_allowed(&self) -> bool {
        self.session_creation_allowed
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Realm label of the anonymous principal; [`UNKNOWN_REALM`] when enabled
    /// without one, absent when disabled.
    pub fn originating_realm(&self) -> Option<&str> {
        self.originating_realm.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn permissions(&self) -> &[SharedPermission] {
        self.permissions.permissions()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True iff some granted permission implies `permission`.
    pub fn implies(&self, permission: &dyn Permission) -> bool {
        self.permissions.allows(permission)
    }

    pub fn principal_collection(&self) -> Option<PrincipalCollection> {
        let principal = self.principal.clone()?;
        let realm = self.originating_realm.as_deref().unwrap_or(UNKNOWN_REALM);
        Some(PrincipalCollection::single(principal, realm))
    }
}

impl Default for AnonymousProfile {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone)]
pub struct AnonymousProfileBuilder {
    enabled: bool,
    session_creation_allowed: bool,
    principal: Option<Principal>,
    originating_realm: Option<String>,
    roles: BTreeSet<String>,
    permissions: Vec<SharedPermission>,
}

impl Default for AnonymousProfileBuilder {
    fn default() -> Self {
        Self {
            enabled: false,
            session_creation_allowed: true,
            principal: None,
            originating_realm: None,
            roles: BTreeSet::new(),
            permissions: Vec::new(),
        }
    }
}

impl AnonymousProfileBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn session_creation_allowed(mut self, allowed: bool) -> Self {
        self.session_creation_allowed = allowed;
        self
    }

    pub fn principal(mut self, principal: impl Into<Principal>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn originating_realm(mut self, realm: impl Into<String>) -> Self {
        self.originating_realm = Some(realm.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn permission(mut self, permission: SharedPermission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = SharedPermission>,
    {
        self.permissions.extend(permissions);
        self
    }

    /// Resolves raw permission strings and adds them to the grant set.
    pub fn resolve_permissions<S: AsRef<str>>(
        mut self,
        resolver: &dyn PermissionResolver,
        permissions: &[S],
    ) -> Result<Self, ProfileError> {
        for permission in permissions {
            self.permissions.push(resolver.resolve(permission.as_ref())?);
        }
        Ok(self)
    }

    /// Validates and freezes the profile.
    ///
    /// A disabled profile drops every identity and grant it was given.
    ///
    /// # Errors
    /// - [`ProfileError::MissingPrincipal`] if enabled without a principal,
    ///   or with a blank one.
    pub fn build(self) -> Result<AnonymousProfile, ProfileError> {
        if !self.enabled {
            return Ok(AnonymousProfile::disabled());
        }
        let principal = self
            .principal
            .filter(|principal| !principal.as_str().trim().is_empty())
            .ok_or(ProfileError::MissingPrincipal)?;
        Ok(AnonymousProfile {
            enabled: true,
            session_creation_allowed: self.session_creation_allowed,
            principal: Some(principal),
            originating_realm: Some(
                self.originating_realm
                    .unwrap_or_else(|| UNKNOWN_REALM.to_string()),
            ),
            roles: self.roles,
            permissions: PermissionMatcher::new(self.permissions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masque_authz::{WildcardPermission, WildcardPermissionResolver};

    fn perm(value: &str) -> WildcardPermission {
        WildcardPermission::parse(value).expect("parse permission")
    }

    #[test]
    fn disabled_builder_discards_everything() {
        let profile = AnonymousProfile::builder()
            .enabled(false)
            .session_creation_allowed(false)
            .principal("anon")
            .originating_realm("guest-realm")
            .roles(["guest"])
            .permission(perm("read:*").shared())
            .build()
            .expect("build");
        assert!(!profile.is_enabled());
        assert!(profile.is_session_creation_allowed());
        assert!(profile.principal().is_none());
        assert!(profile.originating_realm().is_none());
        assert!(profile.roles().is_empty());
        assert!(profile.permissions().is_empty());
        assert!(profile.principal_collection().is_none());
        assert!(!profile.implies(&perm("read:doc1")));
    }

    #[test]
    fn enabled_profile_requires_principal() {
        let err = AnonymousProfile::builder()
            .enabled(true)
            .build()
            .expect_err("missing principal");
        assert!(matches!(err, ProfileError::MissingPrincipal));
    }

    #[test]
    fn enabled_profile_rejects_blank_principal() {
        for blank in ["", "   "] {
            let err = AnonymousProfile::builder()
                .enabled(true)
                .principal(blank)
                .build()
                .expect_err("blank principal");
            assert!(matches!(err, ProfileError::MissingPrincipal), "{blank:?}");
        }
        // Disabled profiles ignore the principal entirely.
        let profile = AnonymousProfile::builder()
            .principal("")
            .build()
            .expect("disabled");
        assert!(!profile.is_enabled());
    }

    #[test]
    fn enabled_profile_keeps_grants() {
        let resolver = WildcardPermissionResolver::new();
        let profile = AnonymousProfile::builder()
            .enabled(true)
            .session_creation_allowed(false)
            .principal("anon")
            .role("guest")
            .resolve_permissions(&resolver, &["read:*"])
            .expect("resolve")
            .build()
            .expect("build");
        assert!(profile.is_enabled());
        assert!(!profile.is_session_creation_allowed());
        assert_eq!(profile.principal(), Some(&Principal::new("anon")));
        assert!(profile.has_role("guest"));
        assert!(!profile.has_role("admin"));
        assert!(profile.implies(&perm("read:doc1")));
        assert!(!profile.implies(&perm("write:doc1")));
    }

    #[test]
    fn realm_defaults_to_sentinel() {
        let profile = AnonymousProfile::builder()
            .enabled(true)
            .principal("anon")
            .build()
            .expect("build");
        assert_eq!(profile.originating_realm(), Some(UNKNOWN_REALM));
        let principals = profile.principal_collection().expect("principals");
        assert_eq!(principals.primary().as_str(), "anon");
        assert_eq!(principals.realm_names(), vec![UNKNOWN_REALM]);
    }

    #[test]
    fn explicit_realm_is_used_for_principals() {
        let profile = AnonymousProfile::builder()
            .enabled(true)
            .principal("anon")
            .originating_realm("public")
            .build()
            .expect("build");
        let principals = profile.principal_collection().expect("principals");
        assert_eq!(principals.realm_names(), vec!["public"]);
    }

    #[test]
    fn invalid_permission_strings_fail_resolution() {
        let resolver = WildcardPermissionResolver::new();
        let err = AnonymousProfile::builder()
            .enabled(true)
            .principal("anon")
            .resolve_permissions(&resolver, &["read::doc"])
            .expect_err("bad permission");
        assert!(matches!(err, ProfileError::Authz(_)));
    }
}
