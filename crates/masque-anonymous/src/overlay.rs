//! Anonymous identity overlay.
//!
//! # Purpose
//! Wraps a [`Subject`] and answers authorization queries from an anonymous
//! profile while no real principal is present.
//!
//! # How it fits
//! The request pipeline builds one overlay per subject (see
//! [`crate::OverlayFactory`]) and calls [`IdentityOverlay::activate`] when a
//! request arrives without credentials. Login, logout and
//! [`IdentityOverlay::deactivate`] drop the anonymous snapshot again.
//!
//! # Key invariants
//! - The overlay is active iff it holds a profile snapshot.
//! - Activation never overlays a subject that already has principals
//!   (authenticated or remembered).
//! - While active, roles and permissions come only from the snapshot; the
//!   subject's own grants are never consulted, and the snapshot never leaks
//!   once a real identity is established.
//! - Identity queries (`principal`, `principals`) always delegate, even while
//!   active. [`IdentityOverlay::anonymous_principals`] exposes the anonymous
//!   identity explicitly.
//!
//! # Concurrency
//! Transitions take `&mut self`, so one owner drives an overlay at a time.
//! There is no internal locking; share an overlay across threads only for
//! read-only checks after its state is settled.
use crate::{AnonymousProfile, ConfigurationSource};
use masque_authz::{PermissionArg, PermissionResolver};
use masque_subject::{
    AuthenticationToken, Principal, PrincipalCollection, Session, Subject, SubjectError,
    SubjectResult, Task,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`IdentityOverlay::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// An anonymous snapshot was captured.
    Activated,
    /// The overlay was already anonymous; nothing changed.
    AlreadyActive,
    /// The configuration source returned a disabled profile.
    Disabled,
    /// The subject already carries principals.
    PrincipalPresent,
}

impl Activation {
    pub fn is_anonymous(self) -> bool {
        matches!(self, Activation::Activated | Activation::AlreadyActive)
    }
}

pub struct IdentityOverlay<S: Subject = Box<dyn Subject>> {
    subject: S,
    source: Arc<dyn ConfigurationSource>,
    resolver: Arc<dyn PermissionResolver>,
    snapshot: Option<Arc<AnonymousProfile>>,
    session_creation_allowed: bool,
}

impl<S: Subject> IdentityOverlay<S> {
    pub fn new(
        subject: S,
        source: Arc<dyn ConfigurationSource>,
        resolver: Arc<dyn PermissionResolver>,
    ) -> Self {
        Self {
            subject,
            source,
            resolver,
            snapshot: None,
            session_creation_allowed: true,
        }
    }

    /// Overlays the configured anonymous identity if the subject has none.
    ///
    /// Fetches the profile from the configuration source on every attempt.
    /// On success the subject is logged out first so no stray session-bound
    /// identity survives underneath the anonymous one.
    pub fn activate(&mut self) -> Activation {
        if self.snapshot.is_some() {
            return Activation::AlreadyActive;
        }

        let profile = self.source.configuration();
        if !profile.is_enabled() {
            debug!("anonymous access disabled; overlay stays inactive");
            return Activation::Disabled;
        }
        // Authenticated and remembered subjects both carry principals.
        if self.subject.principals().is_some() {
            debug!("subject already has principals; anonymous identity not applied");
            return Activation::PrincipalPresent;
        }

        self.subject.logout();
        self.session_creation_allowed = profile.is_session_creation_allowed();
        debug!(
            principal = ?profile.principal().map(Principal::as_str),
            roles = profile.roles().len(),
            permissions = profile.permissions().len(),
            session_creation_allowed = self.session_creation_allowed,
            "anonymous identity activated"
        );
        self.snapshot = Some(profile);
        Activation::Activated
    }

    /// Drops the anonymous identity, logging the subject out.
    ///
    /// Returns `false` (and leaves the subject untouched) when not active.
    pub fn deactivate(&mut self) -> bool {
        if self.snapshot.is_none() {
            return false;
        }
        self.subject.logout();
        self.reset();
        debug!("anonymous identity deactivated");
        true
    }

    pub fn is_anonymous(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The profile captured at activation, if active.
    pub fn profile(&self) -> Option<&AnonymousProfile> {
        self.snapshot.as_deref()
    }

    pub fn anonymous_principals(&self) -> Option<PrincipalCollection> {
        self.profile().and_then(AnonymousProfile::principal_collection)
    }

    pub fn subject(&self) -> &S {
        &self.subject
    }

    pub fn into_subject(self) -> S {
        self.subject
    }

    fn reset(&mut self) {
        self.snapshot = None;
        self.session_creation_allowed = true;
    }

    fn permitted(&self, profile: &AnonymousProfile, permission: PermissionArg<'_>) -> bool {
        match permission.evaluate(self.resolver.as_ref(), |wanted| profile.implies(wanted)) {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(error = %err, "unresolvable permission denied for anonymous subject");
                false
            }
        }
    }

    fn check_anonymous_permission(
        &self,
        profile: &AnonymousProfile,
        permission: PermissionArg<'_>,
    ) -> SubjectResult<()> {
        if self.permitted(profile, permission) {
            Ok(())
        } else {
            Err(SubjectError::Unauthorized(format!(
                "anonymous subject is not permitted [{permission}]"
            )))
        }
    }

    fn check_anonymous_role(profile: &AnonymousProfile, role: &str) -> SubjectResult<()> {
        if profile.has_role(role) {
            Ok(())
        } else {
            Err(SubjectError::Unauthorized(format!("missing required role [{role}]")))
        }
    }
}

impl<S: Subject> Subject for IdentityOverlay<S> {
    fn principal(&self) -> Option<Principal> {
        self.subject.principal()
    }

    fn principals(&self) -> Option<PrincipalCollection> {
        self.subject.principals()
    }

    fn is_permitted(&self, permission: PermissionArg<'_>) -> bool {
        match self.profile() {
            Some(profile) => self.permitted(profile, permission),
            None => self.subject.is_permitted(permission),
        }
    }

    fn is_permitted_each(&self, permissions: &[PermissionArg<'_>]) -> Vec<bool> {
        match self.profile() {
            Some(profile) => permissions
                .iter()
                .map(|permission| self.permitted(profile, *permission))
                .collect(),
            None => self.subject.is_permitted_each(permissions),
        }
    }

    fn is_permitted_all(&self, permissions: &[PermissionArg<'_>]) -> bool {
        match self.profile() {
            Some(profile) => permissions
                .iter()
                .all(|permission| self.permitted(profile, *permission)),
            None => self.subject.is_permitted_all(permissions),
        }
    }

    fn check_permission(&self, permission: PermissionArg<'_>) -> SubjectResult<()> {
        match self.profile() {
            Some(profile) => self.check_anonymous_permission(profile, permission),
            None => self.subject.check_permission(permission),
        }
    }

    fn check_permissions(&self, permissions: &[PermissionArg<'_>]) -> SubjectResult<()> {
        match self.profile() {
            Some(profile) => {
                for permission in permissions {
                    self.check_anonymous_permission(profile, *permission)?;
                }
                Ok(())
            }
            None => self.subject.check_permissions(permissions),
        }
    }

    fn has_role(&self, role: &str) -> bool {
        match self.profile() {
            Some(profile) => profile.has_role(role),
            None => self.subject.has_role(role),
        }
    }

    fn has_roles(&self, roles: &[&str]) -> Vec<bool> {
        match self.profile() {
            Some(profile) => roles.iter().map(|role| profile.has_role(role)).collect(),
            None => self.subject.has_roles(roles),
        }
    }

    fn has_all_roles(&self, roles: &[&str]) -> bool {
        match self.profile() {
            Some(profile) => roles.iter().all(|role| profile.has_role(role)),
            None => self.subject.has_all_roles(roles),
        }
    }

    fn check_role(&self, role: &str) -> SubjectResult<()> {
        match self.profile() {
            Some(profile) => Self::check_anonymous_role(profile, role),
            None => self.subject.check_role(role),
        }
    }

    fn check_roles(&self, roles: &[&str]) -> SubjectResult<()> {
        match self.profile() {
            Some(profile) => {
                for role in roles {
                    Self::check_anonymous_role(profile, role)?;
                }
                Ok(())
            }
            None => self.subject.check_roles(roles),
        }
    }

    fn is_authenticated(&self) -> bool {
        !self.is_anonymous() && self.subject.is_authenticated()
    }

    fn is_remembered(&self) -> bool {
        !self.is_anonymous() && self.subject.is_remembered()
    }

    fn session(&mut self, create: bool) -> Option<Session> {
        if self.is_anonymous() {
            self.subject.session(create && self.session_creation_allowed)
        } else {
            self.subject.session(create)
        }
    }

    fn login(&mut self, token: &AuthenticationToken) -> SubjectResult<()> {
        // A failed login leaves the anonymous snapshot in place.
        self.subject.login(token)?;
        if self.is_anonymous() {
            debug!("login replaced anonymous identity");
        }
        self.reset();
        Ok(())
    }

    fn logout(&mut self) {
        self.subject.logout();
        self.reset();
    }

    fn execute(&self, task: Task) -> SubjectResult<()> {
        self.subject.execute(task)
    }

    fn associate_with(&self, task: Task) -> Task {
        self.subject.associate_with(task)
    }

    fn run_as(&mut self, principals: PrincipalCollection) -> SubjectResult<()> {
        self.subject.run_as(principals)
    }

    fn is_run_as(&self) -> bool {
        self.subject.is_run_as()
    }

    fn previous_principals(&self) -> Option<PrincipalCollection> {
        self.subject.previous_principals()
    }

    fn release_run_as(&mut self) -> Option<PrincipalCollection> {
        self.subject.release_run_as()
    }
}
