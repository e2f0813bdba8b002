//! The subject contract: everything an application asks of "the current caller".
//!
//! # Purpose
//! Defines [`Subject`], the authorization, session, identity and run-as
//! surface that concrete subjects implement and decorators wrap.
//!
//! # Key invariants
//! - Batch checks are pointwise: positional results keep input order, and
//!   `*_all` / `check_*s` stop at the first failure.
//! - `check_*` operations fail with [`SubjectError::Unauthorized`] exactly
//!   when the matching predicate is false.
//!
//! # Common pitfalls
//! - `session(false)` never allocates; callers that need a session must ask
//!   for `create = true`.
use crate::{
    AuthenticationToken, Principal, PrincipalCollection, Session, SubjectError, SubjectResult,
};
use masque_authz::PermissionArg;

/// Unit of work that can be bound to a subject and run later.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Subject: Send {
    fn principal(&self) -> Option<Principal>;

    fn principals(&self) -> Option<PrincipalCollection>;

    fn is_permitted(&self, permission: PermissionArg<'_>) -> bool;

    fn is_permitted_each(&self, permissions: &[PermissionArg<'_>]) -> Vec<bool> {
        permissions
            .iter()
            .map(|permission| self.is_permitted(*permission))
            .collect()
    }

    fn is_permitted_all(&self, permissions: &[PermissionArg<'_>]) -> bool {
        permissions
            .iter()
            .all(|permission| self.is_permitted(*permission))
    }

    fn check_permission(&self, permission: PermissionArg<'_>) -> SubjectResult<()> {
        if self.is_permitted(permission) {
            Ok(())
        } else {
            Err(SubjectError::Unauthorized(format!(
                "subject is not permitted [{permission}]"
            )))
        }
    }

    fn check_permissions(&self, permissions: &[PermissionArg<'_>]) -> SubjectResult<()> {
        for permission in permissions {
            self.check_permission(*permission)?;
        }
        Ok(())
    }

    fn has_role(&self, role: &str) -> bool;

    fn has_roles(&self, roles: &[&str]) -> Vec<bool> {
        roles.iter().map(|role| self.has_role(role)).collect()
    }

    fn has_all_roles(&self, roles: &[&str]) -> bool {
        roles.iter().all(|role| self.has_role(role))
    }

    fn check_role(&self, role: &str) -> SubjectResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(SubjectError::Unauthorized(format!(
                "missing required role [{role}]"
            )))
        }
    }

    fn check_roles(&self, roles: &[&str]) -> SubjectResult<()> {
        for role in roles {
            self.check_role(role)?;
        }
        Ok(())
    }

    fn is_authenticated(&self) -> bool;

    fn is_remembered(&self) -> bool;

    /// Returns the current session, allocating one only when `create` is set.
    fn session(&mut self, create: bool) -> Option<Session>;

    fn session_or_create(&mut self) -> Option<Session> {
        self.session(true)
    }

    fn login(&mut self, token: &AuthenticationToken) -> SubjectResult<()>;

    fn logout(&mut self);

    /// Runs `task` with this subject bound as the current caller.
    fn execute(&self, task: Task) -> SubjectResult<()>;

    /// Wraps `task` so that it runs with this subject bound when invoked.
    fn associate_with(&self, task: Task) -> Task;

    fn run_as(&mut self, principals: PrincipalCollection) -> SubjectResult<()>;

    fn is_run_as(&self) -> bool;

    fn previous_principals(&self) -> Option<PrincipalCollection>;

    fn release_run_as(&mut self) -> Option<PrincipalCollection>;
}

/// Request-scoped inputs used when building a subject.
#[derive(Debug, Clone, Default)]
pub struct SubjectContext {
    pub host: Option<String>,
    pub session: Option<Session>,
    pub principals: Option<PrincipalCollection>,
    pub authenticated: bool,
    pub remembered: bool,
}

impl SubjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Seeds an identity restored out-of-band (e.g. a remember-me cookie).
    pub fn remembered(mut self, principals: PrincipalCollection) -> Self {
        self.principals = Some(principals);
        self.remembered = true;
        self
    }

    pub fn authenticated(mut self, principals: PrincipalCollection) -> Self {
        self.principals = Some(principals);
        self.authenticated = true;
        self
    }
}

/// Builds one subject per request context.
pub trait SubjectFactory: Send + Sync {
    fn create_subject(&self, context: &SubjectContext) -> Box<dyn Subject>;
}

impl<S: Subject + ?Sized> Subject for Box<S> {
    fn principal(&self) -> Option<Principal> {
        (**self).principal()
    }

    fn principals(&self) -> Option<PrincipalCollection> {
        (**self).principals()
    }

    fn is_permitted(&self, permission: PermissionArg<'_>) -> bool {
        (**self).is_permitted(permission)
    }

    fn is_permitted_each(&self, permissions: &[PermissionArg<'_>]) -> Vec<bool> {
        (**self).is_permitted_each(permissions)
    }

    fn is_permitted_all(&self, permissions: &[PermissionArg<'_>]) -> bool {
        (**self).is_permitted_all(permissions)
    }

    fn check_permission(&self, permission: PermissionArg<'_>) -> SubjectResult<()> {
        (**self).check_permission(permission)
    }

    fn check_permissions(&self, permissions: &[PermissionArg<'_>]) -> SubjectResult<()> {
        (**self).check_permissions(permissions)
    }

    fn has_role(&self, role: &str) -> bool {
        (**self).has_role(role)
    }

    fn has_roles(&self, roles: &[&str]) -> Vec<bool> {
        (**self).has_roles(roles)
    }

    fn has_all_roles(&self, roles: &[&str]) -> bool {
        (**self).has_all_roles(roles)
    }

    fn check_role(&self, role: &str) -> SubjectResult<()> {
        (**self).check_role(role)
    }

    fn check_roles(&self, roles: &[&str]) -> SubjectResult<()> {
        (**self).check_roles(roles)
    }

    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn is_remembered(&self) -> bool {
        (**self).is_remembered()
    }

    fn session(&mut self, create: bool) -> Option<Session> {
        (**self).session(create)
    }

    fn session_or_create(&mut self) -> Option<Session> {
        (**self).session_or_create()
    }

    fn login(&mut self, token: &AuthenticationToken) -> SubjectResult<()> {
        (**self).login(token)
    }

    fn logout(&mut self) {
        (**self).logout()
    }

    fn execute(&self, task: Task) -> SubjectResult<()> {
        (**self).execute(task)
    }

    fn associate_with(&self, task: Task) -> Task {
        (**self).associate_with(task)
    }

    fn run_as(&mut self, principals: PrincipalCollection) -> SubjectResult<()> {
        (**self).run_as(principals)
    }

    fn is_run_as(&self) -> bool {
        (**self).is_run_as()
    }

    fn previous_principals(&self) -> Option<PrincipalCollection> {
        (**self).previous_principals()
    }

    fn release_run_as(&mut self) -> Option<PrincipalCollection> {
        (**self).release_run_as()
    }
}
