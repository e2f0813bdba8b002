//! In-memory realm and subject.
//!
//! Accounts live in a `DashMap`; permissions are resolved once when an account
//! is added. Useful for tests, demos and single-process deployments.
use crate::{
    AuthenticationToken, Principal, PrincipalCollection, Session, Subject, SubjectContext,
    SubjectError, SubjectFactory, SubjectResult, Task,
};
use dashmap::DashMap;
use masque_authz::{
    AuthzResult, PermissionArg, PermissionMatcher, PermissionResolver, WildcardPermissionResolver,
};
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_REALM: &str = "memory";

#[derive(Debug, Clone)]
struct Account {
    password: String,
    roles: BTreeSet<String>,
    permissions: PermissionMatcher,
}

pub struct InMemoryRealm {
    name: String,
    resolver: Arc<dyn PermissionResolver>,
    accounts: DashMap<String, Account>,
}

impl InMemoryRealm {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn PermissionResolver>) -> Self {
        Self {
            name: name.into(),
            resolver,
            accounts: DashMap::new(),
        }
    }

    pub fn with_wildcard_permissions(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(WildcardPermissionResolver::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolver(&self) -> Arc<dyn PermissionResolver> {
        self.resolver.clone()
    }

    /// Adds or replaces an account.
    ///
    /// # Errors
    /// - Any permission string the resolver rejects.
    pub fn add_account(
        &self,
        username: &str,
        password: &str,
        roles: &[&str],
        permissions: &[&str],
    ) -> AuthzResult<()> {
        let permissions = PermissionMatcher::from_strings(self.resolver.as_ref(), permissions)?;
        self.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                roles: roles.iter().map(|role| role.to_string()).collect(),
                permissions,
            },
        );
        Ok(())
    }

    pub fn remove_account(&self, username: &str) -> bool {
        self.accounts.remove(username).is_some()
    }

    fn authenticate(&self, token: &AuthenticationToken) -> SubjectResult<PrincipalCollection> {
        let valid = self
            .accounts
            .get(&token.username)
            .is_some_and(|account| account.password == token.password);
        if !valid {
            // Same message for unknown users and bad passwords.
            return Err(SubjectError::Authentication(format!(
                "invalid credentials for account [{}]",
                token.username
            )));
        }
        Ok(PrincipalCollection::single(
            token.username.as_str(),
            self.name.as_str(),
        ))
    }

    fn has_role(&self, principals: &PrincipalCollection, role: &str) -> bool {
        self.accounts
            .get(principals.primary().as_str())
            .is_some_and(|account| account.roles.contains(role))
    }

    fn is_permitted(
        &self,
        principals: &PrincipalCollection,
        permission: PermissionArg<'_>,
    ) -> bool {
        let Some(account) = self.accounts.get(principals.primary().as_str()) else {
            return false;
        };
        permission
            .evaluate(self.resolver.as_ref(), |wanted| account.permissions.allows(wanted))
            .unwrap_or(false)
    }
}

/// Subject backed by an [`InMemoryRealm`].
pub struct InMemorySubject {
    realm: Arc<InMemoryRealm>,
    host: Option<String>,
    principals: Option<PrincipalCollection>,
    authenticated: bool,
    remembered: bool,
    session: Option<Session>,
    // Assumed identities, most recent last.
    run_as_stack: Vec<PrincipalCollection>,
}

impl InMemorySubject {
    pub fn new(realm: Arc<InMemoryRealm>) -> Self {
        Self::from_context(realm, &SubjectContext::default())
    }

    pub fn from_context(realm: Arc<InMemoryRealm>, context: &SubjectContext) -> Self {
        Self {
            realm,
            host: context.host.clone(),
            principals: context.principals.clone(),
            authenticated: context.authenticated && context.principals.is_some(),
            remembered: context.remembered && context.principals.is_some(),
            session: context.session.clone(),
            run_as_stack: Vec::new(),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn effective_principals(&self) -> Option<&PrincipalCollection> {
        self.run_as_stack.last().or(self.principals.as_ref())
    }
}

impl Subject for InMemorySubject {
    fn principal(&self) -> Option<Principal> {
        self.effective_principals()
            .map(|principals| principals.primary().clone())
    }

    fn principals(&self) -> Option<PrincipalCollection> {
        self.effective_principals().cloned()
    }

    fn is_permitted(&self, permission: PermissionArg<'_>) -> bool {
        self.effective_principals()
            .is_some_and(|principals| self.realm.is_permitted(principals, permission))
    }

    fn has_role(&self, role: &str) -> bool {
        self.effective_principals()
            .is_some_and(|principals| self.realm.has_role(principals, role))
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn is_remembered(&self) -> bool {
        self.remembered && !self.authenticated
    }

    fn session(&mut self, create: bool) -> Option<Session> {
        if self.session.is_none() && create {
            let session = Session::new(self.host.clone());
            debug!(session_id = %session.id(), "allocated session");
            self.session = Some(session);
        }
        self.session.clone()
    }

    fn login(&mut self, token: &AuthenticationToken) -> SubjectResult<()> {
        let principals = self.realm.authenticate(token)?;
        debug!(principal = %principals.primary(), realm = self.realm.name(), "login succeeded");
        self.principals = Some(principals);
        self.authenticated = true;
        self.remembered = token.remember_me;
        self.run_as_stack.clear();
        if token.host.is_some() {
            self.host = token.host.clone();
        }
        Ok(())
    }

    fn logout(&mut self) {
        self.principals = None;
        self.authenticated = false;
        self.remembered = false;
        self.session = None;
        self.run_as_stack.clear();
    }

    fn execute(&self, task: Task) -> SubjectResult<()> {
        let task = self.associate_with(task);
        catch_unwind(AssertUnwindSafe(task))
            .map_err(|_| SubjectError::Execution("task panicked".to_string()))
    }

    fn associate_with(&self, task: Task) -> Task {
        let principal = self
            .principal()
            .map(|principal| principal.to_string())
            .unwrap_or_default();
        Box::new(move || {
            let span = tracing::info_span!("subject_task", principal = %principal);
            let _entered = span.enter();
            task()
        })
    }

    fn run_as(&mut self, principals: PrincipalCollection) -> SubjectResult<()> {
        if self.principals.is_none() {
            return Err(SubjectError::IllegalState(
                "run-as requires an established identity".to_string(),
            ));
        }
        self.run_as_stack.push(principals);
        Ok(())
    }

    fn is_run_as(&self) -> bool {
        !self.run_as_stack.is_empty()
    }

    fn previous_principals(&self) -> Option<PrincipalCollection> {
        match self.run_as_stack.len() {
            0 => None,
            1 => self.principals.clone(),
            len => self.run_as_stack.get(len - 2).cloned(),
        }
    }

    fn release_run_as(&mut self) -> Option<PrincipalCollection> {
        self.run_as_stack.pop()
    }
}

/// Builds [`InMemorySubject`]s against a shared realm.
#[derive(Clone)]
pub struct InMemorySubjectFactory {
    realm: Arc<InMemoryRealm>,
}

impl InMemorySubjectFactory {
    pub fn new(realm: Arc<InMemoryRealm>) -> Self {
        Self { realm }
    }
}

impl SubjectFactory for InMemorySubjectFactory {
    fn create_subject(&self, context: &SubjectContext) -> Box<dyn Subject> {
        Box::new(InMemorySubject::from_context(self.realm.clone(), context))
    }
}
