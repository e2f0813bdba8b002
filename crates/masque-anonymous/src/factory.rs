use crate::{ConfigurationSource, IdentityOverlay};
use masque_authz::PermissionResolver;
use masque_subject::{Subject, SubjectContext, SubjectFactory};
use std::sync::Arc;

/// Wraps every subject built by `inner` in an [`IdentityOverlay`].
pub struct OverlayFactory<F> {
    inner: F,
    source: Arc<dyn ConfigurationSource>,
    resolver: Arc<dyn PermissionResolver>,
}

impl<F: SubjectFactory> OverlayFactory<F> {
    pub fn new(
        inner: F,
        source: Arc<dyn ConfigurationSource>,
        resolver: Arc<dyn PermissionResolver>,
    ) -> Self {
        Self {
            inner,
            source,
            resolver,
        }
    }

    /// Builds an inactive overlay around a fresh subject for `context`.
    pub fn create(&self, context: &SubjectContext) -> IdentityOverlay {
        IdentityOverlay::new(
            self.inner.create_subject(context),
            self.source.clone(),
            self.resolver.clone(),
        )
    }
}

impl<F: SubjectFactory> SubjectFactory for OverlayFactory<F> {
    fn create_subject(&self, context: &SubjectContext) -> Box<dyn Subject> {
        Box::new(self.create(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, AnonymousProfile, LiveConfigurationSource};
    use masque_authz::WildcardPermissionResolver;
    use masque_subject::{DEFAULT_REALM, InMemoryRealm, InMemorySubjectFactory};

    fn factory(source: Arc<LiveConfigurationSource>) -> OverlayFactory<InMemorySubjectFactory> {
        let realm = Arc::new(InMemoryRealm::with_wildcard_permissions(DEFAULT_REALM));
        OverlayFactory::new(
            InMemorySubjectFactory::new(realm),
            source,
            Arc::new(WildcardPermissionResolver::new()),
        )
    }

    fn guest() -> AnonymousProfile {
        AnonymousProfile::builder()
            .enabled(true)
            .principal("anon")
            .role("guest")
            .build()
            .expect("build")
    }

    #[test]
    fn created_overlays_start_inactive() {
        let factory = factory(Arc::new(LiveConfigurationSource::new(guest())));
        let overlay = factory.create(&SubjectContext::new());
        assert!(!overlay.is_anonymous());
        assert!(!overlay.has_role("guest"));
    }

    #[test]
    fn each_overlay_reads_the_source_at_activation() {
        let source = Arc::new(LiveConfigurationSource::disabled());
        let factory = factory(source.clone());

        let mut first = factory.create(&SubjectContext::new());
        assert_eq!(first.activate(), Activation::Disabled);

        source.store(guest());
        let mut second = factory.create(&SubjectContext::new());
        assert_eq!(second.activate(), Activation::Activated);
        assert!(second.has_role("guest"));
        // The earlier overlay picks the change up on its next attempt.
        assert_eq!(first.activate(), Activation::Activated);
    }

    #[test]
    fn boxed_subjects_keep_overlay_behavior() {
        let factory = factory(Arc::new(LiveConfigurationSource::new(guest())));
        let mut subject = factory.create_subject(&SubjectContext::new().with_host("10.1.1.1"));
        // Inactive overlays delegate; the fresh subject has no identity.
        assert!(!subject.has_role("guest"));
        assert!(subject.principal().is_none());
        assert!(subject.session(true).is_some());
    }
}
