use crate::{AnonymousProfile, AnonymousSettings, ProfileError};
use arc_swap::ArcSwap;
use masque_authz::PermissionResolver;
use std::sync::Arc;

/// Supplies the anonymous profile in force right now.
///
/// Called once per activation attempt; implementations may return a
/// disabled profile at any time.
pub trait ConfigurationSource: Send + Sync {
    fn configuration(&self) -> Arc<AnonymousProfile>;
}

impl<F> ConfigurationSource for F
where
    F: Fn() -> Arc<AnonymousProfile> + Send + Sync,
{
    fn configuration(&self) -> Arc<AnonymousProfile> {
        self()
    }
}

/// Configuration source whose profile can be swapped while requests run.
pub struct LiveConfigurationSource {
    current: ArcSwap<AnonymousProfile>,
}

impl LiveConfigurationSource {
    pub fn new(profile: AnonymousProfile) -> Self {
        Self {
            current: ArcSwap::from_pointee(profile),
        }
    }

    pub fn disabled() -> Self {
        Self::new(AnonymousProfile::disabled())
    }

    pub fn from_settings(
        settings: &AnonymousSettings,
        resolver: &dyn PermissionResolver,
    ) -> Result<Self, ProfileError> {
        Ok(Self::new(settings.to_profile(resolver)?))
    }

    /// Replaces the profile; overlays pick it up on their next activation.
    pub fn store(&self, profile: AnonymousProfile) {
        self.current.store(Arc::new(profile));
    }

    /// Resolves `settings` and swaps the result in. On error the previous
    /// profile stays in force.
    pub fn apply(
        &self,
        settings: &AnonymousSettings,
        resolver: &dyn PermissionResolver,
    ) -> Result<(), ProfileError> {
        let profile = settings.to_profile(resolver)?;
        self.store(profile);
        Ok(())
    }
}

impl Default for LiveConfigurationSource {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ConfigurationSource for LiveConfigurationSource {
    fn configuration(&self) -> Arc<AnonymousProfile> {
        self.current.load_full()
    }
}
