use crate::{AuthzResult, SharedPermission, WildcardPermission};

/// Turns permission strings into permission objects.
///
/// Implementations must be pure: the same input always yields an equivalent
/// permission and resolving has no side effects.
pub trait PermissionResolver: Send + Sync {
    fn resolve(&self, permission: &str) -> AuthzResult<SharedPermission>;
}

impl<F> PermissionResolver for F
where
    F: Fn(&str) -> AuthzResult<SharedPermission> + Send + Sync,
{
    fn resolve(&self, permission: &str) -> AuthzResult<SharedPermission> {
        self(permission)
    }
}

/// Resolves strings into [`WildcardPermission`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardPermissionResolver {
    case_sensitive: bool,
}

impl WildcardPermissionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

impl PermissionResolver for WildcardPermissionResolver {
    fn resolve(&self, permission: &str) -> AuthzResult<SharedPermission> {
        WildcardPermission::parse_with_case(permission, self.case_sensitive)
            .map(WildcardPermission::shared)
    }
}
