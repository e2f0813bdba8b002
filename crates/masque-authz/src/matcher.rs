use crate::{AuthzResult, Permission, PermissionResolver, SharedPermission};

/// Glob match where `*` matches any run of characters, including none.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let (mut p_idx, mut v_idx) = (0usize, 0usize);
    let (mut star_idx, mut match_idx) = (None, 0usize);
    let pattern_bytes = pattern.as_bytes();
    let value_bytes = value.as_bytes();

    while v_idx < value_bytes.len() {
        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
            star_idx = Some(p_idx);
            match_idx = v_idx;
            p_idx += 1;
            continue;
        }

        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == value_bytes[v_idx] {
            p_idx += 1;
            v_idx += 1;
            continue;
        }

        if let Some(star) = star_idx {
            // Backtrack: let the last star swallow one more byte.
            p_idx = star + 1;
            match_idx += 1;
            v_idx = match_idx;
            continue;
        }

        return false;
    }

    while p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
        p_idx += 1;
    }

    p_idx == pattern_bytes.len()
}

/// Ordered set of granted permissions answering "is this implied?".
#[derive(Debug, Clone, Default)]
pub struct PermissionMatcher {
    permissions: Vec<SharedPermission>,
}

impl PermissionMatcher {
    pub fn new(permissions: Vec<SharedPermission>) -> Self {
        Self { permissions }
    }

    pub fn from_strings<S: AsRef<str>>(
        resolver: &dyn PermissionResolver,
        permissions: &[S],
    ) -> AuthzResult<Self> {
        let mut resolved = Vec::with_capacity(permissions.len());
        for permission in permissions {
            resolved.push(resolver.resolve(permission.as_ref())?);
        }
        Ok(Self::new(resolved))
    }

    /// True iff some granted permission implies `permission`.
    pub fn allows(&self, permission: &dyn Permission) -> bool {
        self.permissions
            .iter()
            .any(|granted| granted.implies(permission))
    }

    pub fn permissions(&self) -> &[SharedPermission] {
        &self.permissions
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }
}

impl FromIterator<SharedPermission> for PermissionMatcher {
    fn from_iter<I: IntoIterator<Item = SharedPermission>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
