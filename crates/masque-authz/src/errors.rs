use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid permission {permission:?}: {reason}")]
    InvalidPermission {
        permission: String,
        reason: &'static str,
    },
}

impl AuthzError {
    pub(crate) fn invalid(permission: &str, reason: &'static str) -> Self {
        AuthzError::InvalidPermission {
            permission: permission.to_string(),
            reason,
        }
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_permission_and_reason() {
        let rendered = AuthzError::invalid("a::b", "empty part").to_string();
        assert_eq!(rendered, "invalid permission \"a::b\": empty part");
    }
}
