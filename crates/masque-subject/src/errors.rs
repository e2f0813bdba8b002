use masque_authz::AuthzError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubjectError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("illegal subject state: {0}")]
    IllegalState(String),
    #[error("task execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    Authz(#[from] AuthzError),
}

impl SubjectError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SubjectError::Unauthorized(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, SubjectError::Authentication(_))
    }
}

pub type SubjectResult<T> = Result<T, SubjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            SubjectError::Unauthorized("missing role".to_string()),
            SubjectError::Authentication("bad password".to_string()),
            SubjectError::IllegalState("no identity".to_string()),
            SubjectError::Execution("panicked".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn kind_predicates() {
        assert!(SubjectError::Unauthorized(String::new()).is_unauthorized());
        assert!(SubjectError::Authentication(String::new()).is_authentication());
        assert!(!SubjectError::IllegalState(String::new()).is_unauthorized());
    }
}
