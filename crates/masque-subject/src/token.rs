use std::fmt;

/// Username/password credentials submitted to [`crate::Subject::login`].
#[derive(Clone)]
pub struct AuthenticationToken {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
    pub host: Option<String>,
}

impl AuthenticationToken {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: false,
            host: None,
        }
    }

    pub fn remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

impl fmt::Debug for AuthenticationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationToken")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .field("host", &self.host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::AuthenticationToken;

    #[test]
    fn debug_redacts_password() {
        let token = AuthenticationToken::new("alice", "hunter2").remember_me(true);
        let rendered = format!("{token:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
