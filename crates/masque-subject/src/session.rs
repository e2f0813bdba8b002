use dashmap::DashMap;
use masque_common::ids::SessionId;
use std::sync::Arc;

/// Handle to a server-side session. Clones share the same attribute map.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    host: Option<String>,
    attributes: Arc<DashMap<String, String>>,
}

impl Session {
    pub fn new(host: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            host,
            attributes: Arc::new(DashMap::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.get(key).map(|value| value.clone())
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove_attribute(&self, key: &str) -> Option<String> {
        self.attributes.remove(key).map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn clones_share_attributes() {
        let session = Session::new(Some("127.0.0.1".to_string()));
        let clone = session.clone();
        session.set_attribute("theme", "dark");
        assert_eq!(clone.attribute("theme").as_deref(), Some("dark"));
        assert_eq!(clone.id(), session.id());
        assert_eq!(clone.remove_attribute("theme").as_deref(), Some("dark"));
        assert!(session.attribute("theme").is_none());
        assert_eq!(session.host(), Some("127.0.0.1"));
    }
}
