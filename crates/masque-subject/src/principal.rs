//! Principal identity values and realm-tagged collections.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identity value, e.g. a user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Principal {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmPrincipal {
    pub principal: Principal,
    pub realm: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("principal collection must contain at least one principal")]
pub struct EmptyPrincipalCollection;

/// Ordered principals, each tagged with the realm that vouched for it.
///
/// The first entry is the primary principal. A collection is never empty;
/// deserialization rejects an empty entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RealmPrincipal>", into = "Vec<RealmPrincipal>")]
pub struct PrincipalCollection {
    entries: Vec<RealmPrincipal>,
}

impl PrincipalCollection {
    pub fn single(principal: impl Into<Principal>, realm: impl Into<String>) -> Self {
        Self {
            entries: vec![RealmPrincipal {
                principal: principal.into(),
                realm: realm.into(),
            }],
        }
    }

    pub fn add(&mut self, principal: impl Into<Principal>, realm: impl Into<String>) {
        self.entries.push(RealmPrincipal {
            principal: principal.into(),
            realm: realm.into(),
        });
    }

    pub fn primary(&self) -> &Principal {
        // Constructors guarantee at least one entry.
        &self.entries[0].principal
    }

    pub fn from_realm(&self, realm: &str) -> Vec<&Principal> {
        self.entries
            .iter()
            .filter(|entry| entry.realm == realm)
            .map(|entry| &entry.principal)
            .collect()
    }

    pub fn realm_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.realm.as_str()) {
                names.push(entry.realm.as_str());
            }
        }
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &RealmPrincipal> {
        self.entries.iter()
    }
}

impl TryFrom<Vec<RealmPrincipal>> for PrincipalCollection {
    type Error = EmptyPrincipalCollection;

    fn try_from(entries: Vec<RealmPrincipal>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            return Err(EmptyPrincipalCollection);
        }
        Ok(Self { entries })
    }
}

impl From<PrincipalCollection> for Vec<RealmPrincipal> {
    fn from(collection: PrincipalCollection) -> Self {
        collection.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_first_entry() {
        let mut principals = PrincipalCollection::single("alice", "ldap");
        principals.add("alice@example.com", "oidc");
        assert_eq!(principals.primary().as_str(), "alice");
        assert_eq!(principals.iter().count(), 2);
    }

    #[test]
    fn realm_queries() {
        let mut principals = PrincipalCollection::single("alice", "ldap");
        principals.add("a-123", "ldap");
        principals.add("alice@example.com", "oidc");
        assert_eq!(principals.realm_names(), vec!["ldap", "oidc"]);
        assert_eq!(
            principals.from_realm("ldap"),
            vec![&Principal::new("alice"), &Principal::new("a-123")]
        );
        assert!(principals.from_realm("local").is_empty());
    }

    #[test]
    fn empty_entry_list_is_rejected() {
        assert_eq!(
            PrincipalCollection::try_from(Vec::new()),
            Err(EmptyPrincipalCollection)
        );
        let err = serde_yaml::from_str::<PrincipalCollection>("[]\n").expect_err("empty");
        assert!(err.to_string().contains("at least one principal"));
    }

    #[test]
    fn deserialized_collection_has_primary() {
        let yaml = "- principal: alice\n  realm: ldap\n- principal: a-123\n  realm: oidc\n";
        let principals: PrincipalCollection = serde_yaml::from_str(yaml).expect("yaml");
        assert_eq!(principals.primary().as_str(), "alice");
        assert_eq!(principals.realm_names(), vec!["ldap", "oidc"]);

        let rendered = serde_yaml::to_string(&principals).expect("yaml");
        let back: PrincipalCollection = serde_yaml::from_str(&rendered).expect("yaml");
        assert_eq!(back, principals);
    }
}
