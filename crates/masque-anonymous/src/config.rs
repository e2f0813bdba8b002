use crate::{AnonymousProfile, ProfileError};
use anyhow::{Context, Result, bail};
use masque_authz::PermissionResolver;
use masque_common::parse_flag;
use serde::Deserialize;
use std::fs;

pub const DEFAULT_ANONYMOUS_PRINCIPAL: &str = "anonymous";

// Raw anonymous-access settings sourced from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousSettings {
    // Master switch for anonymous access.
    pub enabled: bool,
    // If false, anonymous subjects never allocate server-side sessions.
    pub session_creation_enabled: bool,
    // Identity reported for anonymous subjects.
    pub principal: String,
    // Optional realm label for the anonymous principal.
    pub realm: Option<String>,
    // Role names granted anonymously.
    pub roles: Vec<String>,
    // Permission strings granted anonymously, resolved when building a profile.
    pub permissions: Vec<String>,
}

impl Default for AnonymousSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            session_creation_enabled: true,
            principal: DEFAULT_ANONYMOUS_PRINCIPAL.to_string(),
            realm: None,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnonymousSettingsOverride {
    enabled: Option<bool>,
    session_creation_enabled: Option<bool>,
    principal: Option<String>,
    realm: Option<String>,
    roles: Option<Vec<String>>,
    permissions: Option<Vec<String>>,
}

impl AnonymousSettings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let enabled = std::env::var("MASQUE_ANONYMOUS_ENABLED")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(defaults.enabled);
        let session_creation_enabled = std::env::var("MASQUE_ANONYMOUS_SESSION_CREATION")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(defaults.session_creation_enabled);
        let principal = std::env::var("MASQUE_ANONYMOUS_PRINCIPAL")
            .ok()
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.principal);
        let realm = std::env::var("MASQUE_ANONYMOUS_REALM")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let roles = std::env::var("MASQUE_ANONYMOUS_ROLES")
            .map(|value| split_list(&value, ','))
            .unwrap_or_default();
        // Permissions contain commas, so the list separator is ';'.
        let permissions = std::env::var("MASQUE_ANONYMOUS_PERMISSIONS")
            .map(|value| split_list(&value, ';'))
            .unwrap_or_default();
        let settings = Self {
            enabled,
            session_creation_enabled,
            principal,
            realm,
            roles,
            permissions,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Environment settings, overridden by a YAML file when one is given.
    ///
    /// The file path comes from `path` or, failing that, `MASQUE_ANONYMOUS_CONFIG`.
    pub fn from_env_or_yaml(path: Option<&str>) -> Result<Self> {
        let mut settings = Self::from_env()?;
        let path = path
            .map(str::to_string)
            .or_else(|| std::env::var("MASQUE_ANONYMOUS_CONFIG").ok());
        if let Some(path) = path {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read anonymous config: {path}"))?;
            let override_cfg: AnonymousSettingsOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse anonymous config yaml")?;
            if let Some(value) = override_cfg.enabled {
                settings.enabled = value;
            }
            if let Some(value) = override_cfg.session_creation_enabled {
                settings.session_creation_enabled = value;
            }
            if let Some(value) = override_cfg.principal {
                settings.principal = value.trim().to_string();
            }
            if let Some(value) = override_cfg.realm
                && !value.trim().is_empty()
            {
                settings.realm = Some(value.trim().to_string());
            }
            if let Some(value) = override_cfg.roles {
                settings.roles = value;
            }
            if let Some(value) = override_cfg.permissions {
                settings.permissions = value;
            }
            settings.validate()?;
        }
        Ok(settings)
    }

    /// Resolves the settings into an immutable profile.
    pub fn to_profile(
        &self,
        resolver: &dyn PermissionResolver,
    ) -> std::result::Result<AnonymousProfile, ProfileError> {
        if !self.enabled {
            return Ok(AnonymousProfile::disabled());
        }
        let mut builder = AnonymousProfile::builder()
            .enabled(true)
            .session_creation_allowed(self.session_creation_enabled)
            .principal(self.principal.as_str())
            .roles(self.roles.iter().cloned())
            .resolve_permissions(resolver, &self.permissions)?;
        if let Some(realm) = &self.realm {
            builder = builder.originating_realm(realm.as_str());
        }
        builder.build()
    }

    fn validate(&self) -> Result<()> {
        if self.enabled && self.principal.trim().is_empty() {
            bail!("anonymous principal must not be empty when anonymous access is enabled");
        }
        Ok(())
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use masque_authz::{WildcardPermission, WildcardPermissionResolver};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VARS: [&str; 7] = [
        "MASQUE_ANONYMOUS_ENABLED",
        "MASQUE_ANONYMOUS_SESSION_CREATION",
        "MASQUE_ANONYMOUS_PRINCIPAL",
        "MASQUE_ANONYMOUS_REALM",
        "MASQUE_ANONYMOUS_ROLES",
        "MASQUE_ANONYMOUS_PERMISSIONS",
        "MASQUE_ANONYMOUS_CONFIG",
    ];

    struct EnvGuard;

    impl EnvGuard {
        fn clean() -> Self {
            clear_vars();
            EnvGuard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            clear_vars();
        }
    }

    fn clear_vars() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    #[serial_test::serial]
    fn defaults_when_env_is_empty() {
        let _guard = EnvGuard::clean();
        let settings = AnonymousSettings::from_env().expect("settings");
        assert_eq!(settings, AnonymousSettings::default());
        assert!(!settings.enabled);
        assert!(settings.session_creation_enabled);
    }

    #[test]
    #[serial_test::serial]
    fn env_values_are_parsed() {
        let _guard = EnvGuard::clean();
        unsafe {
            std::env::set_var("MASQUE_ANONYMOUS_ENABLED", "yes");
            std::env::set_var("MASQUE_ANONYMOUS_SESSION_CREATION", "0");
            std::env::set_var("MASQUE_ANONYMOUS_PRINCIPAL", " guest ");
            std::env::set_var("MASQUE_ANONYMOUS_REALM", "public");
            std::env::set_var("MASQUE_ANONYMOUS_ROLES", "guest, viewer,");
            std::env::set_var("MASQUE_ANONYMOUS_PERMISSIONS", "repo:read,browse;docs:*");
        }
        let settings = AnonymousSettings::from_env().expect("settings");
        assert!(settings.enabled);
        assert!(!settings.session_creation_enabled);
        assert_eq!(settings.principal, "guest");
        assert_eq!(settings.realm.as_deref(), Some("public"));
        assert_eq!(settings.roles, vec!["guest", "viewer"]);
        assert_eq!(settings.permissions, vec!["repo:read,browse", "docs:*"]);
    }

    #[test]
    #[serial_test::serial]
    fn enabled_with_blank_principal_is_rejected() {
        let _guard = EnvGuard::clean();
        unsafe {
            std::env::set_var("MASQUE_ANONYMOUS_ENABLED", "true");
            std::env::set_var("MASQUE_ANONYMOUS_PRINCIPAL", "  ");
        }
        assert!(AnonymousSettings::from_env().is_err());
    }

    #[test]
    #[serial_test::serial]
    fn yaml_overrides_env() {
        let _guard = EnvGuard::clean();
        unsafe {
            std::env::set_var("MASQUE_ANONYMOUS_PRINCIPAL", "from-env");
            std::env::set_var("MASQUE_ANONYMOUS_ROLES", "env-role");
        }
        let file = yaml_file(
            r#"
enabled: true
session_creation_enabled: false
realm: public
permissions:
  - "read:*"
  - "repo:browse"
"#,
        );
        let path = file.path().to_str().expect("path");
        let settings = AnonymousSettings::from_env_or_yaml(Some(path)).expect("settings");
        assert!(settings.enabled);
        assert!(!settings.session_creation_enabled);
        assert_eq!(settings.principal, "from-env");
        assert_eq!(settings.realm.as_deref(), Some("public"));
        assert_eq!(settings.roles, vec!["env-role"]);
        assert_eq!(settings.permissions, vec!["read:*", "repo:browse"]);
    }

    #[test]
    #[serial_test::serial]
    fn yaml_path_falls_back_to_env_var() {
        let _guard = EnvGuard::clean();
        let file = yaml_file("enabled: true\nroles: [guest]\n");
        unsafe {
            std::env::set_var(
                "MASQUE_ANONYMOUS_CONFIG",
                file.path().to_str().expect("path"),
            );
        }
        let settings = AnonymousSettings::from_env_or_yaml(None).expect("settings");
        assert!(settings.enabled);
        assert_eq!(settings.roles, vec!["guest"]);
    }

    #[test]
    #[serial_test::serial]
    fn invalid_yaml_returns_error() {
        let _guard = EnvGuard::clean();
        let file = yaml_file("roles: [unterminated\n");
        let path = file.path().to_str().expect("path");
        assert!(AnonymousSettings::from_env_or_yaml(Some(path)).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn missing_yaml_file_returns_error() {
        let _guard = EnvGuard::clean();
        let err = AnonymousSettings::from_env_or_yaml(Some("/nonexistent/anonymous.yaml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("read anonymous config"));
    }

    #[test]
    fn to_profile_resolves_permissions() {
        let settings = AnonymousSettings {
            enabled: true,
            session_creation_enabled: false,
            principal: "anon".to_string(),
            realm: None,
            roles: vec!["guest".to_string()],
            permissions: vec!["read:*".to_string()],
        };
        let profile = settings
            .to_profile(&WildcardPermissionResolver::new())
            .expect("profile");
        assert!(profile.is_enabled());
        assert!(!profile.is_session_creation_allowed());
        assert!(profile.has_role("guest"));
        let wanted = WildcardPermission::parse("read:doc1").expect("parse");
        assert!(profile.implies(&wanted));
    }

    #[test]
    fn to_profile_for_disabled_settings_is_empty() {
        let settings = AnonymousSettings {
            roles: vec!["guest".to_string()],
            permissions: vec!["not::valid".to_string()],
            ..AnonymousSettings::default()
        };
        let profile = settings
            .to_profile(&WildcardPermissionResolver::new())
            .expect("disabled profile skips resolution");
        assert!(!profile.is_enabled());
        assert!(profile.roles().is_empty());
    }
}
