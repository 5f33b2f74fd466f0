//! Connection configuration from environment variables.

use crate::error::{ForceError, Result};
use crate::naming::NamingConvention;

pub const DEFAULT_API_VERSION: &str = "58.0";

/// How the remote client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A session or OAuth access token obtained elsewhere.
    AccessToken(String),
    /// OAuth 2.0 username-password flow.
    Password {
        username: String,
        /// Password with the security token appended.
        password: String,
        client_id: String,
        client_secret: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Instance URL (token auth) or login URL (password auth).
    pub url: Option<String>,
    pub access_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_version: String,
    /// Extra object types exposed as tables, e.g. `Lead` or `Invoice__c`.
    pub objects: Vec<String>,
    pub naming_convention: NamingConvention,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ConnectionConfig {
    pub fn from_env() -> Result<Self> {
        let naming_convention = match var("FORCELINK_NAMING_CONVENTION") {
            Some(v) => v.parse()?,
            None => NamingConvention::default(),
        };
        Ok(Self {
            url: var("FORCELINK_URL"),
            access_token: var("FORCELINK_ACCESS_TOKEN"),
            username: var("FORCELINK_USERNAME"),
            password: var("FORCELINK_PASSWORD"),
            security_token: var("FORCELINK_SECURITY_TOKEN"),
            client_id: var("FORCELINK_CLIENT_ID"),
            client_secret: var("FORCELINK_CLIENT_SECRET"),
            api_version: var("FORCELINK_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            objects: var("FORCELINK_OBJECTS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            naming_convention,
        })
    }

    /// Pick the credentials to connect with.
    ///
    /// Fails with `ConnectionUnavailable` when neither an access token nor a
    /// complete username/password/client id set is configured.
    pub fn credentials(&self) -> Result<Credentials> {
        if self.url.is_none() {
            return Err(ForceError::ConnectionUnavailable(
                "FORCELINK_URL is not set".to_string(),
            ));
        }
        if let Some(token) = &self.access_token {
            return Ok(Credentials::AccessToken(token.clone()));
        }
        match (&self.username, &self.password, &self.client_id) {
            (Some(username), Some(password), Some(client_id)) => Ok(Credentials::Password {
                username: username.clone(),
                password: format!(
                    "{}{}",
                    password,
                    self.security_token.as_deref().unwrap_or("")
                ),
                client_id: client_id.clone(),
                client_secret: self.client_secret.clone(),
            }),
            _ => Err(ForceError::ConnectionUnavailable(
                "set FORCELINK_ACCESS_TOKEN, or FORCELINK_USERNAME, FORCELINK_PASSWORD and FORCELINK_CLIENT_ID"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid races.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "FORCELINK_URL",
            "FORCELINK_ACCESS_TOKEN",
            "FORCELINK_USERNAME",
            "FORCELINK_PASSWORD",
            "FORCELINK_SECURITY_TOKEN",
            "FORCELINK_CLIENT_ID",
            "FORCELINK_CLIENT_SECRET",
            "FORCELINK_API_VERSION",
            "FORCELINK_OBJECTS",
            "FORCELINK_NAMING_CONVENTION",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn from_env_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = ConnectionConfig::from_env().unwrap();
        assert_eq!(config.url, None);
        assert_eq!(config.api_version, "58.0");
        assert!(config.objects.is_empty());
        assert_eq!(config.naming_convention, NamingConvention::SnakeCase);

        clear_env();
    }

    #[test]
    fn from_env_with_all_vars() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("FORCELINK_URL", "https://example.my.salesforce.com");
        std::env::set_var("FORCELINK_ACCESS_TOKEN", "00Dxx!token");
        std::env::set_var("FORCELINK_API_VERSION", "60.0");
        std::env::set_var("FORCELINK_OBJECTS", "Lead, Invoice__c ,");
        std::env::set_var("FORCELINK_NAMING_CONVENTION", "api_native");

        let config = ConnectionConfig::from_env().unwrap();
        assert_eq!(
            config.url.as_deref(),
            Some("https://example.my.salesforce.com")
        );
        assert_eq!(config.api_version, "60.0");
        assert_eq!(config.objects, vec!["Lead", "Invoice__c"]);
        assert_eq!(config.naming_convention, NamingConvention::ApiNative);
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::AccessToken("00Dxx!token".to_string())
        );

        clear_env();
    }

    #[test]
    fn from_env_invalid_naming_convention() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("FORCELINK_NAMING_CONVENTION", "kebab");
        let result = ConnectionConfig::from_env();
        assert!(matches!(result, Err(ForceError::Config(_))));

        clear_env();
    }

    #[test]
    fn credentials_password_flow_appends_security_token() {
        let config = ConnectionConfig {
            url: Some("https://login.salesforce.com".to_string()),
            username: Some("ops@example.com".to_string()),
            password: Some("hunter2".to_string()),
            security_token: Some("XYZ".to_string()),
            client_id: Some("3MVG9".to_string()),
            ..Default::default()
        };
        match config.credentials().unwrap() {
            Credentials::Password {
                username, password, ..
            } => {
                assert_eq!(username, "ops@example.com");
                assert_eq!(password, "hunter2XYZ");
            }
            other => panic!("Expected password credentials, got {:?}", other),
        }
    }

    #[test]
    fn credentials_missing_is_connection_unavailable() {
        let config = ConnectionConfig {
            url: Some("https://login.salesforce.com".to_string()),
            username: Some("ops@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.credentials(),
            Err(ForceError::ConnectionUnavailable(_))
        ));
        assert!(matches!(
            ConnectionConfig::default().credentials(),
            Err(ForceError::ConnectionUnavailable(_))
        ));
    }
}
