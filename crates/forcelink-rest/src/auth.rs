//! Session establishment: a pre-issued access token or the OAuth 2.0
//! username-password grant.

use forcelink_core::{Credentials, ForceError, Result};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const TOKEN_PATH: &str = "/services/oauth2/token";

/// An authenticated session against one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub instance_url: Url,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: String,
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim_end_matches('/')).map_err(|e| {
        ForceError::ConnectionUnavailable(format!("invalid instance URL '{}': {}", raw, e))
    })
}

/// Turn a token endpoint response body into a session.
pub(crate) fn parse_token_response(status: u16, body: &str) -> Result<Session> {
    if !(200..300).contains(&status) {
        let reason = serde_json::from_str::<TokenError>(body)
            .map(|e| format!("{}: {}", e.error, e.error_description))
            .unwrap_or_else(|_| body.to_string());
        return Err(ForceError::ConnectionUnavailable(format!(
            "login rejected ({}): {}",
            status, reason
        )));
    }

    let token: TokenResponse = serde_json::from_str(body).map_err(|e| {
        ForceError::ConnectionUnavailable(format!("unexpected token response: {}", e))
    })?;
    Ok(Session {
        instance_url: parse_base_url(&token.instance_url)?,
        access_token: token.access_token,
    })
}

/// Establish a session at `url` with the given credentials.
///
/// With an access token, `url` is the instance itself and no request is
/// made. With the password grant, `url` is the login host and the instance
/// comes back in the token response.
pub async fn login(http: &reqwest::Client, url: &str, credentials: &Credentials) -> Result<Session> {
    match credentials {
        Credentials::AccessToken(token) => {
            debug!("Using pre-issued access token for {}", url);
            Ok(Session {
                instance_url: parse_base_url(url)?,
                access_token: token.clone(),
            })
        }
        Credentials::Password {
            username,
            password,
            client_id,
            client_secret,
        } => {
            let endpoint = parse_base_url(url)?.join(TOKEN_PATH).map_err(|e| {
                ForceError::ConnectionUnavailable(format!("invalid login URL '{}': {}", url, e))
            })?;

            let mut form = vec![
                ("grant_type", "password"),
                ("client_id", client_id.as_str()),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ];
            if let Some(secret) = client_secret {
                form.push(("client_secret", secret.as_str()));
            }

            info!("Logging in as {} at {}", username, endpoint);
            let response = http
                .post(endpoint)
                .form(&form)
                .send()
                .await
                .map_err(|e| ForceError::ConnectionUnavailable(format!("login failed: {}", e)))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ForceError::ConnectionUnavailable(format!("login failed: {}", e)))?;

            let session = parse_token_response(status, &body)?;
            info!("Logged in to {}", session.instance_url);
            Ok(session)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let body = r#"{
            "access_token": "00Dxx!AQ0AQ",
            "instance_url": "https://example.my.salesforce.com",
            "id": "https://login.salesforce.com/id/00Dxx/005xx",
            "token_type": "Bearer"
        }"#;
        let session = parse_token_response(200, body).unwrap();
        assert_eq!(session.access_token, "00Dxx!AQ0AQ");
        assert_eq!(
            session.instance_url.as_str(),
            "https://example.my.salesforce.com/"
        );
    }

    #[test]
    fn test_rejected_login() {
        let body = r#"{"error":"invalid_grant","error_description":"authentication failure"}"#;
        let err = parse_token_response(400, body).unwrap_err();
        assert!(matches!(err, ForceError::ConnectionUnavailable(_)));
        assert!(err.to_string().contains("invalid_grant: authentication failure"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ForceError::ConnectionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_access_token_login_makes_no_request() {
        let http = reqwest::Client::new();
        let session = login(
            &http,
            "https://example.my.salesforce.com/",
            &Credentials::AccessToken("tok".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.instance_url.host_str(), Some("example.my.salesforce.com"));
    }
}
