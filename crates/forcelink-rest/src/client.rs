//! REST implementation of the remote client boundary.

use async_trait::async_trait;
use forcelink_core::{
    ConnectionConfig, DescribedField, ForceError, QueryPage, Record, RemoteClient, Result,
};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{login, Session};

/// Continuation handles returned by the query endpoint are paths under this prefix.
const DATA_PREFIX: &str = "/services/data/";

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    fields: Vec<DescribedField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    message: String,
    #[serde(default)]
    error_code: String,
}

/// Summarize an error body: the API answers with a list of `{message, errorCode}`.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Vec<ApiError>>(body) {
        Ok(errors) if !errors.is_empty() => {
            let joined = errors
                .iter()
                .map(|e| {
                    if e.error_code.is_empty() {
                        e.message.clone()
                    } else {
                        format!("{}: {}", e.error_code, e.message)
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
            format!("{} ({})", joined, status)
        }
        _ => format!("{} ({})", body.trim(), status),
    }
}

fn remote_error(status: StatusCode, body: &str) -> ForceError {
    let message = error_message(status, body);
    if status == StatusCode::UNAUTHORIZED {
        ForceError::ConnectionUnavailable(message)
    } else {
        ForceError::RemoteQuery(message)
    }
}

fn transport_error(e: reqwest::Error) -> ForceError {
    if e.is_connect() || e.is_timeout() {
        ForceError::ConnectionUnavailable(e.to_string())
    } else {
        ForceError::RemoteQuery(e.to_string())
    }
}

/// Client for the REST data API of one instance.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    session: Session,
    api_version: String,
}

impl RestClient {
    pub fn new(session: Session, api_version: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            session,
            api_version: api_version.to_string(),
        }
    }

    /// Log in with the configured credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        let url = config.url.as_deref().unwrap_or_default();
        let http = reqwest::Client::new();
        let session = login(&http, url, &credentials).await?;
        Ok(Self {
            http,
            session,
            api_version: config.api_version.clone(),
        })
    }

    pub fn instance_url(&self) -> &Url {
        &self.session.instance_url
    }

    /// `{instance}/services/data/v{version}/{segments...}` with each segment escaped.
    fn data_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.session.instance_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ForceError::ConnectionUnavailable(format!(
                    "instance URL '{}' cannot carry a path",
                    self.session.instance_url
                ))
            })?;
            path.clear()
                .extend(["services", "data"])
                .push(&format!("v{}", self.api_version))
                .extend(segments);
        }
        Ok(url)
    }

    /// URL for a query string or a continuation handle from a previous page.
    pub(crate) fn query_url(&self, query: &str) -> Result<Url> {
        if query.starts_with(DATA_PREFIX) {
            return self.session.instance_url.join(query).map_err(|e| {
                ForceError::RemoteQuery(format!("invalid continuation handle '{}': {}", query, e))
            });
        }
        let mut url = self.data_url(&["query"])?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    pub(crate) fn record_url(&self, object_type: &str, id: &str) -> Result<Url> {
        self.data_url(&["sobjects", object_type, id])
    }

    pub(crate) fn describe_url(&self, object_type: &str) -> Result<Url> {
        self.data_url(&["sobjects", object_type, "describe"])
    }

    /// GET `url` and return the body, or `None` on 404.
    async fn fetch(&self, url: Url) -> Result<Option<String>> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.session.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        Ok(Some(body))
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(&self, url: Url, what: &str) -> Result<T> {
        let body = self
            .fetch(url)
            .await?
            .ok_or_else(|| ForceError::RemoteQuery(format!("{} not found", what)))?;
        serde_json::from_str(&body)
            .map_err(|e| ForceError::RemoteQuery(format!("malformed {} response: {}", what, e)))
    }
}

#[async_trait]
impl RemoteClient for RestClient {
    async fn query(&self, query: &str) -> Result<QueryPage> {
        let url = self.query_url(query)?;
        self.fetch_json(url, "query").await
    }

    async fn get(&self, object_type: &str, id: &str) -> Result<Option<Record>> {
        let url = self.record_url(object_type, id)?;
        match self.fetch(url).await? {
            Some(body) => serde_json::from_str(&body).map(Some).map_err(|e| {
                ForceError::RemoteQuery(format!("malformed {} record: {}", object_type, e))
            }),
            None => {
                warn!("{} {} not found", object_type, id);
                Ok(None)
            }
        }
    }

    async fn describe(&self, object_type: &str) -> Result<Vec<DescribedField>> {
        let url = self.describe_url(object_type)?;
        let described: DescribeResponse = self
            .fetch_json(url, &format!("{} describe", object_type))
            .await?;
        Ok(described.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::parse_base_url;

    fn client() -> RestClient {
        RestClient::new(
            Session {
                instance_url: parse_base_url("https://example.my.salesforce.com/").unwrap(),
                access_token: "tok".to_string(),
            },
            "58.0",
        )
    }

    #[test]
    fn test_query_url_encodes_soql() {
        let url = client()
            .query_url("SELECT Id FROM Account WHERE Name = 'A&B'")
            .unwrap();
        assert_eq!(url.path(), "/services/data/v58.0/query");
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            q,
            vec![(
                "q".to_string(),
                "SELECT Id FROM Account WHERE Name = 'A&B'".to_string()
            )]
        );
    }

    #[test]
    fn test_continuation_handle_used_verbatim() {
        let url = client()
            .query_url("/services/data/v58.0/query/01gD0000002HU6KIAW-2000")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.my.salesforce.com/services/data/v58.0/query/01gD0000002HU6KIAW-2000"
        );
    }

    #[test]
    fn test_record_and_describe_urls() {
        let c = client();
        assert_eq!(
            c.record_url("Account", "001xx000003DGb2AAG").unwrap().path(),
            "/services/data/v58.0/sobjects/Account/001xx000003DGb2AAG"
        );
        assert_eq!(
            c.describe_url("Invoice__c").unwrap().path(),
            "/services/data/v58.0/sobjects/Invoice__c/describe"
        );
        // path separators in ids are escaped, not interpreted
        assert_eq!(
            c.record_url("Account", "../x").unwrap().path(),
            "/services/data/v58.0/sobjects/Account/..%2Fx"
        );
    }

    #[test]
    fn test_query_page_response() {
        let body = r#"{
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v58.0/query/01g-2",
            "records": [
                {"attributes": {"type": "Account"}, "Id": "001A", "Name": "Acme"},
                {"attributes": {"type": "Account"}, "Id": "001B", "Name": null}
            ]
        }"#;
        let page: QueryPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_size, 3);
        assert!(!page.done);
        assert_eq!(page.records.len(), 2);
        assert_eq!(
            page.next_records_url.as_deref(),
            Some("/services/data/v58.0/query/01g-2")
        );
    }

    #[test]
    fn test_describe_response() {
        let body = r#"{
            "name": "Account",
            "fields": [
                {"name": "Id", "type": "id", "label": "Account ID", "filterable": true, "sortable": true},
                {"name": "BillingAddress", "type": "address", "label": "Billing Address", "filterable": false, "sortable": false}
            ]
        }"#;
        let described: DescribeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(described.fields.len(), 2);
        assert_eq!(described.fields[1].field_type, "address");
        assert!(!described.fields[1].filterable);
    }

    #[test]
    fn test_error_body_mapping() {
        let body = r#"[{"message":"unexpected token: FROM","errorCode":"MALFORMED_QUERY"}]"#;
        let err = remote_error(StatusCode::BAD_REQUEST, body);
        match err {
            ForceError::RemoteQuery(msg) => {
                assert!(msg.contains("MALFORMED_QUERY: unexpected token: FROM"))
            }
            other => panic!("Expected RemoteQuery, got {:?}", other),
        }

        let err = remote_error(
            StatusCode::UNAUTHORIZED,
            r#"[{"message":"Session expired or invalid","errorCode":"INVALID_SESSION_ID"}]"#,
        );
        assert!(matches!(err, ForceError::ConnectionUnavailable(_)));

        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down (502 Bad Gateway)"
        );
    }
}
