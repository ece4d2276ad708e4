// Upstream provider client: token exchange and authenticated resource queries

use crate::config::GatewayConfig;
use crate::error::{ConfigError, GatewayError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const TOKEN_PATH: &str = "/v1/security/oauth2/token";

pub type QueryParams = Vec<(String, String)>;

// Resource families exposed by the provider, one endpoint each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Flights,
    Airports,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Flights => "/v2/shopping/flight-offers",
            Resource::Airports => "/v1/reference-data/locations",
        }
    }
}

/// A single outbound resource lookup. Parameters are forwarded to the
/// provider verbatim and in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    pub resource: Resource,
    pub parameters: QueryParams,
}

impl ResourceQuery {
    pub fn new(resource: Resource, parameters: QueryParams) -> Self {
        Self {
            resource,
            parameters,
        }
    }
}

// Token endpoint response; other provider fields are ignored
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[async_trait]
pub trait UpstreamClient: Send + Sync + 'static {
    // Trades the client id/secret for a bearer token. Failures are AUTH_FAILURE.
    async fn exchange_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenGrant, GatewayError>;

    // Authenticated GET against the resource endpoint. Failures are UPSTREAM_FAILURE.
    async fn query(&self, token: &str, query: &ResourceQuery) -> Result<Value, GatewayError>;
}

/// reqwest-backed client for the Amadeus self-service API. One attempt per
/// call, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
}

impl AmadeusClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flight-search-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        Self::new(config.base_url.clone(), config.upstream_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl UpstreamClient for AmadeusClient {
    async fn exchange_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenGrant, GatewayError> {
        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::auth(transport_detail(&e)))?;

        let response = ensure_success(response).await.map_err(GatewayError::auth)?;

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| GatewayError::auth(format!("invalid token response: {}", e)))
    }

    async fn query(&self, token: &str, query: &ResourceQuery) -> Result<Value, GatewayError> {
        debug!(resource = ?query.resource, params = ?query.parameters, "Querying provider");

        let response = self
            .http
            .get(self.url(query.resource.path()))
            .bearer_auth(token)
            .query(&query.parameters)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(transport_detail(&e)))?;

        let response = ensure_success(response)
            .await
            .map_err(GatewayError::upstream)?;

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::upstream(format!("invalid provider response: {}", e)))
    }
}

// Passes 2xx responses through; otherwise returns the provider's error body as detail
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "Provider rejected request");
    Err(detail_from_body(status.as_u16(), &body))
}

/// Provider error bodies are usually JSON; keep them structured when they
/// parse and fall back to the raw text otherwise.
pub fn detail_from_body(status: u16, body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::String(format!("provider returned status {}", status));
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn transport_detail(err: &reqwest::Error) -> Value {
    let message = if err.is_timeout() {
        format!("request timeout: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("request failed: {}", err)
    };
    Value::String(message)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> AmadeusClient {
        AmadeusClient::new(server.base_url(), Duration::from_secs(5)).unwrap()
    }

    fn flight_query() -> ResourceQuery {
        ResourceQuery::new(
            Resource::Flights,
            vec![
                ("originLocationCode".to_string(), "JFK".to_string()),
                ("destinationLocationCode".to_string(), "LAX".to_string()),
                ("departureDate".to_string(), "2026-11-02".to_string()),
                ("adults".to_string(), "1".to_string()),
            ],
        )
    }

    #[tokio::test]
    async fn test_exchange_posts_client_credentials_form() {
        let server = MockServer::start_async().await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TOKEN_PATH)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .x_www_form_urlencoded_tuple("grant_type", "client_credentials")
                    .x_www_form_urlencoded_tuple("client_id", "demo-key")
                    .x_www_form_urlencoded_tuple("client_secret", "demo-secret");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "type": "amadeusOAuth2Token",
                        "access_token": "abc123",
                        "expires_in": 1799
                    }));
            })
            .await;

        let grant = client_for(&server)
            .exchange_token("demo-key", "demo-secret")
            .await
            .unwrap();

        token_mock.assert_async().await;
        assert_eq!(grant.access_token, "abc123");
        assert_eq!(grant.expires_in, 1799);
    }

    #[tokio::test]
    async fn test_exchange_rejection_is_auth_failure_with_provider_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN_PATH);
                then.status(401).json_body(json!({
                    "error": "invalid_client",
                    "error_description": "Client credentials are invalid"
                }));
            })
            .await;

        let err = client_for(&server)
            .exchange_token("bad", "bad")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::AuthFailure);
        assert_eq!(err.detail["error"], json!("invalid_client"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_reports_transport_message() {
        // Nothing listens on port 1
        let client = AmadeusClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

        let err = client.exchange_token("id", "secret").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthFailure);
        assert!(err.detail.as_str().is_some_and(|m| !m.is_empty()));

        let err = client.query("token", &flight_query()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamFailure);
    }

    #[tokio::test]
    async fn test_query_sends_bearer_and_forwards_parameters() {
        let server = MockServer::start_async().await;
        let offers = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/shopping/flight-offers")
                    .header("authorization", "Bearer abc123")
                    .query_param("originLocationCode", "JFK")
                    .query_param("destinationLocationCode", "LAX")
                    .query_param("departureDate", "2026-11-02")
                    .query_param("adults", "1");
                then.status(200)
                    .json_body(json!({ "meta": { "count": 1 }, "data": [{ "id": "1" }] }));
            })
            .await;

        let payload = client_for(&server)
            .query("abc123", &flight_query())
            .await
            .unwrap();

        offers.assert_async().await;
        assert_eq!(payload["meta"]["count"], json!(1));
        assert_eq!(payload["data"][0]["id"], json!("1"));
    }

    #[tokio::test]
    async fn test_airport_queries_hit_locations_endpoint() {
        let server = MockServer::start_async().await;
        let locations = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/reference-data/locations")
                    .query_param("keyword", "LON")
                    .query_param("subType", "CITY,AIRPORT")
                    .query_param("page[limit]", "10");
                then.status(200).json_body(json!({ "data": [{ "iataCode": "LHR" }] }));
            })
            .await;

        let query = ResourceQuery::new(
            Resource::Airports,
            vec![
                ("keyword".to_string(), "LON".to_string()),
                ("subType".to_string(), "CITY,AIRPORT".to_string()),
                ("page[limit]".to_string(), "10".to_string()),
            ],
        );
        let payload = client_for(&server).query("abc123", &query).await.unwrap();

        locations.assert_async().await;
        assert_eq!(payload["data"][0]["iataCode"], json!("LHR"));
    }

    #[tokio::test]
    async fn test_query_rejection_carries_error_description() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/shopping/flight-offers");
                then.status(400).json_body(json!({ "error_description": "x" }));
            })
            .await;

        let err = client_for(&server)
            .query("abc123", &flight_query())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamFailure);
        assert_eq!(err.detail["error_description"], json!("x"));
    }

    #[test]
    fn test_detail_from_body_falls_back_to_text_and_status() {
        assert_eq!(
            detail_from_body(502, "<html>Bad Gateway</html>"),
            json!("<html>Bad Gateway</html>")
        );
        assert_eq!(
            detail_from_body(503, "  "),
            json!("provider returned status 503")
        );
        assert_eq!(
            detail_from_body(400, r#"{"errors":[{"code":477}]}"#),
            json!({ "errors": [{ "code": 477 }] })
        );
    }

    #[test]
    fn test_token_grant_debug_redacts_access_token() {
        let grant = TokenGrant {
            access_token: "abc123".to_string(),
            expires_in: 1799,
        };
        let rendered = format!("{:?}", grant);
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("1799"));
    }
}
