// Client query layer: thin wrapper over the gateway's HTTP surface

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_ADULTS: u32 = 1;
pub const DEFAULT_MAX_RESULTS: u32 = 50;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

// Search form values as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
}

impl SearchCriteria {
    /// Query string sent to the gateway. Airport codes are uppercased here
    /// since the provider matches them case-sensitively.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("originLocationCode", self.origin.trim().to_uppercase()),
            ("destinationLocationCode", self.destination.trim().to_uppercase()),
            ("departureDate", self.departure_date.clone()),
        ];
        if let Some(return_date) = self.return_date.as_ref().filter(|d| !d.is_empty()) {
            query.push(("returnDate", return_date.clone()));
        }
        query.push(("adults", self.adults.unwrap_or(DEFAULT_ADULTS).to_string()));
        query.push(("max", DEFAULT_MAX_RESULTS.to_string()));
        query
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;
        let base_url: String = base_url.into();

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn search_flights(&self, criteria: &SearchCriteria) -> Result<Vec<Value>, ClientError> {
        let payload = self
            .get_json("/flights", &criteria.to_query())
            .await
            .inspect_err(|e| error!("Error searching flights: {e}"))?;
        Ok(unwrap_data(payload))
    }

    pub async fn search_airports(&self, keyword: &str) -> Result<Vec<Value>, ClientError> {
        let payload = self
            .get_json("/airports", &[("keyword", keyword.to_string())])
            .await
            .inspect_err(|e| error!("Error searching airports: {e}"))?;
        Ok(unwrap_data(payload))
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, ClientError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiResponseError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::DecodeError(e.to_string()))
    }
}

// Pulls the result array out of a `{ data: [...] }` payload
pub fn unwrap_data(payload: Value) -> Vec<Value> {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::new(server.url("/api"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_codes_are_uppercased_before_sending() {
        let server = MockServer::start_async().await;
        let flights = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/flights")
                    .query_param("originLocationCode", "JFK")
                    .query_param("destinationLocationCode", "LAX")
                    .query_param("departureDate", "2026-11-02")
                    .query_param("adults", "1")
                    .query_param("max", "50");
                then.status(200)
                    .json_body(json!({ "data": [{ "id": "1" }, { "id": "2" }] }));
            })
            .await;

        let criteria = SearchCriteria {
            origin: "jfk".to_string(),
            destination: "lax".to_string(),
            departure_date: "2026-11-02".to_string(),
            ..Default::default()
        };
        let results = client_for(&server).search_flights(&criteria).await.unwrap();

        flights.assert_async().await;
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_round_trip_query_includes_return_date_and_adults() {
        let criteria = SearchCriteria {
            origin: " cdg".to_string(),
            destination: "nrt ".to_string(),
            departure_date: "2026-12-01".to_string(),
            return_date: Some("2026-12-15".to_string()),
            adults: Some(3),
        };

        assert_eq!(
            criteria.to_query(),
            vec![
                ("originLocationCode", "CDG".to_string()),
                ("destinationLocationCode", "NRT".to_string()),
                ("departureDate", "2026-12-01".to_string()),
                ("returnDate", "2026-12-15".to_string()),
                ("adults", "3".to_string()),
                ("max", "50".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_gateway_error_becomes_api_response_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/flights");
                then.status(500).json_body(json!({
                    "error": "Failed to fetch flights",
                    "details": { "error_description": "x" }
                }));
            })
            .await;

        let err = client_for(&server)
            .search_flights(&SearchCriteria::default())
            .await
            .unwrap_err();

        match err {
            ClientError::ApiResponseError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("Failed to fetch flights"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_airport_search_unwraps_data() {
        let server = MockServer::start_async().await;
        let airports = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/airports")
                    .query_param("keyword", "Lon");
                then.status(200)
                    .json_body(json!({ "data": [{ "iataCode": "LON", "subType": "CITY" }] }));
            })
            .await;

        let results = client_for(&server).search_airports("Lon").await.unwrap();

        airports.assert_async().await;
        assert_eq!(results, vec![json!({ "iataCode": "LON", "subType": "CITY" })]);
    }

    #[test]
    fn test_unwrap_data_handles_odd_payloads() {
        assert!(unwrap_data(json!({})).is_empty());
        assert!(unwrap_data(json!({ "data": null })).is_empty());
        assert!(unwrap_data(json!([1, 2])).is_empty());
        assert_eq!(unwrap_data(json!({ "data": [1] })), vec![json!(1)]);
    }
}
