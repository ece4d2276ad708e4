// Gateway service: the two read operations exposed to callers

use crate::credential::CredentialCache;
use crate::error::GatewayError;
use crate::upstream::{QueryParams, Resource, ResourceQuery, UpstreamClient};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

pub const REQUIRED_FLIGHT_PARAMETERS: [&str; 4] = [
    "originLocationCode",
    "destinationLocationCode",
    "departureDate",
    "adults",
];

// Shorter keywords are answered locally without spending provider quota.
// Length is counted in UTF-16 code units.
pub const MIN_KEYWORD_LENGTH: usize = 2;
pub const AIRPORT_SUBTYPES: &str = "CITY,AIRPORT";
pub const AIRPORT_PAGE_LIMIT: u32 = 10;

pub struct GatewayService {
    credentials: Arc<CredentialCache>,
    upstream: Arc<dyn UpstreamClient>,
}

impl GatewayService {
    pub fn new(credentials: Arc<CredentialCache>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            credentials,
            upstream,
        }
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    /// Forwards a flight-offer search. Only the presence of the required keys
    /// is checked; values go to the provider untouched and any rejection comes
    /// back as that provider's failure.
    pub async fn search_flights(&self, parameters: QueryParams) -> Result<Value, GatewayError> {
        let missing: Vec<&str> = REQUIRED_FLIGHT_PARAMETERS
            .iter()
            .copied()
            .filter(|key| !parameters.iter().any(|(name, _)| name.as_str() == *key))
            .collect();
        if !missing.is_empty() {
            return Err(GatewayError::invalid_query(json!({
                "message": "missing required query parameters",
                "missing": missing,
            })));
        }

        let query = ResourceQuery::new(Resource::Flights, parameters);
        let payload = self.fetch(&query).await?;
        info!("Provider data received: {} flights", record_count(&payload));
        Ok(payload)
    }

    pub async fn search_airports(&self, keyword: Option<&str>) -> Result<Value, GatewayError> {
        let keyword = match keyword {
            Some(k) if k.encode_utf16().count() >= MIN_KEYWORD_LENGTH => k,
            _ => return Ok(json!({ "data": [] })),
        };

        let query = ResourceQuery::new(
            Resource::Airports,
            vec![
                ("keyword".to_string(), keyword.to_string()),
                ("subType".to_string(), AIRPORT_SUBTYPES.to_string()),
                ("page[limit]".to_string(), AIRPORT_PAGE_LIMIT.to_string()),
            ],
        );
        let payload = self.fetch(&query).await?;
        info!(
            "Found {} locations for \"{}\"",
            record_count(&payload),
            keyword
        );
        Ok(payload)
    }

    // Upstream failures are reported as-is; the cached token is left alone
    async fn fetch(&self, query: &ResourceQuery) -> Result<Value, GatewayError> {
        let credential = self.credentials.get_valid_credential().await?;
        self.upstream
            .query(&credential.token, query)
            .await
            .inspect_err(|err| {
                error!(resource = ?query.resource, detail = %err.detail, "Provider query failed");
            })
    }
}

fn record_count(payload: &Value) -> usize {
    payload
        .get("data")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
