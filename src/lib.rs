// Token-caching gateway in front of the Amadeus flight-data API

pub mod client;
pub mod clock;
pub mod config;
pub mod credential;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod server;
pub mod upstream;

// Re-export key types for convenience
pub use client::{ClientError, GatewayClient, SearchCriteria};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GatewayConfig;
pub use credential::{ClientCredentials, Credential, CredentialCache, CredentialStats};
pub use debounce::{AirportLookup, KeywordDebouncer};
pub use error::{ConfigError, ErrorKind, GatewayError};
pub use gateway::GatewayService;
pub use upstream::{AmadeusClient, Resource, ResourceQuery, TokenGrant, UpstreamClient};
