//! UMA Discovery
//!
//! Fetches and caches `/.well-known/uma2-configuration` documents.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

use crate::core::transport::{HttpRequest, HttpTransport};
use crate::error::{ConfigurationError, ProtocolError, UmaError};
use crate::types::Metadata;

const UMA2_CONFIGURATION: &str = "/.well-known/uma2-configuration";

/// Discovery cache entry.
struct MetadataCacheEntry {
    metadata: Metadata,
    expires_at: Instant,
}

/// Metadata client interface (for dependency injection).
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Fetch the discovery document for an authorization server.
    async fn fetch(&self, authorization_server: &Url) -> Result<Metadata, UmaError>;

    /// Clear cache for one authorization server, or all of them.
    fn clear_cache(&self, authorization_server: Option<&Url>);
}

/// Default metadata client implementation.
pub struct DefaultMetadataClient<T: HttpTransport> {
    transport: Arc<T>,
    cache: Mutex<HashMap<String, MetadataCacheEntry>>,
    cache_ttl: Duration,
    timeout: Option<Duration>,
}

impl<T: HttpTransport> DefaultMetadataClient<T> {
    /// Create new metadata client.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_cache_ttl(
            transport,
            Duration::from_secs(crate::types::DEFAULT_METADATA_CACHE_TTL_SECS),
        )
    }

    /// Create metadata client with custom cache TTL.
    pub fn with_cache_ttl(transport: Arc<T>, cache_ttl: Duration) -> Self {
        Self {
            transport,
            cache: Mutex::new(HashMap::new()),
            cache_ttl,
            timeout: None,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn normalize(authorization_server: &Url) -> String {
        authorization_server
            .as_str()
            .trim_end_matches('/')
            .to_string()
    }

    /// Discovery URL for an authorization server.
    pub fn metadata_url(authorization_server: &Url) -> String {
        format!("{}{}", Self::normalize(authorization_server), UMA2_CONFIGURATION)
    }

    fn get_from_cache(&self, key: &str) -> Option<Metadata> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = cache.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.metadata.clone());
            }
            cache.remove(key);
        }

        None
    }

    fn set_cache(&self, key: String, metadata: Metadata) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                key,
                MetadataCacheEntry {
                    metadata,
                    expires_at: Instant::now() + self.cache_ttl,
                },
            );
    }
}

#[async_trait]
impl<T: HttpTransport> MetadataClient for DefaultMetadataClient<T> {
    async fn fetch(&self, authorization_server: &Url) -> Result<Metadata, UmaError> {
        let key = Self::normalize(authorization_server);
        if let Some(cached) = self.get_from_cache(&key) {
            return Ok(cached);
        }

        let mut request = HttpRequest::get_json(Self::metadata_url(authorization_server));
        request.timeout = self.timeout;

        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(UmaError::Configuration(ConfigurationError::DiscoveryFailed {
                message: format!(
                    "Unexpected response code during UMA discovery: {}",
                    response.status
                ),
            }));
        }

        let metadata: Metadata = serde_json::from_str(&response.body).map_err(|e| {
            UmaError::Protocol(ProtocolError::InvalidJson {
                status: response.status,
                message: e.to_string(),
            })
        })?;

        tracing::debug!(
            authorization_server = %key,
            token_endpoint = %metadata.token_endpoint,
            "Fetched UMA metadata"
        );

        self.set_cache(key, metadata.clone());

        Ok(metadata)
    }

    fn clear_cache(&self, authorization_server: Option<&Url>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match authorization_server {
            Some(server) => {
                cache.remove(&Self::normalize(server));
            }
            None => {
                cache.clear();
            }
        }
    }
}

/// Mock metadata client for testing.
#[derive(Default)]
pub struct MockMetadataClient {
    documents: Mutex<HashMap<String, Metadata>>,
    fetch_history: Mutex<Vec<String>>,
}

impl MockMetadataClient {
    /// Create new mock metadata client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set discovery document for an authorization server.
    pub fn set_document(&self, authorization_server: &Url, metadata: Metadata) -> &Self {
        self.documents
            .lock()
            .unwrap()
            .insert(authorization_server.to_string(), metadata);
        self
    }

    /// Get fetch history.
    pub fn get_fetch_history(&self) -> Vec<String> {
        self.fetch_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataClient for MockMetadataClient {
    async fn fetch(&self, authorization_server: &Url) -> Result<Metadata, UmaError> {
        self.fetch_history
            .lock()
            .unwrap()
            .push(authorization_server.to_string());

        self.documents
            .lock()
            .unwrap()
            .get(authorization_server.as_str())
            .cloned()
            .ok_or_else(|| {
                UmaError::Configuration(ConfigurationError::DiscoveryFailed {
                    message: format!("No mock document for {}", authorization_server),
                })
            })
    }

    fn clear_cache(&self, _authorization_server: Option<&Url>) {}
}

/// Create mock discovery document for testing.
pub fn create_mock_metadata(authorization_server: &Url, profiles: &[&str]) -> Metadata {
    let base = authorization_server.as_str().trim_end_matches('/');
    Metadata {
        issuer: Some(authorization_server.clone()),
        token_endpoint: Url::parse(&format!("{}/token", base))
            .unwrap_or_else(|_| authorization_server.clone()),
        jwks_uri: Url::parse(&format!("{}/jwks", base)).ok(),
        dpop_signing_alg_values_supported: vec!["ES256".to_string()],
        grant_types_supported: vec![crate::types::UMA_TICKET_GRANT_TYPE.to_string()],
        uma_profiles_supported: profiles.iter().map(|p| p.to_string()).collect(),
    }
}
