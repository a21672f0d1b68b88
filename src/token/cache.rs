//! Token Cache
//!
//! Session-scoped store of negotiated bearer credentials, keyed by resource.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use url::Url;

use crate::types::Credential;

/// Cache key for a resource: scheme, authority and path.
///
/// Query and fragment do not change which credential applies to a
/// resource, so they are dropped.
pub fn cache_key(resource: &Url) -> String {
    let mut key = format!("{}://", resource.scheme());
    if let Some(host) = resource.host_str() {
        key.push_str(host);
    }
    if let Some(port) = resource.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push_str(resource.path());
    key
}

/// Concurrent resource-to-credential cache.
///
/// Expired entries are left in place and read as misses; they are replaced
/// by the next `put` or dropped by `invalidate_all`.
#[derive(Clone, Default)]
pub struct TokenCache {
    entries: Arc<DashMap<String, Credential>>,
}

impl TokenCache {
    /// Create empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid credential for a resource, if any.
    pub fn get(&self, resource: &Url) -> Option<Credential> {
        self.get_at(resource, Utc::now())
    }

    /// Valid credential for a resource as of `now`.
    pub fn get_at(&self, resource: &Url, now: DateTime<Utc>) -> Option<Credential> {
        self.entries
            .get(&cache_key(resource))
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.value().clone())
    }

    /// Store a credential, replacing any previous one for the resource.
    pub fn put(&self, resource: &Url, credential: Credential) {
        self.entries.insert(cache_key(resource), credential);
    }

    /// Drop the credential for one resource.
    pub fn invalidate(&self, resource: &Url) -> bool {
        self.entries.remove(&cache_key(resource)).is_some()
    }

    /// Drop every credential.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn credential(token: &str, expiration: DateTime<Utc>) -> Credential {
        Credential::new("Bearer", url("https://as.example"), token, expiration)
    }

    #[test]
    fn test_cache_key_strips_query_and_fragment() {
        assert_eq!(
            cache_key(&url("https://pod.example/a/b.ttl?x=1#frag")),
            "https://pod.example/a/b.ttl"
        );
        assert_eq!(
            cache_key(&url("https://pod.example:8443/a")),
            "https://pod.example:8443/a"
        );
        assert_eq!(cache_key(&url("https://pod.example:443/a")), "https://pod.example/a");
    }

    #[test]
    fn test_get_hits_normalized_key() {
        let cache = TokenCache::new();
        let now = Utc::now();
        cache.put(
            &url("https://pod.example/a?first"),
            credential("AT1", now + Duration::minutes(5)),
        );

        let hit = cache.get_at(&url("https://pod.example/a#other"), now).unwrap();
        assert_eq!(hit.token(), "AT1");
        assert!(cache.get_at(&url("https://pod.example/b"), now).is_none());
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = TokenCache::new();
        let now = Utc::now();
        let resource = url("https://pod.example/a");
        cache.put(&resource, credential("AT1", now + Duration::seconds(10)));

        assert!(cache.get_at(&resource, now).is_some());
        assert!(cache.get_at(&resource, now + Duration::seconds(10)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = TokenCache::new();
        let expiration = Utc::now() + Duration::minutes(5);
        cache.put(&url("https://pod.example/a"), credential("AT1", expiration));
        cache.put(&url("https://pod.example/b"), credential("AT2", expiration));

        assert!(cache.invalidate(&url("https://pod.example/a")));
        assert!(!cache.invalidate(&url("https://pod.example/a")));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_put_and_get() {
        let cache = TokenCache::new();
        let expiration = Utc::now() + Duration::minutes(5);

        let tasks = (0..16).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let resource = url(&format!("https://pod.example/r{}", i % 4));
                cache.put(&resource, credential(&format!("AT{}", i), expiration));
                cache.get(&resource).is_some()
            })
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.into_iter().all(|r| r.unwrap()));
        assert_eq!(cache.len(), 4);
    }
}
