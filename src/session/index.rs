//! Resource Credential Index
//!
//! Maps every resource named by an access grant to that grant and finds the
//! grant covering a requested resource.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use url::Url;

use crate::token::cache_key;
use crate::types::AccessGrant;

/// True when `target` is `parent` or lies beneath it in the URI hierarchy.
///
/// Scheme, host and port must match. A parent path without a trailing
/// slash only covers itself and paths under `parent/`.
pub fn is_ancestor(parent: &Url, target: &Url) -> bool {
    if parent.scheme() != target.scheme()
        || parent.host_str() != target.host_str()
        || parent.port_or_known_default() != target.port_or_known_default()
    {
        return false;
    }

    let parent_path = parent.path();
    let target_path = target.path();
    if parent_path == target_path {
        return true;
    }

    if parent_path.ends_with('/') {
        target_path.starts_with(parent_path)
    } else {
        target_path
            .strip_prefix(parent_path)
            .map_or(false, |rest| rest.starts_with('/'))
    }
}

struct IndexEntry {
    resource: Url,
    grant: Arc<AccessGrant>,
}

/// Immutable resource-to-grant index.
///
/// Built once from a session's grants. Lookups take `&self` only, so the
/// index is shared between tasks without locking.
#[derive(Default)]
pub struct ResourceCredentialIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl ResourceCredentialIndex {
    /// Index every resource of every grant. When two grants name the same
    /// resource, the later grant wins.
    pub fn new(grants: impl IntoIterator<Item = AccessGrant>) -> Self {
        let mut entries = BTreeMap::new();
        for grant in grants {
            let grant = Arc::new(grant);
            for resource in &grant.resources {
                entries.insert(
                    cache_key(resource),
                    IndexEntry {
                        resource: resource.clone(),
                        grant: grant.clone(),
                    },
                );
            }
        }
        Self { entries }
    }

    /// Grant for the nearest indexed resource enclosing `resource`.
    ///
    /// Keys carry scheme, authority and path only. Candidates are visited
    /// from the greatest key at or below the target's downwards. An
    /// enclosing resource's key is a prefix of the target's, so the first
    /// one reached is also the deepest.
    pub fn lookup(&self, resource: &Url) -> Option<&AccessGrant> {
        let key = cache_key(resource);
        self.entries
            .range::<str, _>((Bound::Unbounded, Bound::Included(key.as_str())))
            .rev()
            .find(|(_, entry)| is_ancestor(&entry.resource, resource))
            .map(|(_, entry)| entry.grant.as_ref())
    }

    /// Number of indexed resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
