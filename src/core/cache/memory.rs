//! In-memory layer over the disk cache.

use super::{ArtifactKind, CachedArtifact};
use crate::core::address::ContentAddress;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

type Key = (ArtifactKind, ContentAddress);

struct Entries {
    map: HashMap<Key, Arc<CachedArtifact>>,
    order: VecDeque<Key>,
}

/// Recently served renditions, oldest evicted first
///
/// Advisory only: the disk cache is the source of truth, so this can be
/// cleared at any point and a poisoned lock simply reads as a miss.
pub struct RecentImages {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl RecentImages {
    /// Create a cache holding at most `capacity` artifacts
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, kind: ArtifactKind, address: &ContentAddress) -> Option<Arc<CachedArtifact>> {
        let entries = self.entries.read().ok()?;
        entries.map.get(&(kind, address.clone())).cloned()
    }

    pub fn insert(&self, artifact: Arc<CachedArtifact>) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        let key = (artifact.kind, artifact.address.clone());
        if entries.map.insert(key.clone(), artifact).is_none() {
            entries.order.push_back(key);
        }

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.map.clear();
            entries.order.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecentImages {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact(kind: ArtifactKind, hash: &str) -> Arc<CachedArtifact> {
        Arc::new(CachedArtifact {
            kind,
            address: ContentAddress::from_hex(hash),
            path: PathBuf::from(format!("/cache/{}.jpg", hash)),
            bytes: vec![0xFF, 0xD8],
        })
    }

    #[test]
    fn miss_returns_none() {
        let cache = RecentImages::new(4);
        assert!(cache
            .get(ArtifactKind::Thumbnail, &ContentAddress::from_hex("aa"))
            .is_none());
    }

    #[test]
    fn hit_is_per_kind() {
        let cache = RecentImages::new(4);
        cache.insert(artifact(ArtifactKind::Thumbnail, "aa"));

        let address = ContentAddress::from_hex("aa");
        assert!(cache.get(ArtifactKind::Thumbnail, &address).is_some());
        assert!(cache.get(ArtifactKind::Preview, &address).is_none());
    }

    #[test]
    fn oldest_entry_is_evicted() {
        let cache = RecentImages::new(2);
        cache.insert(artifact(ArtifactKind::Thumbnail, "01"));
        cache.insert(artifact(ArtifactKind::Thumbnail, "02"));
        cache.insert(artifact(ArtifactKind::Thumbnail, "03"));

        assert_eq!(cache.len(), 2);
        assert!(cache
            .get(ArtifactKind::Thumbnail, &ContentAddress::from_hex("01"))
            .is_none());
    }

    #[test]
    fn reinserting_does_not_grow() {
        let cache = RecentImages::new(2);
        cache.insert(artifact(ArtifactKind::Preview, "01"));
        cache.insert(artifact(ArtifactKind::Preview, "01"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_removes_all_entries() {
        let cache = RecentImages::new(4);
        cache.insert(artifact(ArtifactKind::Thumbnail, "01"));
        cache.insert(artifact(ArtifactKind::Preview, "01"));

        cache.clear();

        assert!(cache.is_empty());
    }
}
