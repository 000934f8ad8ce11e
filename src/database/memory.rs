// src/database/memory.rs
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CertificateRecord, CertificateStore, CertificateStream};

/// In-process certificate store.
///
/// Reads run concurrently; writes are serialized by the lock. Clones share
/// the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, CertificateRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn insert(&self, record: &CertificateRecord) -> Result<()> {
        let mut guard = self.inner.write().await;
        if !guard.contains_key(&record.fingerprint) {
            guard.insert(record.fingerprint.clone(), record.clone());
            debug!("Stored certificate {}", record.fingerprint);
        }
        Ok(())
    }

    async fn retrieve(&self, fingerprint: &str) -> Result<Option<CertificateRecord>> {
        let guard = self.inner.read().await;
        Ok(guard.get(fingerprint).cloned())
    }

    fn scan(&self) -> CertificateStream<'_> {
        // Snapshot under the lock so the stream never holds it across polls
        stream::once(async move {
            let guard = self.inner.read().await;
            guard.values().cloned().collect::<Vec<_>>()
        })
        .flat_map(|records| stream::iter(records.into_iter().map(Ok)))
        .boxed()
    }

    async fn delete(&self, fingerprint: &str) -> Result<bool> {
        let mut guard = self.inner.write().await;
        Ok(guard.remove(fingerprint).is_some())
    }

    async fn count(&self) -> Result<u64> {
        let guard = self.inner.read().await;
        Ok(guard.len() as u64)
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Vec<CertificateRecord>> {
        let guard = self.inner.read().await;
        Ok(guard
            .values()
            .filter(|record| record.subject.as_deref() == Some(subject))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
