// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Query result cache
//
// Latest successful result per query key. Created once at the application
// root and handed to every poller, then cleared on shutdown.

use crate::models::StationSchedule;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A cached query result
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub data: Vec<StationSchedule>,
    pub fetched_at: DateTime<Utc>,
}

/// Shared cache of query results
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, CachedResult>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedResult> {
        self.entries.read().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: &str, data: Vec<StationSchedule>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CachedResult {
                    data,
                    fetched_at: Utc::now(),
                },
            );
        }
    }

    /// Forget one key so the next subscriber starts empty
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            tracing::debug!("Clearing {} cached queries", entries.len());
            entries.clear();
        }
    }
}
