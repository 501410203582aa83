//! Reading sources
//!
//! The engine does not own or persist readings. A [`ReadingSource`] supplies
//! the recent window of a subject on demand; `InMemoryReadingStore` is a
//! bounded in-process implementation.

use crate::error::HealthError;
use crate::types::{Reading, ReadingOrder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Default number of readings kept per subject
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Supplier of per-subject reading windows
pub trait ReadingSource {
    /// Recent readings of a subject, in [`ReadingSource::order`]
    fn readings_for(&self, subject_id: &str) -> Result<Vec<Reading>, HealthError>;

    /// Ordering of the sequences returned by `readings_for`
    fn order(&self) -> ReadingOrder;
}

/// Bounded in-memory store of recent readings per subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryReadingStore {
    /// Newest-first readings per subject
    subjects: HashMap<String, VecDeque<Reading>>,
    /// Maximum readings kept per subject
    window_size: usize,
}

impl Default for InMemoryReadingStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl InMemoryReadingStore {
    /// Create a store keeping at most `window_size` readings per subject
    pub fn new(window_size: usize) -> Self {
        Self {
            subjects: HashMap::new(),
            window_size: window_size.max(1),
        }
    }

    /// Record a reading. Late arrivals are placed by timestamp; the oldest
    /// reading is dropped once the window is full.
    pub fn push(&mut self, subject_id: impl Into<String>, reading: Reading) {
        let window = self.subjects.entry(subject_id.into()).or_default();

        let position = window
            .iter()
            .position(|existing| existing.timestamp <= reading.timestamp)
            .unwrap_or(window.len());
        window.insert(position, reading);
        window.truncate(self.window_size);
    }

    /// Known subject identifiers, sorted
    pub fn subject_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.subjects.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of readings held for a subject
    pub fn len_for(&self, subject_id: &str) -> usize {
        self.subjects.get(subject_id).map_or(0, VecDeque::len)
    }

    /// Load a store from JSON. Subject windows longer than `window_size`
    /// keep only their newest readings.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut store: Self = serde_json::from_str(json)?;
        if store.window_size == 0 {
            return Err(serde::de::Error::custom("window_size must be at least 1"));
        }

        for window in store.subjects.values_mut() {
            window.truncate(store.window_size);
        }
        Ok(store)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ReadingSource for InMemoryReadingStore {
    fn readings_for(&self, subject_id: &str) -> Result<Vec<Reading>, HealthError> {
        self.subjects
            .get(subject_id)
            .map(|window| window.iter().cloned().collect())
            .ok_or_else(|| HealthError::UnknownSubject(subject_id.to_string()))
    }

    fn order(&self) -> ReadingOrder {
        ReadingOrder::NewestFirst
    }
}
