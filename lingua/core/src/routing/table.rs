//! Backend Descriptor Table
//!
//! The static routing table: which backend serves each direct language
//! pair. Built once from configuration and read-only afterwards.
//!
//! Lookups are two nested hash probes keyed by borrowed `&str`, so the
//! "is this pair supported" check on the request path allocates nothing.

use std::collections::HashMap;

use serde::Serialize;

use crate::translation::{BackendKind, LanguagePair};

use super::config::PairConfig;

/// A direct backend for one language pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendDescriptor {
    /// The pair this backend translates
    pub pair: LanguagePair,
    /// Where translations run
    pub kind: BackendKind,
    /// Model or backend identifier
    pub backend_id: String,
}

impl BackendDescriptor {
    /// Create a descriptor
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: BackendKind,
        backend_id: impl Into<String>,
    ) -> Self {
        Self {
            pair: LanguagePair::new(source, target),
            kind,
            backend_id: backend_id.into(),
        }
    }
}

impl From<&PairConfig> for BackendDescriptor {
    fn from(config: &PairConfig) -> Self {
        Self::new(
            config.source.as_str(),
            config.target.as_str(),
            config.kind,
            config.backend.as_str(),
        )
    }
}

/// Errors building a [`DescriptorTable`]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The same pair was described twice
    #[error("duplicate descriptor for {0}")]
    DuplicatePair(LanguagePair),

    /// A descriptor has an empty language code or backend id
    #[error("incomplete descriptor for {0}")]
    Incomplete(LanguagePair),
}

/// Read-only map from language pair to its direct backend
#[derive(Clone, Debug, Default)]
pub struct DescriptorTable {
    by_source: HashMap<String, HashMap<String, BackendDescriptor>>,
    order: Vec<LanguagePair>,
}

impl DescriptorTable {
    /// Build a table, preserving the order descriptors are given in
    ///
    /// # Errors
    ///
    /// Fails on a duplicate pair or an incomplete descriptor.
    pub fn new(descriptors: impl IntoIterator<Item = BackendDescriptor>) -> Result<Self, TableError> {
        let mut table = Self::default();
        for descriptor in descriptors {
            let pair = descriptor.pair.clone();
            if pair.source.is_empty() || pair.target.is_empty() || descriptor.backend_id.is_empty()
            {
                return Err(TableError::Incomplete(pair));
            }
            let targets = table.by_source.entry(pair.source.clone()).or_default();
            if targets.contains_key(&pair.target) {
                return Err(TableError::DuplicatePair(pair));
            }
            targets.insert(pair.target.clone(), descriptor);
            table.order.push(pair);
        }
        Ok(table)
    }

    /// Build a table from `[[pairs]]` entries
    ///
    /// # Errors
    ///
    /// See [`DescriptorTable::new`].
    pub fn from_config(pairs: &[PairConfig]) -> Result<Self, TableError> {
        Self::new(pairs.iter().map(BackendDescriptor::from))
    }

    /// The direct backend for a pair, if any
    #[must_use]
    pub fn lookup(&self, source: &str, target: &str) -> Option<&BackendDescriptor> {
        self.by_source.get(source)?.get(target)
    }

    /// Whether a direct backend exists for a pair
    #[must_use]
    pub fn is_supported(&self, source: &str, target: &str) -> bool {
        self.lookup(source, target).is_some()
    }

    /// Every described pair, in configuration order
    #[must_use]
    pub fn list_pairs(&self) -> &[LanguagePair] {
        &self.order
    }

    /// Every descriptor, in configuration order
    pub fn descriptors(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.order
            .iter()
            .filter_map(|pair| self.lookup(&pair.source, &pair.target))
    }

    /// Number of described pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
