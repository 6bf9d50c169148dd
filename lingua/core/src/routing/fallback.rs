//! Pivot Path Planning
//!
//! When no usable direct descriptor exists for `source -> target`, the
//! router tries a two-hop path `source -> pivot -> target`.
//!
//! ```text
//! candidates:  [universal] ++ common
//!                  │
//!                  ▼
//!     skip pivot == source or pivot == target
//!                  │
//!                  ▼
//!     first pivot with both hops described  ──► PivotPath
//! ```
//!
//! The search is greedy and order-sensitive: the first candidate whose two
//! hops are both described (and allowed) wins, even if a later candidate
//! would be a better path. `a -> b` and `b -> a` may therefore pivot
//! through different languages.

use tracing::trace;

use super::table::{BackendDescriptor, DescriptorTable};

/// A chosen two-hop path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PivotPath<'a> {
    /// Intermediate language
    pub pivot: &'a str,
    /// `source -> pivot`
    pub first: &'a BackendDescriptor,
    /// `pivot -> target`
    pub second: &'a BackendDescriptor,
}

impl PivotPath<'_> {
    /// Combined backend identifier, `first+second`
    #[must_use]
    pub fn backend_id(&self) -> String {
        format!("{}+{}", self.first.backend_id, self.second.backend_id)
    }
}

/// Ordered pivot candidates and the search over them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PivotPlanner {
    candidates: Vec<String>,
}

impl PivotPlanner {
    /// Build the candidate list: the universal pivot, then the common
    /// pivots, without duplicates or empty codes
    pub fn new(universal: &str, common: &[String]) -> Self {
        let mut candidates: Vec<String> = Vec::with_capacity(common.len() + 1);
        for code in std::iter::once(universal).chain(common.iter().map(String::as_str)) {
            if !code.is_empty() && !candidates.iter().any(|c| c == code) {
                candidates.push(code.to_string());
            }
        }
        Self { candidates }
    }

    /// Candidates in priority order
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// First pivot whose two hops are both described and allowed
    pub fn find<'a>(
        &'a self,
        table: &'a DescriptorTable,
        source: &str,
        target: &str,
        allowed: impl Fn(&BackendDescriptor) -> bool,
    ) -> Option<PivotPath<'a>> {
        for pivot in &self.candidates {
            if pivot == source || pivot == target {
                continue;
            }
            let Some(first) = table.lookup(source, pivot).filter(|d| allowed(*d)) else {
                continue;
            };
            let Some(second) = table.lookup(pivot, target).filter(|d| allowed(*d)) else {
                continue;
            };
            trace!(source, target, pivot = %pivot, "Pivot path found");
            return Some(PivotPath {
                pivot,
                first,
                second,
            });
        }
        None
    }
}
