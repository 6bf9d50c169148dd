//! Translation Routing
//!
//! Everything between a validated request and a translated result: which
//! pairs exist, which instances are loaded, and which path answers.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |      Router      |  <-- Entry point for every request
//! +--------+---------+
//!          |
//!    +-----+-------------+------------------+
//!    |                   |                  |
//!    v                   v                  v
//! +----------------+ +-------------+ +------------------+
//! |DescriptorTable | | PivotPlanner| | TranslationCache |
//! | (static pairs) | | (en,es,fr,de)| |  (LRU + TTL)     |
//! +-------+--------+ +-------------+ +------------------+
//!         |
//!    +----+-----------+
//!    |                |
//!    v                v
//! +----------------+ +-----------------+ +------------------+
//! |BackendRegistry | | RemoteModelApi  | |CompletionProvider|
//! | (local, lazy)  | | (hosted models) | | (last resort)    |
//! +----------------+ +-----------------+ +------------------+
//! ```
//!
//! # Design Principles
//!
//! 1. **Configuration is static**: the descriptor table never changes after startup
//! 2. **Instances are lazy**: a local backend loads on first demand, exactly once
//! 3. **Degrade, don't fail**: direct, then pivot, then provider, before giving up
//! 4. **Failures are values**: routing never panics or propagates, it reports

pub mod config;
pub mod fallback;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod table;

#[cfg(test)]
pub mod test_utils;

pub use config::{
    default_pairs, ConfidenceConfig, PairConfig, RetryConfig, RoutingConfig,
};
pub use fallback::{PivotPath, PivotPlanner};
pub use metrics::{Counter, Histogram, HistogramSnapshot, RouterMetrics, RouterMetricsSnapshot};
pub use registry::{BackendRegistry, PreloadReport};
pub use router::{Router, IDENTITY_BACKEND};
pub use table::{BackendDescriptor, DescriptorTable, TableError};
