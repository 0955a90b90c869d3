//! # urtree-core
//!
//! Structural and engagement statistics for every post in a forest of
//! reply / quote / retweet relationships.
//!
//! One *group* (ur-conversation) is processed at a time:
//!
//! ```text
//! records ──▶ GraphBuilder ──▶ aggregate (every node)
//!                                  │
//!                                  ▼
//!              sink ◀── project ◀── compute_deviation (every node)
//! ```
//!
//! Each node is measured twice: over the reply-tree (reply edges only) and
//! over the ur-tree (reply edges plus quote/retweet attachment edges).
//!
//! ## Architectural Constraints
//!
//! - No I/O, no async, no retries: producers and sinks live outside this crate
//! - A `NodeStore` is scoped to one group and dropped afterwards
//! - Distinct groups share nothing and may be processed on separate threads
//! - Results do not depend on record order, only the cost does

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod anomaly;
pub mod builder;
pub mod deviation;
pub mod pipeline;
pub mod primitives;
pub mod projector;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AuthorId, Engagement, Metric, NodeIdx, ParentLink, RawRecord, TweetId, UrTreeError,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use aggregate::{Rollup, TreeRollup, aggregate};
pub use anomaly::{Anomaly, Variant};
pub use builder::{BuiltGroup, GraphBuilder};
pub use deviation::{Dispersion, TreeDispersion, compute_deviation};
pub use pipeline::{GroupReport, GroupSummary, process_group, singleton_record};
pub use projector::{NodeStats, project};
pub use store::{Memo, Node, NodeStore};
