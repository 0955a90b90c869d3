//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the urtree core:
//! - Identifiers (`TweetId`, `AuthorId`, `NodeIdx`)
//! - Engagement counters (`Engagement`, `Metric`)
//! - Input records as delivered by a producer (`RawRecord`, `ParentLink`)
//! - Error types (`UrTreeError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can key `BTreeMap`/`BTreeSet`.
//! Counter sums use saturating arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a post, as assigned by the upstream platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TweetId(pub u64);

/// Identifier of the account that authored a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorId(pub u64);

/// Dense index of a node inside one group's arena.
///
/// Only meaningful for the `NodeStore` that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub usize);

impl std::fmt::Display for TweetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ENGAGEMENT
// =============================================================================

/// One of the four engagement counters carried by every post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Reply,
    Quote,
    Like,
    Retweet,
}

impl Metric {
    /// All metrics, in output column order.
    pub const ALL: [Metric; 4] = [Metric::Reply, Metric::Quote, Metric::Like, Metric::Retweet];

    /// Column stem used by the output record (`t_<stem>`, `mean_<stem>`, ...).
    #[must_use]
    pub fn stem(&self) -> &'static str {
        match self {
            Metric::Reply => "reply_count",
            Metric::Quote => "quote_count",
            Metric::Like => "like_count",
            Metric::Retweet => "retweet_count",
        }
    }
}

/// Engagement counters, either a post's own values or a subtree total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub reply_count: u64,
    pub quote_count: u64,
    pub like_count: u64,
    pub retweet_count: u64,
}

impl Engagement {
    #[must_use]
    pub const fn new(reply_count: u64, quote_count: u64, like_count: u64, retweet_count: u64) -> Self {
        Self {
            reply_count,
            quote_count,
            like_count,
            retweet_count,
        }
    }

    /// Read a single counter.
    #[must_use]
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Reply => self.reply_count,
            Metric::Quote => self.quote_count,
            Metric::Like => self.like_count,
            Metric::Retweet => self.retweet_count,
        }
    }

    /// Add another set of counters in place (saturating).
    pub fn absorb(&mut self, other: &Engagement) {
        self.reply_count = self.reply_count.saturating_add(other.reply_count);
        self.quote_count = self.quote_count.saturating_add(other.quote_count);
        self.like_count = self.like_count.saturating_add(other.like_count);
        self.retweet_count = self.retweet_count.saturating_add(other.retweet_count);
    }
}

// =============================================================================
// INPUT RECORDS
// =============================================================================

/// The single parent relation a record may declare.
///
/// The derived ordering is the arbitration order used when one post is
/// claimed by several parents: reply links first, then retweets, then
/// quotes, ties broken by the smaller parent id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParentLink {
    Reply(TweetId),
    Retweet(TweetId),
    Quote(TweetId),
}

impl ParentLink {
    /// The parent this link points at.
    #[must_use]
    pub fn parent(&self) -> TweetId {
        match self {
            ParentLink::Reply(id) | ParentLink::Retweet(id) | ParentLink::Quote(id) => *id,
        }
    }

    /// Whether this link is a reply edge (as opposed to a quote/retweet attachment).
    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(self, ParentLink::Reply(_))
    }
}

/// One post as delivered by the producer for a single group.
///
/// At most one of the three parent fields is expected to be set; when more
/// are, `reply_parent_id` wins over `retweet_parent_id`, which wins over
/// `quote_parent_id`. Missing counters default to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub tweet_id: TweetId,
    pub author_id: AuthorId,
    #[serde(default)]
    pub reply_parent_id: Option<TweetId>,
    #[serde(default)]
    pub retweet_parent_id: Option<TweetId>,
    #[serde(default)]
    pub quote_parent_id: Option<TweetId>,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
}

impl RawRecord {
    /// A record with no parent and zeroed counters.
    #[must_use]
    pub fn root(tweet_id: u64, author_id: u64) -> Self {
        Self {
            tweet_id: TweetId(tweet_id),
            author_id: AuthorId(author_id),
            reply_parent_id: None,
            retweet_parent_id: None,
            quote_parent_id: None,
            reply_count: 0,
            quote_count: 0,
            like_count: 0,
            retweet_count: 0,
        }
    }

    /// Builder-style: mark this record as a reply to `parent`.
    #[must_use]
    pub fn replying_to(mut self, parent: u64) -> Self {
        self.reply_parent_id = Some(TweetId(parent));
        self
    }

    /// Builder-style: mark this record as a retweet of `parent`.
    #[must_use]
    pub fn retweeting(mut self, parent: u64) -> Self {
        self.retweet_parent_id = Some(TweetId(parent));
        self
    }

    /// Builder-style: mark this record as quoting `parent`.
    #[must_use]
    pub fn quoting(mut self, parent: u64) -> Self {
        self.quote_parent_id = Some(TweetId(parent));
        self
    }

    /// Builder-style: set the four engagement counters.
    #[must_use]
    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.reply_count = engagement.reply_count;
        self.quote_count = engagement.quote_count;
        self.like_count = engagement.like_count;
        self.retweet_count = engagement.retweet_count;
        self
    }

    /// The record's own counters.
    #[must_use]
    pub fn engagement(&self) -> Engagement {
        Engagement::new(
            self.reply_count,
            self.quote_count,
            self.like_count,
            self.retweet_count,
        )
    }

    /// The effective parent link, applying reply > retweet > quote precedence.
    #[must_use]
    pub fn parent_link(&self) -> Option<ParentLink> {
        if let Some(id) = self.reply_parent_id {
            Some(ParentLink::Reply(id))
        } else if let Some(id) = self.retweet_parent_id {
            Some(ParentLink::Retweet(id))
        } else {
            self.quote_parent_id.map(ParentLink::Quote)
        }
    }

    /// Number of parent fields that are set. Anything above one is malformed.
    #[must_use]
    pub fn parent_field_count(&self) -> usize {
        [
            self.reply_parent_id,
            self.retweet_parent_id,
            self.quote_parent_id,
        ]
        .iter()
        .filter(|p| p.is_some())
        .count()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the urtree system.
///
/// - No silent failures
/// - Graph anomalies (cycles, oversized subtrees) are reported as data, not errors
/// - The core never panics; operations called out of order return an error
#[derive(Debug, Error)]
pub enum UrTreeError {
    /// The requested node does not exist in the current group.
    #[error("Node not found: {0}")]
    NodeNotFound(TweetId),

    /// Deviation or projection was requested before aggregation.
    #[error("Node {0} has not been aggregated yet")]
    NotAggregated(TweetId),

    /// An input record is malformed.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The result store rejected an operation.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_link_precedence() {
        let mut record = RawRecord::root(10, 1).quoting(3).retweeting(2);
        assert_eq!(record.parent_link(), Some(ParentLink::Retweet(TweetId(2))));

        record = record.replying_to(1);
        assert_eq!(record.parent_link(), Some(ParentLink::Reply(TweetId(1))));
        assert_eq!(record.parent_field_count(), 3);
    }

    #[test]
    fn parent_link_ordering_prefers_replies_then_smaller_ids() {
        let mut links = vec![
            ParentLink::Quote(TweetId(1)),
            ParentLink::Reply(TweetId(9)),
            ParentLink::Retweet(TweetId(2)),
            ParentLink::Reply(TweetId(4)),
        ];
        links.sort();
        assert_eq!(links[0], ParentLink::Reply(TweetId(4)));
        assert_eq!(links[1], ParentLink::Reply(TweetId(9)));
        assert_eq!(links[2], ParentLink::Retweet(TweetId(2)));
    }

    #[test]
    fn engagement_absorb_saturates() {
        let mut total = Engagement::new(u64::MAX, 1, 2, 3);
        total.absorb(&Engagement::new(1, 1, 1, 1));
        assert_eq!(total.reply_count, u64::MAX);
        assert_eq!(total.get(Metric::Quote), 2);
        assert_eq!(total.get(Metric::Like), 3);
        assert_eq!(total.get(Metric::Retweet), 4);
    }
}
