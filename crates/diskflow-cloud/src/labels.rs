//! Names and tags attached to every created resource
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `diskflow:tool` | Static identifier ("diskflow") |
//! | `diskflow:job-id` | Unique job identifier (UUID) |
//! | `diskflow:created-at` | RFC 3339 timestamp of when the labels were issued |

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key/value tags sent with every create call
pub type Tags = BTreeMap<String, String>;

pub const TAG_TOOL: &str = "diskflow:tool";
pub const TAG_TOOL_VALUE: &str = "diskflow";
pub const TAG_JOB_ID: &str = "diskflow:job-id";
pub const TAG_CREATED_AT: &str = "diskflow:created-at";

/// Source of provider-side names and tags
pub trait NameGenerator: Send + Sync {
    /// A unique human-readable name starting with `prefix`
    fn generate(&self, prefix: &str) -> String;

    fn tags(&self) -> Tags;
}

/// Names of the form `<prefix>-<UTC timestamp>-<counter>`, tagged with the job id
pub struct JobLabels {
    job_id: String,
    created_at: DateTime<Utc>,
    extra: Tags,
    counter: AtomicU64,
}

impl JobLabels {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            created_at: Utc::now(),
            extra: Tags::new(),
            counter: AtomicU64::new(0),
        }
    }

    /// Labels for a fresh job with a random identifier
    pub fn random() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Add user-provided tags. Reserved `diskflow:` keys are ignored.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in tags {
            if key.starts_with("diskflow:") {
                tracing::warn!(key = %key, "Ignoring reserved tag key");
                continue;
            }
            self.extra.insert(key, value);
        }
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl NameGenerator for JobLabels {
    fn generate(&self, prefix: &str) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d%H%M%S"), seq)
    }

    fn tags(&self) -> Tags {
        let mut tags = self.extra.clone();
        tags.insert(TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string());
        tags.insert(TAG_JOB_ID.to_string(), self.job_id.clone());
        tags.insert(TAG_CREATED_AT.to_string(), self.created_at.to_rfc3339());
        tags
    }
}
