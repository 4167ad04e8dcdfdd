// Immutable inputs of one retention run

use chrono::{DateTime, Local};

use crate::config::RetentionConfig;

/// Format of the timestamp tag; fixed width so string order is time order
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub(crate) const LATEST_TAG: &str = "latest";

/// Everything a run needs, captured once at start and shared by all components
#[derive(Debug, Clone)]
pub(crate) struct RetentionPlan {
    repository_prefix: String,
    components: Vec<String>,
    keep: usize,
    timestamp: String,
}

impl RetentionPlan {
    pub(crate) fn new(config: &RetentionConfig, started_at: DateTime<Local>) -> Self {
        Self::with_timestamp(config, started_at.format(TIMESTAMP_FORMAT).to_string())
    }

    pub(crate) fn with_timestamp(config: &RetentionConfig, timestamp: impl Into<String>) -> Self {
        Self {
            repository_prefix: config.repository_prefix.clone(),
            components: config.components.clone(),
            keep: config.keep,
            timestamp: timestamp.into(),
        }
    }

    pub(crate) fn components(&self) -> &[String] {
        &self.components
    }

    pub(crate) fn keep(&self) -> usize {
        self.keep
    }

    pub(crate) fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `{prefix}{component}`
    pub(crate) fn repository(&self, component: &str) -> String {
        format!("{}{}", self.repository_prefix, component)
    }

    pub(crate) fn reference(&self, component: &str, tag: &str) -> String {
        format!("{}:{}", self.repository(component), tag)
    }

    pub(crate) fn latest_reference(&self, component: &str) -> String {
        self.reference(component, LATEST_TAG)
    }

    pub(crate) fn timestamp_reference(&self, component: &str) -> String {
        self.reference(component, &self.timestamp)
    }
}
