use serde::{Deserialize, Serialize};

/// Per-breaker configuration. Immutable; the `with_*` methods return a new
/// instance rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub failure_threshold: u64,
    pub success_threshold: u64,
    pub timeout_secs: i64,
    pub sampling_duration_secs: i64,
    pub minimum_throughput: u64,
    pub percentage_threshold: f64,
    pub strategy_name: String,

    /// Failure tags that are never recorded, even if `record` would
    /// otherwise match them. Takes precedence over `record`.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// When non-empty, a whitelist: only failures carrying one of these
    /// tags are recorded.
    #[serde(default)]
    pub record: Vec<String>,
}

impl Configuration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default_values()
        }
    }

    fn default_values() -> Self {
        Self {
            name: String::new(),
            failure_threshold: 5,
            success_threshold: 2,
            timeout_secs: 60,
            sampling_duration_secs: 120,
            minimum_throughput: 10,
            percentage_threshold: 50.0,
            strategy_name: "consecutive_failures".to_string(),
            ignore: Vec::new(),
            record: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_failure_threshold(mut self, v: u64) -> Self {
        self.failure_threshold = v;
        self
    }

    #[must_use]
    pub fn with_success_threshold(mut self, v: u64) -> Self {
        self.success_threshold = v;
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, v: i64) -> Self {
        self.timeout_secs = v;
        self
    }

    #[must_use]
    pub fn with_sampling_duration_secs(mut self, v: i64) -> Self {
        self.sampling_duration_secs = v;
        self
    }

    #[must_use]
    pub fn with_minimum_throughput(mut self, v: u64) -> Self {
        self.minimum_throughput = v;
        self
    }

    #[must_use]
    pub fn with_percentage_threshold(mut self, v: f64) -> Self {
        self.percentage_threshold = v;
        self
    }

    #[must_use]
    pub fn with_strategy_name(mut self, v: impl Into<String>) -> Self {
        self.strategy_name = v.into();
        self
    }

    #[must_use]
    pub fn with_ignore(mut self, tags: Vec<String>) -> Self {
        self.ignore = tags;
        self
    }

    #[must_use]
    pub fn with_record(mut self, tags: Vec<String>) -> Self {
        self.record = tags;
        self
    }

    /// Whether a failure carrying `tags` should be recorded, applying the
    /// ignore-takes-precedence-over-record rule from `spec.md` §4.3.
    #[must_use]
    pub fn should_record(&self, tags: &[&str]) -> bool {
        if tags.iter().any(|t| self.ignore.iter().any(|i| i == t)) {
            return false;
        }
        self.record.is_empty() || tags.iter().any(|t| self.record.iter().any(|r| r == t))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::default_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = Configuration::new("svc");
        assert_eq!(c.failure_threshold, 5);
        assert_eq!(c.success_threshold, 2);
        assert_eq!(c.timeout_secs, 60);
        assert_eq!(c.sampling_duration_secs, 120);
        assert_eq!(c.minimum_throughput, 10);
        assert!((c.percentage_threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(c.strategy_name, "consecutive_failures");
    }

    #[test]
    fn builder_methods_compose() {
        let c = Configuration::new("svc")
            .with_failure_threshold(3)
            .with_timeout_secs(10)
            .with_strategy_name("percentage_failures");
        assert_eq!(c.failure_threshold, 3);
        assert_eq!(c.timeout_secs, 10);
        assert_eq!(c.strategy_name, "percentage_failures");
    }

    #[test]
    fn ignore_takes_precedence_over_record() {
        let c = Configuration::new("svc")
            .with_ignore(vec!["validation".into()])
            .with_record(vec!["validation".into(), "io".into()]);
        assert!(!c.should_record(&["validation"]));
    }

    #[test]
    fn empty_record_whitelist_records_everything_not_ignored() {
        let c = Configuration::new("svc");
        assert!(c.should_record(&["anything"]));
    }

    #[test]
    fn nonempty_record_whitelist_only_matches_listed_tags() {
        let c = Configuration::new("svc").with_record(vec!["io".into()]);
        assert!(c.should_record(&["io"]));
        assert!(!c.should_record(&["validation"]));
    }
}
