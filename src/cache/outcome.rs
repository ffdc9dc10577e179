//! Per-tier results of a fan-out operation.

use crate::cache::CacheError;

/// Result of one tier's part in a fan-out operation.
#[derive(Debug)]
pub struct TierOutcome {
    pub tier: String,
    pub error: Option<CacheError>,
}

impl TierOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a mutating operation across every tier, in tier order.
///
/// A report is informational only: a layered write has already completed on
/// every reachable tier by the time the report is returned.
#[derive(Debug, Default)]
pub struct FanOutReport {
    outcomes: Vec<TierOutcome>,
}

impl FanOutReport {
    pub(crate) fn with_capacity(tiers: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(tiers),
        }
    }

    pub(crate) fn record(&mut self, tier: &str, result: Result<(), CacheError>) {
        self.outcomes.push(TierOutcome {
            tier: tier.to_string(),
            error: result.err(),
        });
    }

    pub fn outcomes(&self) -> &[TierOutcome] {
        &self.outcomes
    }

    /// True when every tier applied the operation.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(TierOutcome::is_success)
    }

    /// Names of the tiers whose call failed.
    pub fn failed_tiers(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.tier.as_str())
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_tracks_failures_in_order() {
        let mut report = FanOutReport::with_capacity(3);
        report.record("local", Ok(()));
        report.record("shared", Err(CacheError::Connection("refused".into())));
        report.record("disk", Ok(()));

        assert!(!report.is_complete());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failed_tiers(), vec!["shared"]);
        assert_eq!(report.outcomes().len(), 3);
        assert_eq!(report.outcomes()[2].tier, "disk");
    }

    #[test]
    fn test_empty_report_is_complete() {
        assert!(FanOutReport::default().is_complete());
    }
}
