use serde::{Deserialize, Serialize};

use super::aggregate::PriceAggregates;
use super::domain::PricingSubmission;

/// Thresholds for flagging a submitted price against its job-type average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPolicy {
    /// Approved samples required before an average is trusted.
    pub minimum_samples: usize,
    /// Relative deviation above which a price is suspicious.
    pub deviation_threshold: f64,
    /// Relative deviation above which a suspicious price is labelled "Very High".
    pub very_high_threshold: f64,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            minimum_samples: 3,
            deviation_threshold: 0.5,
            very_high_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    VeryHigh,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::VeryHigh => "Very High",
        }
    }
}

/// Outcome of comparing one price with its job-type average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PriceVerdict {
    /// Not enough approved samples (or no usable average) to judge.
    Undetermined { sample_count: usize },
    WithinRange { average: f64, deviation: f64 },
    Suspicious {
        average: f64,
        deviation: f64,
        severity: Severity,
    },
}

impl PriceVerdict {
    pub fn is_suspicious(&self) -> bool {
        matches!(self, PriceVerdict::Suspicious { .. })
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, PriceVerdict::Undetermined { .. })
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            PriceVerdict::Suspicious { severity, .. } => Some(*severity),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            PriceVerdict::Undetermined { sample_count } => {
                format!("insufficient data ({sample_count} approved samples)")
            }
            PriceVerdict::WithinRange { deviation, .. } => {
                format!("within range ({:.0}% from average)", deviation * 100.0)
            }
            PriceVerdict::Suspicious {
                deviation,
                severity,
                ..
            } => format!(
                "suspicious: {} deviation ({:.0}% from average)",
                severity.label(),
                deviation * 100.0
            ),
        }
    }
}

/// Classifies submissions against a single aggregate snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyClassifier<'a> {
    aggregates: &'a PriceAggregates,
    policy: AnomalyPolicy,
}

impl<'a> AnomalyClassifier<'a> {
    pub fn new(aggregates: &'a PriceAggregates, policy: AnomalyPolicy) -> Self {
        Self { aggregates, policy }
    }

    pub fn classify(&self, submission: &PricingSubmission) -> PriceVerdict {
        self.classify_price(&submission.job_type, submission.actual_price)
    }

    pub fn classify_price(&self, job_type: &str, price: f64) -> PriceVerdict {
        let aggregate = match self.aggregates.get(job_type) {
            Some(aggregate) if aggregate.count >= self.policy.minimum_samples => aggregate,
            Some(aggregate) => {
                return PriceVerdict::Undetermined {
                    sample_count: aggregate.count,
                }
            }
            None => return PriceVerdict::Undetermined { sample_count: 0 },
        };

        let average = aggregate.total / aggregate.count as f64;
        if !price.is_finite() || !average.is_finite() || average <= 0.0 {
            return PriceVerdict::Undetermined {
                sample_count: aggregate.count,
            };
        }

        let deviation = (price - average).abs() / average;
        if deviation > self.policy.deviation_threshold {
            let severity = if deviation > self.policy.very_high_threshold {
                Severity::VeryHigh
            } else {
                Severity::High
            };
            PriceVerdict::Suspicious {
                average,
                deviation,
                severity,
            }
        } else {
            PriceVerdict::WithinRange { average, deviation }
        }
    }
}
