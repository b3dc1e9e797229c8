use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::PricingSubmission;

/// Running total and sample count for one job type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct JobTypeAggregate {
    pub total: f64,
    pub count: usize,
}

impl JobTypeAggregate {
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }
}

/// Per-job-type aggregates over approved submissions, rebuilt from scratch on every fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceAggregates {
    by_job_type: BTreeMap<String, JobTypeAggregate>,
}

impl PriceAggregates {
    /// Folds the approved subset of `submissions`; anything else is ignored.
    pub fn from_approved<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a PricingSubmission>,
    {
        let mut by_job_type: BTreeMap<String, JobTypeAggregate> = BTreeMap::new();

        for submission in submissions.into_iter().filter(|s| s.is_approved()) {
            let entry = by_job_type.entry(submission.job_type.clone()).or_default();
            entry.total += submission.actual_price;
            entry.count += 1;
        }

        Self { by_job_type }
    }

    pub fn get(&self, job_type: &str) -> Option<&JobTypeAggregate> {
        self.by_job_type.get(job_type)
    }

    pub fn len(&self) -> usize {
        self.by_job_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_job_type.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobTypeAggregate)> {
        self.by_job_type
            .iter()
            .map(|(job_type, aggregate)| (job_type.as_str(), aggregate))
    }

    /// Flattened rows for API responses and CLI output.
    pub fn views(&self) -> Vec<JobTypeAverageView> {
        self.iter()
            .filter_map(|(job_type, aggregate)| {
                aggregate.mean().map(|average| JobTypeAverageView {
                    job_type: job_type.to_string(),
                    average,
                    sample_count: aggregate.count,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTypeAverageView {
    pub job_type: String,
    pub average: f64,
    pub sample_count: usize,
}
