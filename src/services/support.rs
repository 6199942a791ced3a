use std::future::Future;

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Result of one step in a sequential multi-step write.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed { message: String },
    /// Not attempted because an earlier step failed.
    Skipped,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StepOutcome {
    pub label: String,
    pub quantity: i32,
    /// Absolute running total carried by the call, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_total: Option<i32>,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Collector for sequential dependent writes (multi-lot receiving, bulk
/// put-away confirmation). These loops stop at the first error and never
/// roll back already-applied steps; the report makes the partial completion
/// explicit to the caller instead of opaquely stopping.
#[derive(Clone, Debug, Default, Serialize, ToSchema)]
pub struct BatchReport {
    pub steps: Vec<StepOutcome>,
}

impl BatchReport {
    pub fn record(&mut self, label: impl Into<String>, quantity: i32, status: StepStatus) {
        self.steps.push(StepOutcome {
            label: label.into(),
            quantity,
            cumulative_total: None,
            status,
        });
    }

    pub fn record_with_total(
        &mut self,
        label: impl Into<String>,
        quantity: i32,
        cumulative_total: i32,
        status: StepStatus,
    ) {
        self.steps.push(StepOutcome {
            label: label.into(),
            quantity,
            cumulative_total: Some(cumulative_total),
            status,
        });
    }

    pub fn applied_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Applied)
            .count()
    }

    pub fn first_failure(&self) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed { .. }))
    }

    /// True when every attempted step applied.
    pub fn completed(&self) -> bool {
        self.first_failure().is_none()
    }
}

/// Optimistic mutation: apply `next` through `write` immediately, run the
/// backend call, and restore the prior value if the call fails.
///
/// The getter/setter pair keeps this generic over where the value lives;
/// the checklist toggle is the one caller.
pub async fn apply_optimistic<T, Fut>(
    read: impl FnOnce() -> Option<T>,
    write: impl Fn(T),
    next: T,
    call: impl FnOnce() -> Fut,
) -> Result<(), ServiceError>
where
    T: Clone,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    let prior = read().ok_or_else(|| {
        ServiceError::NotFound("no current value to update optimistically".to_string())
    })?;
    write(next);

    match call().await {
        Ok(()) => Ok(()),
        Err(err) => {
            write(prior);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn optimistic_update_keeps_value_on_success() {
        let value = Cell::new(Some(false));

        let result = apply_optimistic(
            || value.get(),
            |v| value.set(Some(v)),
            true,
            || async { Ok(()) },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(value.get(), Some(true));
    }

    #[tokio::test]
    async fn optimistic_update_rolls_back_on_failure() {
        let value = Cell::new(Some(false));

        let result = apply_optimistic(
            || value.get(),
            |v| value.set(Some(v)),
            true,
            || async { Err(ServiceError::ExternalApiError("boom".to_string())) },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(value.get(), Some(false));
    }

    #[test]
    fn batch_report_tracks_partial_completion() {
        let mut report = BatchReport::default();
        report.record("A-01", 5, StepStatus::Applied);
        report.record(
            "A-02",
            3,
            StepStatus::Failed {
                message: "bin full".to_string(),
            },
        );
        report.record("A-03", 2, StepStatus::Skipped);

        assert_eq!(report.applied_count(), 1);
        assert!(!report.completed());
        assert_eq!(report.first_failure().unwrap().label, "A-02");
    }
}
