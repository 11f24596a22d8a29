use chrono::NaiveDate;

/// Input-validation failures. All are recoverable: fix the input and run the analysis again.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid resource '{resource_id}': {reason}")]
    InvalidResource { resource_id: String, reason: String },

    #[error("invalid allocation of task '{task_id}' to resource '{resource_id}': {reason}")]
    InvalidAllocation {
        task_id: String,
        resource_id: String,
        reason: String,
    },

    #[error("analysis range end {end} is before range start {start}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("analysis range spans {days} days which exceeds the configured maximum of {max}")]
    RangeTooLarge { days: i64, max: i64 },
}

impl AnalysisError {
    pub(crate) fn resource(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidResource {
            resource_id: resource_id.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn allocation(
        task_id: impl Into<String>,
        resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AnalysisError::InvalidAllocation {
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            reason: reason.into(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
