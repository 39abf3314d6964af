use std::fmt;

use serde::Serialize;

use super::domain::{CandidateId, JobId, JobStatus, RequiredField, StageId};
use super::repository::RepositoryError;

/// Which authorization layer refused the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Role,
    Scope,
    Ownership,
    Stage,
}

impl DenialKind {
    pub const fn label(self) -> &'static str {
        match self {
            DenialKind::Role => "role",
            DenialKind::Scope => "scope",
            DenialKind::Ownership => "ownership",
            DenialKind::Stage => "stage",
        }
    }
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed failure of a pipeline operation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("permission denied ({kind}): {detail}")]
    PermissionDenied { kind: DenialKind, detail: String },
    #[error("job {job_id} not found")]
    JobNotFound { job_id: JobId },
    #[error("job {job_id} is {} and no longer accepts movements", .status.label())]
    JobInactive { job_id: JobId, status: JobStatus },
    #[error("candidate {candidate_id} not found")]
    CandidateNotFound { candidate_id: CandidateId },
    #[error("candidate {candidate_id} is inactive")]
    CandidateInactive { candidate_id: CandidateId },
    #[error("candidate {candidate_id} is not enrolled in job {job_id}")]
    CandidateNotEnrolled {
        job_id: JobId,
        candidate_id: CandidateId,
    },
    #[error("stage {stage_id} does not exist for job {job_id}")]
    InvalidStage { job_id: JobId, stage_id: StageId },
    #[error("score {score} is outside the 0-10 range")]
    InvalidNote { score: f32 },
    #[error("field '{field}' is required before leaving stage {stage_id}")]
    MissingRequiredField {
        field: RequiredField,
        stage_id: StageId,
    },
    #[error("moving into rejection stage {stage_id} requires a rejection reason")]
    MissingRejectionReason { stage_id: StageId },
    #[error("candidate is already at stage {stage_id}")]
    NoMovementNeeded { stage_id: StageId },
    #[error("movement could not be committed: {0}")]
    UpdateFailed(#[source] RepositoryError),
    #[error("pipeline storage unavailable: {0}")]
    Storage(#[from] RepositoryError),
}

impl PipelineError {
    pub(crate) fn denied(kind: DenialKind, detail: impl Into<String>) -> Self {
        PipelineError::PermissionDenied {
            kind,
            detail: detail.into(),
        }
    }

    /// Stable upper-case kind used by calling layers to pick a user-facing message.
    pub const fn code(&self) -> &'static str {
        match self {
            PipelineError::PermissionDenied { .. } => "PERMISSION_DENIED",
            PipelineError::JobNotFound { .. } => "JOB_NOT_FOUND",
            PipelineError::JobInactive { .. } => "JOB_INACTIVE",
            PipelineError::CandidateNotFound { .. } => "CANDIDATE_NOT_FOUND",
            PipelineError::CandidateInactive { .. } => "CANDIDATE_INACTIVE",
            PipelineError::CandidateNotEnrolled { .. } => "CANDIDATE_NOT_ENROLLED",
            PipelineError::InvalidStage { .. } => "INVALID_STAGE",
            PipelineError::InvalidNote { .. } => "INVALID_NOTE",
            PipelineError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            PipelineError::MissingRejectionReason { .. } => "MISSING_REJECTION_REASON",
            PipelineError::NoMovementNeeded { .. } => "NO_MOVEMENT_NEEDED",
            PipelineError::UpdateFailed(_) => "UPDATE_FAILED",
            PipelineError::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }

    pub fn field(&self) -> Option<RequiredField> {
        match self {
            PipelineError::MissingRequiredField { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub fn denial_kind(&self) -> Option<DenialKind> {
        match self {
            PipelineError::PermissionDenied { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn view(&self) -> PipelineErrorView {
        PipelineErrorView {
            code: self.code(),
            message: self.to_string(),
            field: self.field().map(RequiredField::label),
            denial: self.denial_kind(),
        }
    }
}

/// Serializable error payload for calling layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineErrorView {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialKind>,
}
