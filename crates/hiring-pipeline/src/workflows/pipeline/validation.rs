//! Business rules a transition must satisfy once the actor is authorized.
//!
//! Each rule is a pure function over the transition context; [`validate`] runs them in
//! order and the first failure wins.

use super::domain::{
    Candidate, CandidateStatus, Enrollment, JobOpening, MoveRequest, RejectionReason,
    RequiredField, StageDefinition,
};
use super::error::PipelineError;

pub const SCORE_MIN: f32 = 0.0;
pub const SCORE_MAX: f32 = 10.0;

/// State the rules are evaluated against, read under the enrollment lock.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub job: &'a JobOpening,
    pub candidate: &'a Candidate,
    pub enrollment: Option<&'a Enrollment>,
    /// Catalog entry for the enrollment's current stage, if it resolved.
    pub current_stage: Option<&'a StageDefinition>,
    pub target: &'a StageDefinition,
    /// Catalog entry for the rejection reason id in the request, if any resolved.
    pub rejection_reason: Option<&'a RejectionReason>,
}

/// Run every rule in order and hand back the enrollment being moved.
pub fn validate<'a>(
    context: &TransitionContext<'a>,
    request: &MoveRequest,
) -> Result<&'a Enrollment, PipelineError> {
    check_score(request)?;
    check_job_active(context.job)?;
    check_candidate_active(context.candidate)?;
    let enrollment = check_enrolled(context, request)?;
    let current = context
        .current_stage
        .ok_or_else(|| PipelineError::InvalidStage {
            job_id: enrollment.job_id.clone(),
            stage_id: enrollment.current_stage_id.clone(),
        })?;
    check_exit_requirements(current, request)?;
    check_stage_changes(enrollment, context.target)?;
    check_rejection_reason(context.target, context.rejection_reason, request)?;
    Ok(enrollment)
}

pub fn check_score(request: &MoveRequest) -> Result<(), PipelineError> {
    match request.score {
        Some(score) if !(SCORE_MIN..=SCORE_MAX).contains(&score) => {
            Err(PipelineError::InvalidNote { score })
        }
        _ => Ok(()),
    }
}

pub fn check_job_active(job: &JobOpening) -> Result<(), PipelineError> {
    if job.status.accepts_movements() {
        Ok(())
    } else {
        Err(PipelineError::JobInactive {
            job_id: job.id.clone(),
            status: job.status,
        })
    }
}

pub fn check_candidate_active(candidate: &Candidate) -> Result<(), PipelineError> {
    match candidate.status {
        CandidateStatus::Active => Ok(()),
        CandidateStatus::Inactive => Err(PipelineError::CandidateInactive {
            candidate_id: candidate.id.clone(),
        }),
    }
}

fn check_enrolled<'a>(
    context: &TransitionContext<'a>,
    request: &MoveRequest,
) -> Result<&'a Enrollment, PipelineError> {
    context
        .enrollment
        .ok_or_else(|| PipelineError::CandidateNotEnrolled {
            job_id: request.job_id.clone(),
            candidate_id: request.candidate_id.clone(),
        })
}

/// Required fields belong to the stage being left, not the one being entered.
pub fn check_exit_requirements(
    current: &StageDefinition,
    request: &MoveRequest,
) -> Result<(), PipelineError> {
    let missing = current
        .required_fields
        .iter()
        .copied()
        .find(|field| match field {
            RequiredField::Comment => request.comment_text().is_none(),
            RequiredField::Score => request.score.is_none(),
        });

    match missing {
        Some(field) => Err(PipelineError::MissingRequiredField {
            field,
            stage_id: current.id.clone(),
        }),
        None => Ok(()),
    }
}

pub fn check_stage_changes(
    enrollment: &Enrollment,
    target: &StageDefinition,
) -> Result<(), PipelineError> {
    if enrollment.current_stage_id == target.id {
        Err(PipelineError::NoMovementNeeded {
            stage_id: target.id.clone(),
        })
    } else {
        Ok(())
    }
}

/// A rejection stage needs either a catalog reason that resolved or non-blank custom text.
pub fn check_rejection_reason(
    target: &StageDefinition,
    resolved: Option<&RejectionReason>,
    request: &MoveRequest,
) -> Result<(), PipelineError> {
    if !target.is_rejection_stage {
        return Ok(());
    }

    let satisfied = request.rejection.as_ref().is_some_and(|payload| {
        let catalog_reason = match (&payload.reason_id, resolved) {
            (Some(requested), Some(reason)) => requested == &reason.id,
            _ => false,
        };
        catalog_reason || payload.custom_reason_text().is_some()
    });

    if satisfied {
        Ok(())
    } else {
        Err(PipelineError::MissingRejectionReason {
            stage_id: target.id.clone(),
        })
    }
}
