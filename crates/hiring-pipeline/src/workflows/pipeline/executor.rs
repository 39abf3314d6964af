use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    ActorId, Enrollment, JobOpening, JobPatch, JobStatus, MoveRequest, MovementId,
    MovementRecord, RejectionReason, RejectionRecord, StageDefinition,
};
use super::error::PipelineError;
use super::repository::EnrollmentTransaction;

/// Source of timestamps for movements and closures.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

static MOVEMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_movement_id() -> MovementId {
    let id = MOVEMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MovementId(format!("mov-{id:06}"))
}

/// Validated inputs for one movement.
#[derive(Debug, Clone, Copy)]
pub struct MovementPlan<'a> {
    pub enrollment: &'a Enrollment,
    pub job: &'a JobOpening,
    pub target: &'a StageDefinition,
    pub actor_id: &'a ActorId,
    pub request: &'a MoveRequest,
    pub rejection_reason: Option<&'a RejectionReason>,
}

/// Everything a committed movement wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementOutcome {
    pub enrollment: Enrollment,
    pub movement: MovementRecord,
    pub rejection: Option<RejectionRecord>,
    /// Set when this movement filled the job's headcount.
    pub job_closure: Option<JobPatch>,
}

/// Decide whether a hire closes the job.
///
/// A job fills once the hires reach its headcount, and only the first time: jobs that are
/// already filled keep their original closure timestamp. A zero headcount never closes.
pub fn headcount_closure(
    job: &JobOpening,
    hired: usize,
    now: DateTime<Utc>,
) -> Option<JobPatch> {
    if job.headcount == 0 || job.status != JobStatus::Open {
        return None;
    }

    if hired < job.headcount as usize {
        return None;
    }

    Some(JobPatch {
        status: JobStatus::Filled,
        closed_at: Some(now),
    })
}

/// Applies a validated movement through an open enrollment transaction.
pub struct MovementExecutor {
    clock: Arc<dyn Clock>,
}

impl Default for MovementExecutor {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MovementExecutor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Stage the enrollment update, audit record, optional rejection record, and optional
    /// job closure. Any write failure aborts the unit of work as `UpdateFailed`.
    pub fn execute(
        &self,
        tx: &mut dyn EnrollmentTransaction,
        plan: MovementPlan<'_>,
    ) -> Result<MovementOutcome, PipelineError> {
        let now = self.clock.now();
        let MovementPlan {
            enrollment,
            job,
            target,
            actor_id,
            request,
            rejection_reason,
        } = plan;

        let previous_stage_id = enrollment.current_stage_id.clone();

        let mut updated = enrollment.clone();
        updated.current_stage_id = target.id.clone();
        if let Some(score) = request.score {
            updated.score = Some(score);
        }
        if let Some(comments) = &request.comments {
            updated.comments = Some(comments.clone());
        }
        updated.responsible_actor_id = Some(actor_id.clone());
        updated.last_moved_at = Some(now);

        tx.update_enrollment(updated.clone())
            .map_err(PipelineError::UpdateFailed)?;

        let movement = MovementRecord {
            id: next_movement_id(),
            enrollment_id: enrollment.id.clone(),
            job_id: enrollment.job_id.clone(),
            candidate_id: enrollment.candidate_id.clone(),
            previous_stage_id: Some(previous_stage_id.clone()),
            new_stage_id: target.id.clone(),
            score: request.score,
            comments: request.comments.clone(),
            actor_id: actor_id.clone(),
            moved_at: now,
            origin: request.origin.clone(),
        };
        tx.append_movement(movement.clone())
            .map_err(PipelineError::UpdateFailed)?;

        let rejection = match (&request.rejection, target.is_rejection_stage) {
            (Some(payload), true) => {
                let record = RejectionRecord {
                    enrollment_id: enrollment.id.clone(),
                    reason_id: payload.reason_id.clone(),
                    reason_label: rejection_reason.map(|reason| reason.label.clone()),
                    custom_reason: payload.custom_reason_text().map(str::to_string),
                    observations: payload.observations.clone(),
                    stage_at_rejection: previous_stage_id,
                    actor_id: actor_id.clone(),
                    rejected_at: now,
                };
                tx.append_rejection(record.clone())
                    .map_err(PipelineError::UpdateFailed)?;
                Some(record)
            }
            (Some(_), false) => {
                tracing::debug!(
                    stage = %target.id,
                    "ignoring rejection payload for non-rejection stage"
                );
                None
            }
            (None, _) => None,
        };

        let job_closure = if target.is_hire_stage {
            let hired = tx
                .count_at_stage(&target.id)
                .map_err(PipelineError::UpdateFailed)?;
            let current_job = tx.job().unwrap_or(job);
            let closure = headcount_closure(current_job, hired, now);
            if let Some(patch) = &closure {
                tx.update_job(patch.clone())
                    .map_err(PipelineError::UpdateFailed)?;
            }
            closure
        } else {
            None
        };

        Ok(MovementOutcome {
            enrollment: updated,
            movement,
            rejection,
            job_closure,
        })
    }
}
