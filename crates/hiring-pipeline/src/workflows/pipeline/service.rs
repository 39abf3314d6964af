use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::PipelineConfig;

use super::access::{AccessGuard, AuthorizedTransition};
use super::audit::visible_history;
use super::domain::{Actor, ActorId, CandidateId, JobId, MoveRequest, MovementRecord};
use super::error::{DenialKind, PipelineError};
use super::executor::{Clock, MovementExecutor, MovementOutcome, MovementPlan};
use super::hooks::HookDispatcher;
use super::repository::{
    ActorDirectory, PipelineStore, RejectionReasonCatalog, StageCatalog, TransactionScope,
};
use super::stats::PipelineStats;
use super::validation::{validate, TransitionContext};

/// Read-only lookups the engine consults but never writes.
#[derive(Clone)]
pub struct PipelineCatalogs {
    pub stages: Arc<dyn StageCatalog>,
    pub actors: Arc<dyn ActorDirectory>,
    pub reasons: Arc<dyn RejectionReasonCatalog>,
}

/// Service composing the access guard, validator, movement executor, and hook dispatcher.
pub struct PipelineService<S> {
    store: Arc<S>,
    catalogs: PipelineCatalogs,
    guard: AccessGuard,
    executor: MovementExecutor,
    hooks: HookDispatcher,
}

impl<S> PipelineService<S>
where
    S: PipelineStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        catalogs: PipelineCatalogs,
        hooks: HookDispatcher,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            catalogs,
            guard: AccessGuard::from_config(config),
            executor: MovementExecutor::default(),
            hooks,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.executor = MovementExecutor::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Move a candidate to another stage of a job's pipeline.
    ///
    /// Authorization failures short-circuit before any validation runs. Validation and the
    /// writes happen under the enrollment lock, so concurrent moves of one enrollment chain
    /// their audit records instead of overwriting each other. The engagement hook fires only
    /// after commit and can never fail the call.
    pub fn move_candidate(&self, request: MoveRequest) -> Result<MovementOutcome, PipelineError> {
        let result = self.try_move(&request);

        match &result {
            Ok(outcome) => {
                info!(
                    job_id = %request.job_id,
                    candidate_id = %request.candidate_id,
                    actor_id = %request.actor_id,
                    from = ?outcome.movement.previous_stage_id.as_ref().map(|id| id.as_str()),
                    to = %outcome.movement.new_stage_id,
                    "candidate moved"
                );
                if outcome.job_closure.is_some() {
                    info!(job_id = %request.job_id, "headcount reached; job filled");
                }
                self.hooks
                    .notify(&outcome.movement, outcome.rejection.is_some());
            }
            Err(err @ (PipelineError::UpdateFailed(_) | PipelineError::Storage(_))) => {
                error!(
                    job_id = %request.job_id,
                    candidate_id = %request.candidate_id,
                    error = %err,
                    "movement failed"
                );
            }
            Err(err) => {
                debug!(
                    job_id = %request.job_id,
                    candidate_id = %request.candidate_id,
                    actor_id = %request.actor_id,
                    code = err.code(),
                    "movement refused"
                );
            }
        }

        result
    }

    fn try_move(&self, request: &MoveRequest) -> Result<MovementOutcome, PipelineError> {
        let actor = self.resolve_actor(&request.actor_id)?;
        let AuthorizedTransition { job, target } = self.guard.authorize(
            &actor,
            &request.job_id,
            &request.target_stage_id,
            self.store.as_ref(),
            self.catalogs.stages.as_ref(),
        )?;

        let candidate = self
            .store
            .candidate(&request.candidate_id)?
            .ok_or_else(|| PipelineError::CandidateNotFound {
                candidate_id: request.candidate_id.clone(),
            })?;

        let requested_reason = request
            .rejection
            .as_ref()
            .and_then(|payload| payload.reason_id.as_ref());
        let rejection_reason = match requested_reason {
            Some(reason_id) if target.is_rejection_stage => {
                self.catalogs.reasons.reason(reason_id)?
            }
            _ => None,
        };

        let scope = TransactionScope {
            job_id: request.job_id.clone(),
            candidate_id: request.candidate_id.clone(),
            lock_job: target.is_hire_stage,
        };

        self.store.within_enrollment(&scope, |tx| {
            let job = tx.job().cloned().unwrap_or(job);
            let enrollment = tx.enrollment().cloned();
            let current_stage = match &enrollment {
                Some(enrollment) => self
                    .catalogs
                    .stages
                    .stage(&enrollment.job_id, &enrollment.current_stage_id)
                    .map_err(PipelineError::UpdateFailed)?,
                None => None,
            };

            let context = TransitionContext {
                job: &job,
                candidate: &candidate,
                enrollment: enrollment.as_ref(),
                current_stage: current_stage.as_ref(),
                target: &target,
                rejection_reason: rejection_reason.as_ref(),
            };
            let enrollment = validate(&context, request)?;

            self.executor.execute(
                tx,
                MovementPlan {
                    enrollment,
                    job: &job,
                    target: &target,
                    actor_id: &actor.id,
                    request,
                    rejection_reason: rejection_reason.as_ref(),
                },
            )
        })
    }

    /// Movement records of a candidate visible to the actor, oldest first.
    pub fn movement_history(
        &self,
        candidate_id: &CandidateId,
        actor_id: &ActorId,
    ) -> Result<Vec<MovementRecord>, PipelineError> {
        let actor = self.resolve_actor(actor_id)?;
        let records = self.store.movements_for_candidate(candidate_id)?;
        visible_history(&self.guard, &actor, records, self.store.as_ref())
    }

    /// Stage distribution and funnel conversion of a job's current enrollments.
    pub fn pipeline_stats(&self, job_id: &JobId) -> Result<PipelineStats, PipelineError> {
        if self.store.job(job_id)?.is_none() {
            return Err(PipelineError::JobNotFound {
                job_id: job_id.clone(),
            });
        }

        let stages = self.catalogs.stages.stages(job_id)?;
        let enrollments = self.store.enrollments_for_job(job_id)?;
        Ok(PipelineStats::compute(job_id, &stages, &enrollments))
    }

    fn resolve_actor(&self, actor_id: &ActorId) -> Result<Actor, PipelineError> {
        self.catalogs.actors.resolve(actor_id)?.ok_or_else(|| {
            PipelineError::denied(DenialKind::Role, format!("unknown actor {actor_id}"))
        })
    }
}
