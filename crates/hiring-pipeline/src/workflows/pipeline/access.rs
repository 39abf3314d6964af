use std::collections::BTreeSet;

use crate::config::PipelineConfig;

use super::domain::{Actor, ActorRole, JobId, JobOpening, StageDefinition, StageId};
use super::error::{DenialKind, PipelineError};
use super::repository::{JobRepository, StageCatalog};

/// Roles allowed to move candidates, outside of super-admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    privileged_roles: BTreeSet<ActorRole>,
}

impl AccessPolicy {
    pub fn new(privileged_roles: impl IntoIterator<Item = ActorRole>) -> Self {
        Self {
            privileged_roles: privileged_roles.into_iter().collect(),
        }
    }

    pub fn allows(&self, role: ActorRole) -> bool {
        role == ActorRole::SuperAdmin || self.privileged_roles.contains(&role)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new([ActorRole::Admin, ActorRole::Recruiter])
    }
}

impl From<&PipelineConfig> for AccessPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(config.privileged_roles.iter().copied())
    }
}

/// What an actor may do once the role check passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    /// Super-admin: exempt from scope, ownership, and stage-responsibility checks.
    Unrestricted,
    CompanyScoped,
}

/// Job and target stage that passed every authorization layer.
#[derive(Debug, Clone)]
pub struct AuthorizedTransition {
    pub job: JobOpening,
    pub target: StageDefinition,
}

/// Authorizes actors against jobs and stages. Pure reads only.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    policy: AccessPolicy,
}

impl AccessGuard {
    pub fn with_policy(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_policy(AccessPolicy::from(config))
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Check role, company scope, job ownership, and target-stage responsibility, in that order.
    ///
    /// Lookups happen only once the preceding layer passed, so a refused role never
    /// touches the job or stage catalog.
    pub fn authorize(
        &self,
        actor: &Actor,
        job_id: &JobId,
        target_stage_id: &StageId,
        jobs: &dyn JobRepository,
        stages: &dyn StageCatalog,
    ) -> Result<AuthorizedTransition, PipelineError> {
        let capability = self.capability(actor)?;

        let job = jobs.job(job_id)?.ok_or_else(|| PipelineError::JobNotFound {
            job_id: job_id.clone(),
        })?;

        if capability == Capability::CompanyScoped {
            self.check_scope(actor, &job)?;
            self.check_ownership(actor, &job)?;
        }

        let target = stages
            .stage(job_id, target_stage_id)?
            .ok_or_else(|| PipelineError::InvalidStage {
                job_id: job_id.clone(),
                stage_id: target_stage_id.clone(),
            })?;

        if capability == Capability::CompanyScoped {
            self.check_stage(actor, &target)?;
        }

        Ok(AuthorizedTransition { job, target })
    }

    /// Whether the actor may read records belonging to `job`.
    pub fn can_view(&self, actor: &Actor, job: &JobOpening) -> bool {
        actor.is_super_admin() || actor.company_id.as_ref() == Some(&job.company_id)
    }

    fn capability(&self, actor: &Actor) -> Result<Capability, PipelineError> {
        if actor.is_super_admin() {
            return Ok(Capability::Unrestricted);
        }

        if !self.policy.allows(actor.role) {
            return Err(PipelineError::denied(
                DenialKind::Role,
                format!("role '{}' may not move candidates", actor.role.label()),
            ));
        }

        Ok(Capability::CompanyScoped)
    }

    fn check_scope(&self, actor: &Actor, job: &JobOpening) -> Result<(), PipelineError> {
        if actor.company_id.as_ref() == Some(&job.company_id) {
            return Ok(());
        }

        Err(PipelineError::denied(
            DenialKind::Scope,
            format!("job {} belongs to another company", job.id),
        ))
    }

    fn check_ownership(&self, actor: &Actor, job: &JobOpening) -> Result<(), PipelineError> {
        match &job.owner_id {
            Some(owner) if owner != &actor.id => Err(PipelineError::denied(
                DenialKind::Ownership,
                format!("job {} is assigned to another recruiter", job.id),
            )),
            _ => Ok(()),
        }
    }

    fn check_stage(&self, actor: &Actor, target: &StageDefinition) -> Result<(), PipelineError> {
        if target.responsible_actor_ids.is_empty()
            || target.responsible_actor_ids.contains(&actor.id)
        {
            return Ok(());
        }

        Err(PipelineError::denied(
            DenialKind::Stage,
            format!("actor is not responsible for stage '{}'", target.display_name),
        ))
    }
}
