use super::domain::{
    Actor, ActorId, Candidate, CandidateId, Enrollment, EnrollmentId, JobId, JobOpening, JobPatch,
    MovementRecord, ReasonId, RejectionReason, RejectionRecord, StageDefinition, StageId,
};
use super::error::PipelineError;

/// Read-only lookup of the per-job stage catalog.
pub trait StageCatalog: Send + Sync {
    fn stage(
        &self,
        job_id: &JobId,
        stage_id: &StageId,
    ) -> Result<Option<StageDefinition>, RepositoryError>;

    /// Stages of the job sorted by `position`.
    fn stages(&self, job_id: &JobId) -> Result<Vec<StageDefinition>, RepositoryError>;
}

/// Resolves an acting identity to role and company affiliation.
pub trait ActorDirectory: Send + Sync {
    fn resolve(&self, actor_id: &ActorId) -> Result<Option<Actor>, RepositoryError>;
}

/// Lookup of canned rejection reasons.
pub trait RejectionReasonCatalog: Send + Sync {
    fn reason(&self, reason_id: &ReasonId) -> Result<Option<RejectionReason>, RepositoryError>;
}

pub trait JobRepository: Send + Sync {
    fn job(&self, job_id: &JobId) -> Result<Option<JobOpening>, RepositoryError>;
}

pub trait CandidateRepository: Send + Sync {
    fn candidate(&self, candidate_id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
}

/// Identifies the rows a movement locks for the duration of its unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionScope {
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    /// Also lock the job row. Required when the movement may close the job, so that
    /// concurrent hires observe each other when counting against the headcount.
    pub lock_job: bool,
}

/// Staged view of one enrollment inside a unit of work.
///
/// Reads reflect the state at the time the lock was taken plus the writes staged so far.
/// Nothing is visible to other callers until the owning `within_enrollment` call commits.
pub trait EnrollmentTransaction {
    fn job(&self) -> Option<&JobOpening>;
    fn enrollment(&self) -> Option<&Enrollment>;
    fn update_enrollment(&mut self, enrollment: Enrollment) -> Result<(), RepositoryError>;
    fn append_movement(&mut self, record: MovementRecord) -> Result<(), RepositoryError>;
    fn append_rejection(&mut self, record: RejectionRecord) -> Result<(), RepositoryError>;
    /// Enrollments of the scoped job currently at `stage_id`, staged writes included.
    fn count_at_stage(&self, stage_id: &StageId) -> Result<usize, RepositoryError>;
    fn update_job(&mut self, patch: JobPatch) -> Result<(), RepositoryError>;
}

pub trait EnrollmentRepository: Send + Sync {
    fn enrollment(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<Option<Enrollment>, RepositoryError>;

    fn enrollments_for_job(&self, job_id: &JobId) -> Result<Vec<Enrollment>, RepositoryError>;

    /// Run `work` with exclusive access to the scoped enrollment.
    ///
    /// Writes staged through the transaction commit atomically when `work` returns `Ok`
    /// and are discarded when it returns `Err`. A failing commit is reported as
    /// [`PipelineError::UpdateFailed`].
    fn within_enrollment<T, F>(&self, scope: &TransactionScope, work: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&mut dyn EnrollmentTransaction) -> Result<T, PipelineError>;
}

/// Read side of the append-only audit log.
pub trait MovementLog: Send + Sync {
    /// Records for the candidate across all jobs, in insertion order.
    fn movements_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<MovementRecord>, RepositoryError>;

    fn movements_for_enrollment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<MovementRecord>, RepositoryError>;

    fn rejections_for_enrollment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<RejectionRecord>, RepositoryError>;
}

/// Everything the engine persists, usually backed by one database.
pub trait PipelineStore:
    JobRepository + CandidateRepository + EnrollmentRepository + MovementLog
{
}

impl<T> PipelineStore for T where
    T: JobRepository + CandidateRepository + EnrollmentRepository + MovementLog
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
