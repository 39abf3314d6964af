//! In-memory collaborators used by the CLI and tests.
//!
//! `InMemoryPipelineStore` serializes units of work per enrollment (and per job when a
//! scope asks for it) and applies staged writes under a single short write lock, so a
//! failed unit of work leaves no trace and unrelated enrollments never wait on each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::domain::{
    Actor, ActorId, Candidate, CandidateId, Enrollment, EnrollmentId, JobId, JobOpening, JobPatch,
    MovementRecord, ReasonId, RejectionReason, RejectionRecord, StageDefinition, StageId,
};
use super::error::PipelineError;
use super::repository::{
    ActorDirectory, CandidateRepository, EnrollmentRepository, EnrollmentTransaction,
    JobRepository, MovementLog, RejectionReasonCatalog, RepositoryError, StageCatalog,
    TransactionScope,
};

type EnrollmentKey = (JobId, CandidateId);
/// One mutex per key, created on first use and kept for the life of the store. The tables
/// hold at most one entry per enrollment or job touched, and this store never deletes either.
type LockTable<K> = Mutex<HashMap<K, Arc<Mutex<()>>>>;

fn poisoned(what: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{what} lock poisoned"))
}

#[derive(Debug, Default)]
struct StoreState {
    jobs: HashMap<JobId, JobOpening>,
    candidates: HashMap<CandidateId, Candidate>,
    enrollments: HashMap<EnrollmentKey, Enrollment>,
    movements: Vec<MovementRecord>,
    rejections: Vec<RejectionRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    state: RwLock<StoreState>,
    enrollment_locks: LockTable<EnrollmentKey>,
    job_locks: LockTable<JobId>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&self, job: JobOpening) -> Result<(), RepositoryError> {
        self.write()?.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn insert_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        self.write()?
            .candidates
            .insert(candidate.id.clone(), candidate);
        Ok(())
    }

    /// Register a new enrollment; enrolling the same candidate twice in a job conflicts.
    pub fn enroll(&self, enrollment: Enrollment) -> Result<(), RepositoryError> {
        let key = (enrollment.job_id.clone(), enrollment.candidate_id.clone());
        let mut state = self.write()?;
        if state.enrollments.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        state.enrollments.insert(key, enrollment);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, RepositoryError> {
        self.state.read().map_err(|_| poisoned("store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, RepositoryError> {
        self.state.write().map_err(|_| poisoned("store"))
    }

    fn commit(&self, key: &EnrollmentKey, staged: StagedWrites) -> Result<(), RepositoryError> {
        let mut state = self.write()?;

        if let Some(patch) = staged.job {
            let job = state.jobs.get_mut(&key.0).ok_or(RepositoryError::NotFound)?;
            job.status = patch.status;
            job.closed_at = patch.closed_at;
        }
        if let Some(enrollment) = staged.enrollment {
            state.enrollments.insert(key.clone(), enrollment);
        }
        state.movements.extend(staged.movements);
        state.rejections.extend(staged.rejections);
        Ok(())
    }
}

/// Fetch or create the mutex for `key`. Entries are never pruned: a handle may be held by a
/// waiter, so dropping it would let two units of work on the same key run at once.
fn lock_handle<K>(table: &LockTable<K>, key: &K) -> Result<Arc<Mutex<()>>, RepositoryError>
where
    K: Eq + Hash + Clone,
{
    let mut table = table.lock().map_err(|_| poisoned("lock table"))?;
    Ok(table.entry(key.clone()).or_default().clone())
}

impl JobRepository for InMemoryPipelineStore {
    fn job(&self, job_id: &JobId) -> Result<Option<JobOpening>, RepositoryError> {
        Ok(self.read()?.jobs.get(job_id).cloned())
    }
}

impl CandidateRepository for InMemoryPipelineStore {
    fn candidate(&self, candidate_id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.read()?.candidates.get(candidate_id).cloned())
    }
}

impl EnrollmentRepository for InMemoryPipelineStore {
    fn enrollment(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let key = (job_id.clone(), candidate_id.clone());
        Ok(self.read()?.enrollments.get(&key).cloned())
    }

    fn enrollments_for_job(&self, job_id: &JobId) -> Result<Vec<Enrollment>, RepositoryError> {
        Ok(self
            .read()?
            .enrollments
            .values()
            .filter(|enrollment| &enrollment.job_id == job_id)
            .cloned()
            .collect())
    }

    fn within_enrollment<T, F>(&self, scope: &TransactionScope, work: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&mut dyn EnrollmentTransaction) -> Result<T, PipelineError>,
    {
        // Lock order is always job, then enrollment.
        let job_lock = if scope.lock_job {
            Some(lock_handle(&self.job_locks, &scope.job_id).map_err(PipelineError::UpdateFailed)?)
        } else {
            None
        };
        let _job_guard = match &job_lock {
            Some(lock) => Some(
                lock.lock()
                    .map_err(|_| PipelineError::UpdateFailed(poisoned("job")))?,
            ),
            None => None,
        };

        let key = (scope.job_id.clone(), scope.candidate_id.clone());
        let enrollment_lock =
            lock_handle(&self.enrollment_locks, &key).map_err(PipelineError::UpdateFailed)?;
        let _enrollment_guard = enrollment_lock
            .lock()
            .map_err(|_| PipelineError::UpdateFailed(poisoned("enrollment")))?;

        let (job, enrollment) = {
            let state = self.read().map_err(PipelineError::UpdateFailed)?;
            (
                state.jobs.get(&scope.job_id).cloned(),
                state.enrollments.get(&key).cloned(),
            )
        };

        let mut tx = MemoryTransaction {
            state: &self.state,
            job_id: scope.job_id.clone(),
            job,
            enrollment,
            staged: StagedWrites::default(),
        };

        let value = work(&mut tx)?;
        self.commit(&key, tx.staged)
            .map_err(PipelineError::UpdateFailed)?;
        Ok(value)
    }
}

impl MovementLog for InMemoryPipelineStore {
    fn movements_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<MovementRecord>, RepositoryError> {
        Ok(self
            .read()?
            .movements
            .iter()
            .filter(|record| &record.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    fn movements_for_enrollment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<MovementRecord>, RepositoryError> {
        Ok(self
            .read()?
            .movements
            .iter()
            .filter(|record| &record.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    fn rejections_for_enrollment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<RejectionRecord>, RepositoryError> {
        Ok(self
            .read()?
            .rejections
            .iter()
            .filter(|record| &record.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct StagedWrites {
    enrollment: Option<Enrollment>,
    movements: Vec<MovementRecord>,
    rejections: Vec<RejectionRecord>,
    job: Option<JobPatch>,
}

struct MemoryTransaction<'s> {
    state: &'s RwLock<StoreState>,
    job_id: JobId,
    job: Option<JobOpening>,
    enrollment: Option<Enrollment>,
    staged: StagedWrites,
}

impl EnrollmentTransaction for MemoryTransaction<'_> {
    fn job(&self) -> Option<&JobOpening> {
        self.job.as_ref()
    }

    fn enrollment(&self) -> Option<&Enrollment> {
        self.enrollment.as_ref()
    }

    fn update_enrollment(&mut self, enrollment: Enrollment) -> Result<(), RepositoryError> {
        match &self.enrollment {
            Some(current) if current.id == enrollment.id => {
                self.enrollment = Some(enrollment.clone());
                self.staged.enrollment = Some(enrollment);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn append_movement(&mut self, record: MovementRecord) -> Result<(), RepositoryError> {
        self.staged.movements.push(record);
        Ok(())
    }

    fn append_rejection(&mut self, record: RejectionRecord) -> Result<(), RepositoryError> {
        self.staged.rejections.push(record);
        Ok(())
    }

    fn count_at_stage(&self, stage_id: &StageId) -> Result<usize, RepositoryError> {
        let state = self.state.read().map_err(|_| poisoned("store"))?;
        let staged = self.staged.enrollment.as_ref();
        Ok(state
            .enrollments
            .values()
            .filter(|enrollment| enrollment.job_id == self.job_id)
            .map(|enrollment| match staged {
                Some(pending) if pending.id == enrollment.id => pending,
                _ => enrollment,
            })
            .filter(|enrollment| &enrollment.current_stage_id == stage_id)
            .count())
    }

    fn update_job(&mut self, patch: JobPatch) -> Result<(), RepositoryError> {
        let job = self.job.as_mut().ok_or(RepositoryError::NotFound)?;
        job.status = patch.status;
        job.closed_at = patch.closed_at;
        self.staged.job = Some(patch);
        Ok(())
    }
}

/// Stage catalogs keyed by job.
#[derive(Debug, Default)]
pub struct InMemoryStageCatalog {
    stages: Mutex<HashMap<JobId, Vec<StageDefinition>>>,
}

impl InMemoryStageCatalog {
    pub fn from_stages(stages: impl IntoIterator<Item = StageDefinition>) -> Self {
        let mut by_job: HashMap<JobId, Vec<StageDefinition>> = HashMap::new();
        for stage in stages {
            by_job.entry(stage.job_id.clone()).or_default().push(stage);
        }
        Self {
            stages: Mutex::new(by_job),
        }
    }

    pub fn insert(&self, stage: StageDefinition) -> Result<(), RepositoryError> {
        let mut guard = self.stages.lock().map_err(|_| poisoned("stage catalog"))?;
        let stages = guard.entry(stage.job_id.clone()).or_default();
        stages.retain(|existing| existing.id != stage.id);
        stages.push(stage);
        Ok(())
    }
}

impl StageCatalog for InMemoryStageCatalog {
    fn stage(
        &self,
        job_id: &JobId,
        stage_id: &StageId,
    ) -> Result<Option<StageDefinition>, RepositoryError> {
        let guard = self.stages.lock().map_err(|_| poisoned("stage catalog"))?;
        Ok(guard
            .get(job_id)
            .and_then(|stages| stages.iter().find(|stage| &stage.id == stage_id))
            .cloned())
    }

    fn stages(&self, job_id: &JobId) -> Result<Vec<StageDefinition>, RepositoryError> {
        let guard = self.stages.lock().map_err(|_| poisoned("stage catalog"))?;
        let mut stages = guard.get(job_id).cloned().unwrap_or_default();
        stages.sort_by_key(|stage| stage.position);
        Ok(stages)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryActorDirectory {
    actors: Mutex<HashMap<ActorId, Actor>>,
}

impl InMemoryActorDirectory {
    pub fn from_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        Self {
            actors: Mutex::new(
                actors
                    .into_iter()
                    .map(|actor| (actor.id.clone(), actor))
                    .collect(),
            ),
        }
    }
}

impl ActorDirectory for InMemoryActorDirectory {
    fn resolve(&self, actor_id: &ActorId) -> Result<Option<Actor>, RepositoryError> {
        let guard = self.actors.lock().map_err(|_| poisoned("actor directory"))?;
        Ok(guard.get(actor_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReasonCatalog {
    reasons: Mutex<HashMap<ReasonId, RejectionReason>>,
}

impl InMemoryReasonCatalog {
    pub fn from_reasons(reasons: impl IntoIterator<Item = RejectionReason>) -> Self {
        Self {
            reasons: Mutex::new(
                reasons
                    .into_iter()
                    .map(|reason| (reason.id.clone(), reason))
                    .collect(),
            ),
        }
    }
}

impl RejectionReasonCatalog for InMemoryReasonCatalog {
    fn reason(&self, reason_id: &ReasonId) -> Result<Option<RejectionReason>, RepositoryError> {
        let guard = self.reasons.lock().map_err(|_| poisoned("reason catalog"))?;
        Ok(guard.get(reason_id).cloned())
    }
}
