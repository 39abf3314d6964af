//! Candidate pipeline transition engine.
//!
//! Moves an enrolled candidate between the stages of a job's pipeline. A movement passes the
//! [`AccessGuard`], then the rules in [`validation`], and is finally applied by the
//! [`MovementExecutor`] inside one enrollment transaction: enrollment update, audit record,
//! rejection record, and headcount closure commit together or not at all. Engagement events
//! are queued on the [`HookDispatcher`] after commit and delivered by a separate worker.

pub mod access;
pub mod audit;
pub mod domain;
mod error;
pub mod executor;
pub mod hooks;
pub mod memory;
pub mod repository;
pub mod service;
pub mod stats;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access::{AccessGuard, AccessPolicy, AuthorizedTransition};
pub use domain::{
    Actor, ActorId, ActorRole, Candidate, CandidateId, CandidateStatus, CompanyId, Enrollment,
    EnrollmentId, JobId, JobOpening, JobPatch, JobStatus, MoveRequest, MovementId,
    MovementOrigin, MovementRecord, ReasonId, RejectionPayload, RejectionReason,
    RejectionRecord, RequiredField, StageDefinition, StageId,
};
pub use error::{DenialKind, PipelineError, PipelineErrorView};
pub use executor::{headcount_closure, Clock, MovementExecutor, MovementOutcome, SystemClock};
pub use hooks::{EngagementEvent, EngagementEventSink, HookDispatcher, HookWorker, SinkError};
pub use memory::{
    InMemoryActorDirectory, InMemoryPipelineStore, InMemoryReasonCatalog, InMemoryStageCatalog,
};
pub use repository::{
    ActorDirectory, CandidateRepository, EnrollmentRepository, EnrollmentTransaction,
    JobRepository, MovementLog, PipelineStore, RejectionReasonCatalog, RepositoryError,
    StageCatalog, TransactionScope,
};
pub use service::{PipelineCatalogs, PipelineService};
pub use stats::{PipelineStats, StageConversion, StageCount};
