use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::domain::{
    ActorId, CandidateId, EnrollmentId, JobId, MovementId, MovementRecord, StageId,
};

/// Post-movement notification for engagement tracking (dwell time, funnels, SLA breaches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub movement_id: MovementId,
    pub enrollment_id: EnrollmentId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub previous_stage_id: Option<StageId>,
    pub new_stage_id: StageId,
    pub actor_id: ActorId,
    pub rejected: bool,
    pub comments: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn from_movement(record: &MovementRecord, rejected: bool) -> Self {
        Self {
            movement_id: record.id.clone(),
            enrollment_id: record.enrollment_id.clone(),
            job_id: record.job_id.clone(),
            candidate_id: record.candidate_id.clone(),
            previous_stage_id: record.previous_stage_id.clone(),
            new_stage_id: record.new_stage_id.clone(),
            actor_id: record.actor_id.clone(),
            rejected,
            comments: record.comments.clone(),
            occurred_at: record.moved_at,
        }
    }
}

/// Outbound collaborator receiving engagement events.
pub trait EngagementEventSink: Send + Sync {
    fn publish(&self, event: &EngagementEvent) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("engagement transport unavailable: {0}")]
    Transport(String),
    #[error("engagement event rejected: {0}")]
    Rejected(String),
}

/// Enqueues engagement events after a movement commits. Never blocks and never fails
/// the caller; events that cannot be queued are logged and dropped.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    sender: Option<mpsc::Sender<EngagementEvent>>,
}

impl HookDispatcher {
    /// Dispatcher plus the worker that drains it into `sink`.
    pub fn channel(capacity: usize, sink: Arc<dyn EngagementEventSink>) -> (Self, HookWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            HookWorker { receiver, sink },
        )
    }

    /// Dispatcher that drops every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn notify(&self, record: &MovementRecord, rejected: bool) {
        let Some(sender) = &self.sender else {
            return;
        };

        let event = EngagementEvent::from_movement(record, rejected);
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!(
                movement_id = %event.movement_id,
                job_id = %event.job_id,
                "engagement queue full; dropping event"
            ),
            Err(TrySendError::Closed(event)) => warn!(
                movement_id = %event.movement_id,
                job_id = %event.job_id,
                "engagement worker stopped; dropping event"
            ),
        }
    }
}

/// Consumes queued events until every dispatcher is dropped.
pub struct HookWorker {
    receiver: mpsc::Receiver<EngagementEvent>,
    sink: Arc<dyn EngagementEventSink>,
}

impl HookWorker {
    /// Drain the queue, returning how many events the sink accepted. Sink errors and
    /// panics are logged per event and do not stop the worker.
    pub async fn run(mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.receiver.recv().await {
            if self.deliver(&event) {
                delivered += 1;
            }
        }
        debug!(delivered, "engagement worker stopped");
        delivered
    }

    fn deliver(&self, event: &EngagementEvent) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.sink.publish(event))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(
                    movement_id = %event.movement_id,
                    job_id = %event.job_id,
                    candidate_id = %event.candidate_id,
                    error = %err,
                    "engagement sink failed"
                );
                false
            }
            Err(_) => {
                warn!(
                    movement_id = %event.movement_id,
                    job_id = %event.job_id,
                    candidate_id = %event.candidate_id,
                    "engagement sink panicked"
                );
                false
            }
        }
    }
}
