use hiring_pipeline::config::PipelineConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::workflows::pipeline::{
    Actor, Candidate, EngagementEvent, EngagementEventSink, Enrollment, HookDispatcher,
    InMemoryActorDirectory, InMemoryPipelineStore, InMemoryReasonCatalog, InMemoryStageCatalog,
    JobId, JobOpening, MoveRequest, MovementOutcome, PipelineCatalogs, PipelineError,
    PipelineService, PipelineStats, RejectionReason, SinkError, StageDefinition,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const BUNDLED_FIXTURE: &str = include_str!("../fixtures/pipeline.json");

/// Seed data and scripted moves for an in-memory pipeline.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Fixture {
    #[serde(default)]
    pub(crate) stages: Vec<StageDefinition>,
    #[serde(default)]
    pub(crate) actors: Vec<Actor>,
    #[serde(default)]
    pub(crate) reasons: Vec<RejectionReason>,
    #[serde(default)]
    pub(crate) jobs: Vec<JobOpening>,
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub(crate) moves: Vec<MoveRequest>,
}

impl Fixture {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub(crate) fn bundled() -> Result<Self, AppError> {
        Self::from_json(BUNDLED_FIXTURE)
    }
}

pub(crate) type CliService = PipelineService<InMemoryPipelineStore>;

/// A seeded service plus what is needed to drive and drain it.
pub(crate) struct Pipeline {
    pub(crate) service: CliService,
    pub(crate) worker: JoinHandle<usize>,
    pub(crate) moves: Vec<MoveRequest>,
    pub(crate) job_ids: Vec<JobId>,
}

/// Seed an in-memory store from `fixture` and start the engagement worker on the runtime.
pub(crate) fn build_pipeline(
    fixture: Fixture,
    config: &PipelineConfig,
) -> Result<Pipeline, AppError> {
    let Fixture {
        stages,
        actors,
        reasons,
        jobs,
        candidates,
        enrollments,
        moves,
    } = fixture;

    let store = Arc::new(InMemoryPipelineStore::new());
    let job_ids: Vec<JobId> = jobs.iter().map(|job| job.id.clone()).collect();
    for job in jobs {
        store.insert_job(job).map_err(PipelineError::from)?;
    }
    for candidate in candidates {
        store.insert_candidate(candidate).map_err(PipelineError::from)?;
    }
    for enrollment in enrollments {
        store.enroll(enrollment).map_err(PipelineError::from)?;
    }

    let catalogs = PipelineCatalogs {
        stages: Arc::new(InMemoryStageCatalog::from_stages(stages)),
        actors: Arc::new(InMemoryActorDirectory::from_actors(actors)),
        reasons: Arc::new(InMemoryReasonCatalog::from_reasons(reasons)),
    };

    let (hooks, worker) = HookDispatcher::channel(config.hook_buffer, Arc::new(TracingEventSink));
    let service = PipelineService::new(store, catalogs, hooks, config);
    let worker = tokio::spawn(worker.run());

    info!(
        jobs = job_ids.len(),
        moves = moves.len(),
        "in-memory pipeline seeded"
    );

    Ok(Pipeline {
        service,
        worker,
        moves,
        job_ids,
    })
}

/// Close the event queue and wait for the worker to drain it.
pub(crate) async fn shutdown(service: CliService, worker: JoinHandle<usize>) {
    drop(service);
    match worker.await {
        Ok(delivered) => info!(delivered, "engagement events delivered"),
        Err(err) => warn!(error = %err, "engagement worker aborted"),
    }
}

/// Engagement sink that records events in the structured log.
pub(crate) struct TracingEventSink;

impl EngagementEventSink for TracingEventSink {
    fn publish(&self, event: &EngagementEvent) -> Result<(), SinkError> {
        info!(
            movement_id = %event.movement_id,
            job_id = %event.job_id,
            candidate_id = %event.candidate_id,
            from = ?event.previous_stage_id.as_ref().map(|id| id.as_str()),
            to = %event.new_stage_id,
            rejected = event.rejected,
            "engagement event"
        );
        Ok(())
    }
}

pub(crate) fn describe_outcome(result: &Result<MovementOutcome, PipelineError>) -> String {
    match result {
        Ok(outcome) => {
            let mut line = format!(
                "moved {} -> {} ({})",
                outcome
                    .movement
                    .previous_stage_id
                    .as_ref()
                    .map(|id| id.as_str())
                    .unwrap_or("-"),
                outcome.movement.new_stage_id,
                outcome.movement.id
            );
            if let Some(rejection) = &outcome.rejection {
                let reason = rejection
                    .reason_label
                    .as_deref()
                    .or(rejection.custom_reason.as_deref())
                    .unwrap_or("unspecified");
                line.push_str(&format!(" | rejected: {reason}"));
            }
            if outcome.job_closure.is_some() {
                line.push_str(" | headcount reached, job filled");
            }
            line
        }
        Err(err) => {
            let view = err.view();
            let mut line = format!("refused [{}] {}", view.code, view.message);
            if let Some(field) = view.field {
                line.push_str(&format!(" (field: {field})"));
            }
            line
        }
    }
}

pub(crate) fn render_stats(stats: &PipelineStats) {
    println!("\nPipeline for {} ({} enrolled)", stats.job_id, stats.total);
    for stage in &stats.stages {
        println!(
            "  {:>2}. {:<20} {}",
            stage.position, stage.display_name, stage.count
        );
    }
    println!("  Conversion:");
    for conversion in &stats.conversions {
        match conversion.rate {
            Some(rate) => println!(
                "    {} -> {}: {:.0}%",
                conversion.from,
                conversion.to,
                rate * 100.0
            ),
            None => println!("    {} -> {}: n/a", conversion.from, conversion.to),
        }
    }
}
