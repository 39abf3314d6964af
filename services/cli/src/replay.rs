use crate::infra::{build_pipeline, describe_outcome, render_stats, shutdown, Fixture, Pipeline};
use clap::Args;
use hiring_pipeline::config::AppConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::workflows::pipeline::JobId;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug)]
pub(crate) struct ReplayArgs {
    /// JSON fixture with catalogs, seed data, and the moves to replay
    #[arg(long)]
    pub(crate) fixture: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    /// JSON fixture with catalogs, seed data, and the moves to replay
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Job whose pipeline statistics are printed
    #[arg(long)]
    pub(crate) job: String,
}

pub(crate) async fn run_replay(args: ReplayArgs, config: &AppConfig) -> Result<(), AppError> {
    let Pipeline {
        service,
        worker,
        moves,
        job_ids,
    } = build_pipeline(Fixture::from_path(&args.fixture)?, &config.pipeline)?;

    println!("Replaying {} movement(s) from {}", moves.len(), args.fixture.display());
    for (index, request) in moves.into_iter().enumerate() {
        let label = format!(
            "{} -> {} by {}",
            request.candidate_id, request.target_stage_id, request.actor_id
        );
        let result = service.move_candidate(request);
        println!("{:>3}. {label}: {}", index + 1, describe_outcome(&result));
    }

    for job_id in &job_ids {
        render_stats(&service.pipeline_stats(job_id)?);
    }

    shutdown(service, worker).await;
    Ok(())
}

pub(crate) async fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<(), AppError> {
    let Pipeline {
        service,
        worker,
        moves,
        ..
    } = build_pipeline(Fixture::from_path(&args.fixture)?, &config.pipeline)?;

    for request in moves {
        if let Err(err) = service.move_candidate(request) {
            warn!(code = err.code(), error = %err, "replayed movement refused");
        }
    }

    let stats = service.pipeline_stats(&JobId::new(args.job));
    shutdown(service, worker).await;
    println!("{}", serde_json::to_string_pretty(&stats?)?);
    Ok(())
}
