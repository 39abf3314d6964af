use crate::infra::{build_pipeline, describe_outcome, render_stats, shutdown, Fixture, Pipeline};
use hiring_pipeline::config::AppConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::workflows::pipeline::{ActorId, CandidateId, JobId, MoveRequest, StageId};

const DEMO_JOB: &str = "job-backend";

fn move_request(candidate: &str, target: &str, actor: &str) -> MoveRequest {
    MoveRequest::new(
        JobId::new(DEMO_JOB),
        CandidateId::new(candidate),
        StageId::new(target),
        ActorId::new(actor),
    )
}

fn scenarios() -> Vec<(&'static str, MoveRequest)> {
    vec![
        (
            "A. admin advances a fresh application to screening",
            move_request("cand-ana", "triagem", "admin-acme").with_comments("ok"),
        ),
        (
            "B. leaving the interview without a score",
            move_request("cand-bruno", "proposta", "admin-acme"),
        ),
        (
            "C. rejection stage without a rejection reason",
            move_request("cand-clara", "reprovado_etico", "admin-acme"),
        ),
        (
            "D. second hire against a headcount of two",
            move_request("cand-davi", "contratado", "admin-acme").with_comments("Offer signed"),
        ),
        (
            "E. admin from another company moves a candidate",
            move_request("cand-ana", "entrevista", "admin-globex"),
        ),
    ]
}

pub(crate) async fn run_demo(config: &AppConfig) -> Result<(), AppError> {
    let fixture = Fixture {
        moves: Vec::new(),
        ..Fixture::bundled()?
    };
    let Pipeline {
        service,
        worker,
        job_ids,
        ..
    } = build_pipeline(fixture, &config.pipeline)?;

    println!("Candidate pipeline demo");
    for (title, request) in scenarios() {
        let result = service.move_candidate(request);
        println!("- {title}");
        println!("    {}", describe_outcome(&result));
    }

    let history = service.movement_history(
        &CandidateId::new("cand-ana"),
        &ActorId::new("manager-acme"),
    )?;
    println!("\nHistory of cand-ana as seen by manager-acme");
    for record in &history {
        println!(
            "  {} {} -> {} by {}",
            record.moved_at.format("%Y-%m-%d %H:%M:%S"),
            record
                .previous_stage_id
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("-"),
            record.new_stage_id,
            record.actor_id
        );
    }

    for job_id in &job_ids {
        render_stats(&service.pipeline_stats(job_id)?);
    }

    shutdown(service, worker).await;
    Ok(())
}
