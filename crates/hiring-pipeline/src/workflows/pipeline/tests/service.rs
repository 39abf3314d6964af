use crate::workflows::pipeline::domain::{
    ActorId, Candidate, CandidateId, CandidateStatus, JobId, JobStatus, RejectionPayload,
    StageId,
};
use crate::workflows::pipeline::error::DenialKind;
use crate::workflows::pipeline::repository::{EnrollmentRepository, MovementLog};

use super::common::{fixture, request, t0, OTHER_JOB, JOB};

#[test]
fn unknown_actor_is_denied_by_role() {
    let fixture = fixture();
    fixture.enroll("cand-1", "recebido");

    let err = fixture
        .service
        .move_candidate(request("cand-1", "triagem", "ghost"))
        .expect_err("unknown actor");

    assert_eq!(err.code(), "PERMISSION_DENIED");
    assert_eq!(err.denial_kind(), Some(DenialKind::Role));
}

#[test]
fn unknown_candidate_is_reported_after_authorization() {
    let fixture = fixture();

    let err = fixture
        .service
        .move_candidate(request("cand-404", "triagem", "admin-acme"))
        .expect_err("missing candidate");
    assert_eq!(err.code(), "CANDIDATE_NOT_FOUND");

    let err = fixture
        .service
        .move_candidate(request("cand-404", "triagem", "manager-acme"))
        .expect_err("role checked first");
    assert_eq!(err.code(), "PERMISSION_DENIED");
}

#[test]
fn inactive_candidate_cannot_move() {
    let fixture = fixture();
    let enrollment = fixture.enroll("cand-1", "recebido");
    fixture
        .store
        .insert_candidate(Candidate {
            id: CandidateId::new("cand-1"),
            status: CandidateStatus::Inactive,
        })
        .expect("candidate deactivated");

    let err = fixture
        .service
        .move_candidate(request("cand-1", "triagem", "admin-acme"))
        .expect_err("inactive");

    assert_eq!(err.code(), "CANDIDATE_INACTIVE");
    let records = fixture
        .store
        .movements_for_enrollment(&enrollment.id)
        .expect("log readable");
    assert!(records.is_empty());
}

#[test]
fn score_and_comments_survive_moves_that_omit_them() {
    let fixture = fixture();
    fixture.enroll("cand-1", "entrevista");

    fixture
        .service
        .move_candidate(
            request("cand-1", "proposta", "admin-acme")
                .with_score(8.5)
                .with_comments("Great system design round"),
        )
        .expect("leave interview");
    let outcome = fixture
        .service
        .move_candidate(request("cand-1", "triagem", "admin-acme").with_comments("Back to triage"))
        .expect("leave proposal");

    assert_eq!(outcome.enrollment.score, Some(8.5));
    assert_eq!(outcome.enrollment.comments.as_deref(), Some("Back to triage"));
    assert_eq!(outcome.movement.score, None);
}

#[test]
fn rejection_payload_on_regular_stage_is_ignored() {
    let fixture = fixture();
    let enrollment = fixture.enroll("cand-1", "recebido");

    let outcome = fixture
        .service
        .move_candidate(
            request("cand-1", "triagem", "admin-acme").with_rejection(RejectionPayload {
                reason_id: None,
                custom_reason: Some("not a fit".to_string()),
                observations: None,
            }),
        )
        .expect("regular move");

    assert!(outcome.rejection.is_none());
    let rejections = fixture
        .store
        .rejections_for_enrollment(&enrollment.id)
        .expect("log readable");
    assert!(rejections.is_empty());
}

#[test]
fn unresolved_reason_id_without_custom_text_is_refused() {
    let fixture = fixture();
    fixture.enroll("cand-1", "triagem");

    let err = fixture
        .service
        .move_candidate(
            request("cand-1", "reprovado_etico", "admin-acme").with_rejection(RejectionPayload {
                reason_id: Some(crate::workflows::pipeline::domain::ReasonId::new("typo")),
                custom_reason: None,
                observations: None,
            }),
        )
        .expect_err("reason must exist");

    assert_eq!(err.code(), "MISSING_REJECTION_REASON");
}

#[test]
fn history_hides_other_companies_and_is_oldest_first() {
    let fixture = fixture();
    fixture.enroll("cand-1", "recebido");
    fixture.enroll_in(OTHER_JOB, "cand-1", "recebido");

    let mut other = request("cand-1", "triagem", "admin-globex");
    other.job_id = JobId::new(OTHER_JOB);

    fixture
        .service
        .move_candidate(request("cand-1", "triagem", "admin-acme"))
        .expect("acme move");
    fixture.service.move_candidate(other).expect("globex move");
    fixture
        .service
        .move_candidate(request("cand-1", "entrevista", "recruiter-acme"))
        .expect("acme move");

    let candidate = CandidateId::new("cand-1");
    let acme = fixture
        .service
        .movement_history(&candidate, &ActorId::new("manager-acme"))
        .expect("acme history");
    assert_eq!(acme.len(), 2);
    assert!(acme.iter().all(|record| record.job_id.as_str() == JOB));
    assert!(acme[0].moved_at < acme[1].moved_at);
    assert_eq!(acme[1].previous_stage_id, Some(StageId::new("triagem")));

    let globex = fixture
        .service
        .movement_history(&candidate, &ActorId::new("admin-globex"))
        .expect("globex history");
    assert_eq!(globex.len(), 1);
    assert_eq!(globex[0].job_id.as_str(), OTHER_JOB);

    let everything = fixture
        .service
        .movement_history(&candidate, &ActorId::new("root"))
        .expect("full history");
    assert_eq!(everything.len(), 3);
    assert!(everything
        .windows(2)
        .all(|pair| pair[0].moved_at <= pair[1].moved_at));
}

#[test]
fn history_for_unknown_actor_is_denied() {
    let fixture = fixture();
    let err = fixture
        .service
        .movement_history(&CandidateId::new("cand-1"), &ActorId::new("ghost"))
        .expect_err("unknown actor");
    assert_eq!(err.denial_kind(), Some(DenialKind::Role));
}

#[test]
fn stats_reflect_current_stage_distribution() {
    let fixture = fixture();
    fixture.enroll("cand-1", "recebido");
    fixture.enroll("cand-2", "recebido");
    fixture.enroll("cand-3", "recebido");
    fixture
        .service
        .move_candidate(request("cand-1", "triagem", "admin-acme"))
        .expect("move");

    let stats = fixture
        .service
        .pipeline_stats(&JobId::new(JOB))
        .expect("stats");

    assert_eq!(stats.total, 3);
    assert_eq!(stats.count_for(&StageId::new("recebido")), 2);
    assert_eq!(stats.count_for(&StageId::new("triagem")), 1);
    assert_eq!(stats.count_for(&StageId::new("contratado")), 0);
    assert_eq!(stats.stages.len(), 6);
    assert_eq!(
        stats.rate_between(&StageId::new("recebido"), &StageId::new("triagem")),
        Some(0.5)
    );

    let err = fixture
        .service
        .pipeline_stats(&JobId::new("job-missing"))
        .expect_err("unknown job");
    assert_eq!(err.code(), "JOB_NOT_FOUND");
}

#[test]
fn hire_on_filled_job_keeps_original_closure() {
    let fixture = fixture();
    fixture.enroll("cand-1", "triagem");
    fixture.enroll("cand-2", "triagem");
    fixture.enroll("cand-3", "triagem");

    let first = fixture
        .service
        .move_candidate(request("cand-1", "contratado", "admin-acme"))
        .expect("first hire");
    assert!(first.job_closure.is_none());

    let second = fixture
        .service
        .move_candidate(request("cand-2", "contratado", "admin-acme"))
        .expect("second hire");
    let closure = second.job_closure.expect("headcount reached");

    let third = fixture
        .service
        .move_candidate(request("cand-3", "contratado", "admin-acme"))
        .expect("filled jobs still accept moves");
    assert!(third.job_closure.is_none());

    let job = fixture.job(JOB);
    assert_eq!(job.status, JobStatus::Filled);
    assert_eq!(job.closed_at, closure.closed_at);
    assert!(job.closed_at.is_some_and(|at| at > t0()));

    let enrollment = fixture
        .store
        .enrollment(&JobId::new(JOB), &CandidateId::new("cand-3"))
        .expect("readable")
        .expect("enrolled");
    assert_eq!(enrollment.current_stage_id.as_str(), "contratado");
}
