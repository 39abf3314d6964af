use crate::workflows::pipeline::access::{AccessGuard, AccessPolicy};
use crate::workflows::pipeline::domain::{ActorId, ActorRole, JobId, StageId};
use crate::workflows::pipeline::error::{DenialKind, PipelineError};

use super::common::{actor, fixture, job, ACME, GLOBEX, JOB};

fn authorize(
    fixture: &super::common::Fixture,
    guard: &AccessGuard,
    actor_id: &str,
    role: ActorRole,
    company: Option<&str>,
    target: &str,
) -> Result<(), PipelineError> {
    guard
        .authorize(
            &actor(actor_id, role, company),
            &JobId::new(JOB),
            &StageId::new(target),
            fixture.store.as_ref(),
            fixture.stages.as_ref(),
        )
        .map(|_| ())
}

#[test]
fn default_policy_admits_admins_and_recruiters_only() {
    let policy = AccessPolicy::default();
    assert!(policy.allows(ActorRole::Admin));
    assert!(policy.allows(ActorRole::Recruiter));
    assert!(policy.allows(ActorRole::SuperAdmin));
    assert!(!policy.allows(ActorRole::Manager));
    assert!(!policy.allows(ActorRole::Viewer));
}

#[test]
fn unprivileged_role_is_denied_before_job_lookup() {
    let fixture = fixture();
    let guard = AccessGuard::default();

    let err = guard
        .authorize(
            &actor("manager-acme", ActorRole::Manager, Some(ACME)),
            &JobId::new("job-missing"),
            &StageId::new("triagem"),
            fixture.store.as_ref(),
            fixture.stages.as_ref(),
        )
        .expect_err("manager refused");

    assert_eq!(err.denial_kind(), Some(DenialKind::Role));
}

#[test]
fn actor_from_another_company_is_denied_by_scope() {
    let fixture = fixture();
    let err = authorize(
        &fixture,
        &AccessGuard::default(),
        "admin-globex",
        ActorRole::Admin,
        Some(GLOBEX),
        "triagem",
    )
    .expect_err("foreign company refused");

    assert_eq!(err.code(), "PERMISSION_DENIED");
    assert_eq!(err.denial_kind(), Some(DenialKind::Scope));
}

#[test]
fn assigned_job_is_reserved_for_its_owner() {
    let fixture = fixture();
    let mut owned = job(JOB, ACME, 2);
    owned.owner_id = Some(ActorId::new("recruiter-acme"));
    fixture.store.insert_job(owned).expect("job replaced");
    let guard = AccessGuard::default();

    let err = authorize(&fixture, &guard, "admin-acme", ActorRole::Admin, Some(ACME), "triagem")
        .expect_err("non-owner refused");
    assert_eq!(err.denial_kind(), Some(DenialKind::Ownership));

    authorize(
        &fixture,
        &guard,
        "recruiter-acme",
        ActorRole::Recruiter,
        Some(ACME),
        "triagem",
    )
    .expect("owner allowed");
}

#[test]
fn stage_responsibility_restricts_target_stage() {
    let fixture = fixture();
    let mut entrevista = super::common::stage(JOB, "entrevista", 2);
    entrevista
        .responsible_actor_ids
        .insert(ActorId::new("recruiter-acme"));
    fixture.stages.insert(entrevista).expect("stage replaced");
    let guard = AccessGuard::default();

    let err = authorize(&fixture, &guard, "admin-acme", ActorRole::Admin, Some(ACME), "entrevista")
        .expect_err("not responsible");
    assert_eq!(err.denial_kind(), Some(DenialKind::Stage));

    authorize(
        &fixture,
        &guard,
        "recruiter-acme",
        ActorRole::Recruiter,
        Some(ACME),
        "entrevista",
    )
    .expect("responsible recruiter allowed");
}

#[test]
fn super_admin_bypasses_scope_and_stage_checks() {
    let fixture = fixture();
    let mut entrevista = super::common::stage(JOB, "entrevista", 2);
    entrevista
        .responsible_actor_ids
        .insert(ActorId::new("recruiter-acme"));
    fixture.stages.insert(entrevista).expect("stage replaced");

    let transition = AccessGuard::with_policy(AccessPolicy::new([]))
        .authorize(
            &actor("root", ActorRole::SuperAdmin, None),
            &JobId::new(JOB),
            &StageId::new("entrevista"),
            fixture.store.as_ref(),
            fixture.stages.as_ref(),
        )
        .expect("super admin allowed");

    assert_eq!(transition.job.id.as_str(), JOB);
    assert_eq!(transition.target.id.as_str(), "entrevista");
}

#[test]
fn unknown_job_and_stage_are_reported() {
    let fixture = fixture();
    let guard = AccessGuard::default();
    let admin = actor("admin-acme", ActorRole::Admin, Some(ACME));

    let err = guard
        .authorize(
            &admin,
            &JobId::new("job-missing"),
            &StageId::new("triagem"),
            fixture.store.as_ref(),
            fixture.stages.as_ref(),
        )
        .expect_err("missing job");
    assert_eq!(err.code(), "JOB_NOT_FOUND");

    let err = authorize(&fixture, &guard, "admin-acme", ActorRole::Admin, Some(ACME), "limbo")
        .expect_err("missing stage");
    assert_eq!(err.code(), "INVALID_STAGE");
}

#[test]
fn can_view_follows_company_scope() {
    let guard = AccessGuard::default();
    let acme_job = job(JOB, ACME, 1);

    assert!(guard.can_view(&actor("manager-acme", ActorRole::Manager, Some(ACME)), &acme_job));
    assert!(!guard.can_view(&actor("admin-globex", ActorRole::Admin, Some(GLOBEX)), &acme_job));
    assert!(guard.can_view(&actor("root", ActorRole::SuperAdmin, None), &acme_job));
}
