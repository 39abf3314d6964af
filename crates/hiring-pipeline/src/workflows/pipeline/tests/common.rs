use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::PipelineConfig;
use crate::workflows::pipeline::domain::{
    Actor, ActorId, ActorRole, Candidate, CandidateId, CandidateStatus, CompanyId, Enrollment,
    EnrollmentId, JobId, JobOpening, JobStatus, MoveRequest, ReasonId, RejectionReason,
    RequiredField, StageDefinition, StageId,
};
use crate::workflows::pipeline::executor::Clock;
use crate::workflows::pipeline::hooks::{
    EngagementEvent, EngagementEventSink, HookDispatcher, HookWorker, SinkError,
};
use crate::workflows::pipeline::memory::{
    InMemoryActorDirectory, InMemoryPipelineStore, InMemoryReasonCatalog, InMemoryStageCatalog,
};
use crate::workflows::pipeline::service::{PipelineCatalogs, PipelineService};

pub(super) const JOB: &str = "job-backend";
pub(super) const OTHER_JOB: &str = "job-globex";
pub(super) const ACME: &str = "acme";
pub(super) const GLOBEX: &str = "globex";

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock that advances one minute per reading so records are strictly ordered.
pub(super) struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub(super) fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = self.next.lock().expect("clock mutex poisoned");
        let now = *guard;
        *guard = now + Duration::minutes(1);
        now
    }
}

pub(super) fn job(id: &str, company: &str, headcount: u32) -> JobOpening {
    JobOpening {
        id: JobId::new(id),
        company_id: CompanyId::new(company),
        owner_id: None,
        headcount,
        status: JobStatus::Open,
        closed_at: None,
    }
}

pub(super) fn stage(job: &str, id: &str, position: u32) -> StageDefinition {
    StageDefinition {
        id: StageId::new(id),
        job_id: JobId::new(job),
        display_name: id.replace('_', " "),
        position,
        required_fields: BTreeSet::new(),
        responsible_actor_ids: BTreeSet::new(),
        is_rejection_stage: false,
        is_hire_stage: false,
    }
}

pub(super) fn pipeline_stages(job: &str) -> Vec<StageDefinition> {
    let mut entrevista = stage(job, "entrevista", 2);
    entrevista.required_fields.insert(RequiredField::Score);

    let mut proposta = stage(job, "proposta", 3);
    proposta.required_fields.insert(RequiredField::Comment);

    let mut contratado = stage(job, "contratado", 4);
    contratado.is_hire_stage = true;

    let mut reprovado = stage(job, "reprovado_etico", 5);
    reprovado.is_rejection_stage = true;

    vec![
        stage(job, "recebido", 0),
        stage(job, "triagem", 1),
        entrevista,
        proposta,
        contratado,
        reprovado,
    ]
}

pub(super) fn actor(id: &str, role: ActorRole, company: Option<&str>) -> Actor {
    Actor {
        id: ActorId::new(id),
        role,
        company_id: company.map(CompanyId::new),
    }
}

pub(super) fn actors() -> Vec<Actor> {
    vec![
        actor("admin-acme", ActorRole::Admin, Some(ACME)),
        actor("recruiter-acme", ActorRole::Recruiter, Some(ACME)),
        actor("manager-acme", ActorRole::Manager, Some(ACME)),
        actor("admin-globex", ActorRole::Admin, Some(GLOBEX)),
        actor("root", ActorRole::SuperAdmin, None),
    ]
}

pub(super) fn reasons() -> Vec<RejectionReason> {
    vec![RejectionReason {
        id: ReasonId::new("conduct"),
        label: "Code of conduct violation".to_string(),
    }]
}

pub(super) fn request(candidate: &str, target: &str, actor: &str) -> MoveRequest {
    MoveRequest::new(
        JobId::new(JOB),
        CandidateId::new(candidate),
        StageId::new(target),
        ActorId::new(actor),
    )
}

pub(super) struct Fixture {
    pub(super) service: PipelineService<InMemoryPipelineStore>,
    pub(super) store: Arc<InMemoryPipelineStore>,
    pub(super) stages: Arc<InMemoryStageCatalog>,
}

impl Fixture {
    pub(super) fn enroll(&self, candidate: &str, stage: &str) -> Enrollment {
        self.enroll_in(JOB, candidate, stage)
    }

    pub(super) fn enroll_in(&self, job: &str, candidate: &str, stage: &str) -> Enrollment {
        self.store
            .insert_candidate(Candidate {
                id: CandidateId::new(candidate),
                status: CandidateStatus::Active,
            })
            .expect("candidate stored");
        let enrollment = Enrollment {
            id: EnrollmentId::new(format!("{job}:{candidate}")),
            job_id: JobId::new(job),
            candidate_id: CandidateId::new(candidate),
            current_stage_id: StageId::new(stage),
            score: None,
            comments: None,
            responsible_actor_id: None,
            enrolled_at: t0(),
            last_moved_at: None,
        };
        self.store.enroll(enrollment.clone()).expect("enrollment stored");
        enrollment
    }

    pub(super) fn job(&self, id: &str) -> JobOpening {
        use crate::workflows::pipeline::repository::JobRepository;
        self.store
            .job(&JobId::new(id))
            .expect("job lookup")
            .expect("job present")
    }
}

fn seeded_store() -> Arc<InMemoryPipelineStore> {
    let store = Arc::new(InMemoryPipelineStore::new());
    store.insert_job(job(JOB, ACME, 2)).expect("job stored");
    store
        .insert_job(job(OTHER_JOB, GLOBEX, 1))
        .expect("job stored");
    store
}

fn build(hooks: HookDispatcher) -> Fixture {
    let store = seeded_store();
    let stages = Arc::new(InMemoryStageCatalog::from_stages(
        pipeline_stages(JOB)
            .into_iter()
            .chain(pipeline_stages(OTHER_JOB)),
    ));
    let catalogs = PipelineCatalogs {
        stages: stages.clone(),
        actors: Arc::new(InMemoryActorDirectory::from_actors(actors())),
        reasons: Arc::new(InMemoryReasonCatalog::from_reasons(reasons())),
    };
    let service = PipelineService::new(store.clone(), catalogs, hooks, &PipelineConfig::default())
        .with_clock(Arc::new(StepClock::starting_at(t0())));

    Fixture {
        service,
        store,
        stages,
    }
}

pub(super) fn fixture() -> Fixture {
    build(HookDispatcher::disabled())
}

pub(super) fn fixture_with_hooks(sink: Arc<dyn EngagementEventSink>) -> (Fixture, HookWorker) {
    let (dispatcher, worker) = HookDispatcher::channel(8, sink);
    (build(dispatcher), worker)
}

#[derive(Default)]
pub(super) struct RecordingSink {
    events: Mutex<Vec<EngagementEvent>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<EngagementEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl EngagementEventSink for RecordingSink {
    fn publish(&self, event: &EngagementEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

pub(super) struct FailingSink;

impl EngagementEventSink for FailingSink {
    fn publish(&self, _event: &EngagementEvent) -> Result<(), SinkError> {
        Err(SinkError::Transport("analytics offline".to_string()))
    }
}

pub(super) struct PanickingSink;

impl EngagementEventSink for PanickingSink {
    fn publish(&self, _event: &EngagementEvent) -> Result<(), SinkError> {
        panic!("sink exploded")
    }
}
