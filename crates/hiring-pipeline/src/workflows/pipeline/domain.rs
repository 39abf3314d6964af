use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a job opening.
    JobId
);
string_id!(
    /// Identifier of the hiring company that owns jobs and employs actors.
    CompanyId
);
string_id!(
    /// Identifier of a candidate.
    CandidateId
);
string_id!(
    /// Opaque stage identifier; stages are per-job runtime data.
    StageId
);
string_id!(
    /// Identifier of a candidate-in-job enrollment.
    EnrollmentId
);
string_id!(
    /// Identifier of an acting user.
    ActorId
);
string_id!(
    /// Identifier of a canned rejection reason.
    ReasonId
);
string_id!(
    /// Identifier of an audit movement record.
    MovementId
);

/// Lifecycle of a job opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Filled,
    Closed,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Filled => "filled",
            JobStatus::Closed => "closed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Closed and cancelled jobs no longer accept movements; filled jobs still do.
    pub const fn accepts_movements(self) -> bool {
        matches!(self, JobStatus::Open | JobStatus::Filled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOpening {
    pub id: JobId,
    pub company_id: CompanyId,
    /// Assigned recruiter, when the job declares one.
    #[serde(default)]
    pub owner_id: Option<ActorId>,
    pub headcount: u32,
    pub status: JobStatus,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Partial update applied to a job by the headcount closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPatch {
    pub status: JobStatus,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub status: CandidateStatus,
}

/// Field tags a stage may require before a candidate leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Comment,
    Score,
}

impl RequiredField {
    pub const fn label(self) -> &'static str {
        match self {
            RequiredField::Comment => "comment",
            RequiredField::Score => "score",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: StageId,
    pub job_id: JobId,
    pub display_name: String,
    /// Ordering used for statistics; transitions are not constrained by it.
    pub position: u32,
    #[serde(default)]
    pub required_fields: BTreeSet<RequiredField>,
    /// Actors allowed to move candidates into this stage. Empty means unrestricted.
    #[serde(default)]
    pub responsible_actor_ids: BTreeSet<ActorId>,
    #[serde(default)]
    pub is_rejection_stage: bool,
    /// Marks the canonical hired stage counted against the job headcount.
    #[serde(default)]
    pub is_hire_stage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub current_stage_id: StageId,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub responsible_actor_id: Option<ActorId>,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub last_moved_at: Option<DateTime<Utc>>,
}

/// Where a movement request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOrigin {
    #[serde(default)]
    pub ip: Option<IpAddr>,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// Immutable audit entry for one committed movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub enrollment_id: EnrollmentId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub previous_stage_id: Option<StageId>,
    pub new_stage_id: StageId,
    pub score: Option<f32>,
    pub comments: Option<String>,
    pub actor_id: ActorId,
    pub moved_at: DateTime<Utc>,
    pub origin: MovementOrigin,
}

/// Why an enrollment was moved into a rejection stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub enrollment_id: EnrollmentId,
    pub reason_id: Option<ReasonId>,
    /// Catalog label captured at rejection time.
    pub reason_label: Option<String>,
    pub custom_reason: Option<String>,
    pub observations: Option<String>,
    pub stage_at_rejection: StageId,
    pub actor_id: ActorId,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReason {
    pub id: ReasonId,
    pub label: String,
}

/// Rejection details supplied with a movement into a rejection stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionPayload {
    #[serde(default)]
    pub reason_id: Option<ReasonId>,
    #[serde(default)]
    pub custom_reason: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
}

impl RejectionPayload {
    pub fn custom_reason_text(&self) -> Option<&str> {
        self.custom_reason
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    SuperAdmin,
    Admin,
    Recruiter,
    Manager,
    Viewer,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::SuperAdmin => "super_admin",
            ActorRole::Admin => "admin",
            ActorRole::Recruiter => "recruiter",
            ActorRole::Manager => "manager",
            ActorRole::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "super_admin" | "superadmin" => Some(ActorRole::SuperAdmin),
            "admin" => Some(ActorRole::Admin),
            "recruiter" => Some(ActorRole::Recruiter),
            "manager" => Some(ActorRole::Manager),
            "viewer" => Some(ActorRole::Viewer),
            _ => None,
        }
    }
}

/// Acting identity resolved through the actor directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
    pub company_id: Option<CompanyId>,
}

impl Actor {
    pub fn is_super_admin(&self) -> bool {
        self.role == ActorRole::SuperAdmin
    }
}

/// Caller-supplied transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub target_stage_id: StageId,
    pub actor_id: ActorId,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub rejection: Option<RejectionPayload>,
    #[serde(default)]
    pub origin: MovementOrigin,
}

impl MoveRequest {
    pub fn new(
        job_id: JobId,
        candidate_id: CandidateId,
        target_stage_id: StageId,
        actor_id: ActorId,
    ) -> Self {
        Self {
            job_id,
            candidate_id,
            target_stage_id,
            actor_id,
            score: None,
            comments: None,
            rejection: None,
            origin: MovementOrigin::default(),
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn with_rejection(mut self, rejection: RejectionPayload) -> Self {
        self.rejection = Some(rejection);
        self
    }

    pub fn with_origin(mut self, origin: MovementOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Comments with surrounding whitespace removed; blank text counts as absent.
    pub fn comment_text(&self) -> Option<&str> {
        self.comments
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
