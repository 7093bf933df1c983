use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod envelope;

pub use envelope::{extract_records, extract_total, Extraction};

// ============================================================================
// Calendar Event Types
// ============================================================================

/// Kind of activity a calendar event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Resume,
    Interview,
    NewJob,
    Deadline,
    Custom,
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Resume => "resume",
            EventType::Interview => "interview",
            EventType::NewJob => "newJob",
            EventType::Deadline => "deadline",
            EventType::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "resume" => Some(EventType::Resume),
            "interview" => Some(EventType::Interview),
            "newJob" | "new_job" => Some(EventType::NewJob),
            "deadline" => Some(EventType::Deadline),
            "custom" => Some(EventType::Custom),
            _ => None,
        }
    }

    /// Display color used by the calendar view
    pub fn color(&self) -> &'static str {
        match self {
            EventType::Resume => "#3b82f6",
            EventType::Interview => "#8b5cf6",
            EventType::NewJob => "#10b981",
            EventType::Deadline => "#ef4444",
            EventType::Custom => "#f59e0b",
        }
    }

    /// Human readable label, used by exports
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Resume => "Resume Upload",
            EventType::Interview => "Interview",
            EventType::NewJob => "New Job",
            EventType::Deadline => "Application Deadline",
            EventType::Custom => "Custom",
        }
    }
}

/// Approval status carried by users, jobs and applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[serde(alias = "active")]
    Approved,
    Pending,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Unknown => "unknown",
        }
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Pending
    }
}

/// Platform role of a user, decoded once from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[serde(alias = "job_seeker", alias = "jobseeker", alias = "JobSeeker")]
    JobSeeker,
    #[serde(alias = "Trainer")]
    Trainer,
    #[serde(alias = "Employer")]
    Employer,
    #[serde(alias = "Admin")]
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::JobSeeker => "jobSeeker",
            Role::Trainer => "trainer",
            Role::Employer => "employer",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }
}

// ============================================================================
// Raw API Records
// ============================================================================

/// User record as returned by the admin REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<ApprovalStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub professional_info: Option<ProfessionalInfo>,
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
}

impl UserRecord {
    /// Full name if present, otherwise first/last name, otherwise the email
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }

        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !joined.is_empty() {
            return joined;
        }

        self.email.clone().unwrap_or_else(|| "Unknown user".to_string())
    }

    /// Resume URL when one has actually been uploaded
    pub fn resume_url(&self) -> Option<&str> {
        self.professional_info
            .as_ref()
            .and_then(|info| info.resume.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.display_name(),
            email: self.email.clone(),
            role: self.role.unwrap_or(Role::Unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInfo {
    pub resume: Option<String>,
    pub resume_uploaded_at: Option<DateTime<Utc>>,
    pub headline: Option<String>,
}

/// Application embedded in a user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    #[serde(alias = "jobId")]
    pub job: Option<String>,
    pub job_title: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub interview_date: Option<DateTime<Utc>>,
}

/// Job record as returned by the jobs REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub application_deadline: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled job")
            .to_string()
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.display_title(),
            company: self.company.clone(),
            location: self.location.clone(),
        }
    }
}

// ============================================================================
// Calendar Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
}

/// Typed payload attached to an event, depending on its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    #[serde(rename_all = "camelCase")]
    Resume {
        user: UserSummary,
        resume_url: String,
        status: ApprovalStatus,
    },
    Interview {
        user: UserSummary,
        job: JobSummary,
        status: ApprovalStatus,
    },
    NewJob {
        job: JobSummary,
        status: ApprovalStatus,
    },
    Deadline {
        job: JobSummary,
        status: ApprovalStatus,
    },
    Custom {
        note: Option<String>,
        status: ApprovalStatus,
    },
}

/// A single calendar entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub color: String,
    pub extended_props: EventPayload,
}

impl CalendarEvent {
    pub fn status(&self) -> ApprovalStatus {
        match &self.extended_props {
            EventPayload::Resume { status, .. }
            | EventPayload::Interview { status, .. }
            | EventPayload::NewJob { status, .. }
            | EventPayload::Deadline { status, .. }
            | EventPayload::Custom { status, .. } => *status,
        }
    }

    pub fn user(&self) -> Option<&UserSummary> {
        match &self.extended_props {
            EventPayload::Resume { user, .. } | EventPayload::Interview { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn job(&self) -> Option<&JobSummary> {
        match &self.extended_props {
            EventPayload::Interview { job, .. }
            | EventPayload::NewJob { job, .. }
            | EventPayload::Deadline { job, .. } => Some(job),
            _ => None,
        }
    }

    pub fn resume_url(&self) -> Option<&str> {
        match &self.extended_props {
            EventPayload::Resume { resume_url, .. } => Some(resume_url),
            _ => None,
        }
    }
}

/// Inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Calendar presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    Day,
    List,
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Approved,
    Pending,
}

impl StatusFilter {
    pub fn as_str(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Approved => "approved",
            StatusFilter::Pending => "pending",
        }
    }

    pub fn matches(&self, status: ApprovalStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Approved => status == ApprovalStatus::Approved,
            StatusFilter::Pending => status == ApprovalStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleFilter {
    #[default]
    All,
    JobSeeker,
    Trainer,
    Employer,
}

impl RoleFilter {
    pub fn as_str(&self) -> &str {
        match self {
            RoleFilter::All => "all",
            RoleFilter::JobSeeker => "jobSeeker",
            RoleFilter::Trainer => "trainer",
            RoleFilter::Employer => "employer",
        }
    }

    /// Events without a user belong to job postings, which are employer activity
    pub fn matches(&self, user: Option<&UserSummary>) -> bool {
        let role = user.map(|u| u.role).unwrap_or(Role::Employer);
        match self {
            RoleFilter::All => true,
            RoleFilter::JobSeeker => role == Role::JobSeeker,
            RoleFilter::Trainer => role == Role::Trainer,
            RoleFilter::Employer => role == Role::Employer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTypeFilter {
    #[default]
    All,
    Resume,
    Interview,
    NewJob,
    Deadline,
    Custom,
}

impl EventTypeFilter {
    pub fn as_str(&self) -> &str {
        match self {
            EventTypeFilter::All => "all",
            EventTypeFilter::Resume => "resume",
            EventTypeFilter::Interview => "interview",
            EventTypeFilter::NewJob => "newJob",
            EventTypeFilter::Deadline => "deadline",
            EventTypeFilter::Custom => "custom",
        }
    }

    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            EventTypeFilter::All => true,
            EventTypeFilter::Resume => event_type == EventType::Resume,
            EventTypeFilter::Interview => event_type == EventType::Interview,
            EventTypeFilter::NewJob => event_type == EventType::NewJob,
            EventTypeFilter::Deadline => event_type == EventType::Deadline,
            EventTypeFilter::Custom => event_type == EventType::Custom,
        }
    }
}

/// Filter selections of the calendar view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub status: StatusFilter,
    pub role: RoleFilter,
    pub event_type: EventTypeFilter,
}

impl Filters {
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        self.status.matches(event.status())
            && self.role.matches(event.user())
            && self.event_type.matches(event.event_type)
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
    pub total: u64,
}

impl Pagination {
    pub fn first_page(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            has_more: false,
            total: 0,
        }
    }

    /// Page number clamped to the 1-based minimum
    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    /// Recomputes `total` and `has_more` after a fetch
    pub fn updated(self, total: u64) -> Self {
        let seen = u64::from(self.page) * u64::from(self.limit);
        Self {
            has_more: seen < total,
            total,
            ..self
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first_page(100)
    }
}
