//! Event Builder: turns raw user and job records into calendar events.
//!
//! Records stay as JSON until this point and are decoded one at a time. A
//! record that fails to decode (missing id, unparseable date, wrong types) is
//! counted and skipped; it never aborts the batch.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{
    ApprovalStatus, CalendarEvent, DateRange, EventPayload, EventType, JobRecord, JobSummary,
    UserRecord,
};

/// What to do with a resume that carries no usable date.
///
/// Jobs and deadlines without a date are always skipped. Resumes historically
/// fell back to the current time, so `UseNow` is the default; `Skip` applies
/// the same rule as jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingResumeDate {
    #[default]
    UseNow,
    Skip,
}

/// Events produced by one build pass plus per-record accounting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub events: Vec<CalendarEvent>,
    /// Records examined
    pub processed: usize,
    /// Records that could not be decoded
    pub failed: usize,
}

impl BuildReport {
    /// Warning threshold: more than 10% of processed records failed
    pub fn exceeds_failure_threshold(&self) -> bool {
        self.processed > 0 && self.failed * 10 > self.processed
    }

    /// Warning text when the failure threshold is exceeded
    pub fn warning(&self) -> Option<String> {
        self.exceeds_failure_threshold().then(|| {
            format!(
                "{} of {} records could not be processed; the calendar may be incomplete",
                self.failed, self.processed
            )
        })
    }

    fn extend(&mut self, other: BuildReport) {
        self.events.extend(other.events);
        self.processed += other.processed;
        self.failed += other.failed;
    }
}

/// Pure transform from records to events for a fixed window
#[derive(Debug, Clone)]
pub struct EventBuilder {
    window: DateRange,
    now: DateTime<Utc>,
    missing_resume_date: MissingResumeDate,
}

impl EventBuilder {
    /// `now` is captured once so repeated builds are deterministic
    pub fn new(window: DateRange, now: DateTime<Utc>) -> Self {
        Self {
            window,
            now,
            missing_resume_date: MissingResumeDate::default(),
        }
    }

    pub fn with_missing_resume_date(mut self, policy: MissingResumeDate) -> Self {
        self.missing_resume_date = policy;
        self
    }

    pub fn window(&self) -> DateRange {
        self.window
    }

    /// One `resume` event per user with an uploaded resume inside the window
    pub fn resume_events(&self, users: &[Value]) -> BuildReport {
        let (decoded, failed) = decode::<UserRecord>(users, "user");
        BuildReport {
            events: decoded.iter().filter_map(|u| self.resume_event(u)).collect(),
            processed: users.len(),
            failed,
        }
    }

    /// One `interview` event per scheduled application inside the window
    pub fn interview_events(&self, users: &[Value]) -> BuildReport {
        let (decoded, failed) = decode::<UserRecord>(users, "user");
        BuildReport {
            events: decoded.iter().flat_map(|u| self.interviews_for(u)).collect(),
            processed: users.len(),
            failed,
        }
    }

    /// One `newJob` event per job created inside the window
    pub fn job_events(&self, jobs: &[Value]) -> BuildReport {
        let (decoded, failed) = decode::<JobRecord>(jobs, "job");
        BuildReport {
            events: decoded.iter().filter_map(|j| self.new_job_event(j)).collect(),
            processed: jobs.len(),
            failed,
        }
    }

    /// One `deadline` event per job whose application deadline is inside the window
    pub fn deadline_events(&self, jobs: &[Value]) -> BuildReport {
        let (decoded, failed) = decode::<JobRecord>(jobs, "job");
        BuildReport {
            events: decoded.iter().filter_map(|j| self.deadline_event(j)).collect(),
            processed: jobs.len(),
            failed,
        }
    }

    /// All event kinds, ordered by start time then id.
    ///
    /// Each record is decoded once, so a broken record counts as one failure.
    pub fn build_all(&self, users: &[Value], jobs: &[Value]) -> BuildReport {
        let (decoded_users, failed_users) = decode::<UserRecord>(users, "user");
        let (decoded_jobs, failed_jobs) = decode::<JobRecord>(jobs, "job");

        let mut report = BuildReport {
            events: decoded_users
                .iter()
                .filter_map(|u| self.resume_event(u))
                .collect(),
            processed: users.len(),
            failed: failed_users,
        };
        report.events.extend(decoded_users.iter().flat_map(|u| self.interviews_for(u)));

        report.extend(BuildReport {
            events: decoded_jobs
                .iter()
                .filter_map(|j| self.new_job_event(j))
                .chain(decoded_jobs.iter().filter_map(|j| self.deadline_event(j)))
                .collect(),
            processed: jobs.len(),
            failed: failed_jobs,
        });

        report
            .events
            .sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        report
    }

    fn resume_event(&self, user: &UserRecord) -> Option<CalendarEvent> {
        let resume_url = user.resume_url()?;

        let uploaded = user
            .professional_info
            .as_ref()
            .and_then(|info| info.resume_uploaded_at)
            .or(user.updated_at)
            .or(user.created_at);

        let start = match (uploaded, self.missing_resume_date) {
            (Some(at), _) => at,
            (None, MissingResumeDate::UseNow) => {
                tracing::debug!("Resume for user {} has no date, using now", user.id);
                self.now
            }
            (None, MissingResumeDate::Skip) => return None,
        };

        if !self.window.contains(start) {
            return None;
        }

        let summary = user.summary();
        Some(CalendarEvent {
            id: format!("resume-{}", user.id),
            title: format!("Resume: {}", summary.name),
            start,
            event_type: EventType::Resume,
            color: EventType::Resume.color().to_string(),
            extended_props: EventPayload::Resume {
                user: summary,
                resume_url: resume_url.to_string(),
                status: user.status.unwrap_or_default(),
            },
        })
    }

    fn interviews_for(&self, user: &UserRecord) -> Vec<CalendarEvent> {
        user.applications
            .iter()
            .enumerate()
            .filter_map(|(index, application)| {
                let start = application.interview_date?;
                if !self.window.contains(start) {
                    return None;
                }

                let summary = user.summary();
                let job = JobSummary {
                    id: application.job.clone().unwrap_or_default(),
                    title: application
                        .job_title
                        .clone()
                        .unwrap_or_else(|| "Interview".to_string()),
                    company: None,
                    location: None,
                };

                Some(CalendarEvent {
                    id: format!("interview-{}-{}", user.id, index),
                    title: format!("Interview: {} - {}", summary.name, job.title),
                    start,
                    event_type: EventType::Interview,
                    color: EventType::Interview.color().to_string(),
                    extended_props: EventPayload::Interview {
                        user: summary,
                        job,
                        status: application.status.unwrap_or(ApprovalStatus::Pending),
                    },
                })
            })
            .collect()
    }

    fn new_job_event(&self, job: &JobRecord) -> Option<CalendarEvent> {
        let start = job.created_at.filter(|at| self.window.contains(*at))?;
        Some(CalendarEvent {
            id: format!("job-{}", job.id),
            title: format!("New Job: {}", job.display_title()),
            start,
            event_type: EventType::NewJob,
            color: EventType::NewJob.color().to_string(),
            extended_props: EventPayload::NewJob {
                job: job.summary(),
                status: job.status.unwrap_or_default(),
            },
        })
    }

    fn deadline_event(&self, job: &JobRecord) -> Option<CalendarEvent> {
        let start = job
            .application_deadline
            .filter(|at| self.window.contains(*at))?;
        Some(CalendarEvent {
            id: format!("deadline-{}", job.id),
            title: format!("Deadline: {}", job.display_title()),
            start,
            event_type: EventType::Deadline,
            color: EventType::Deadline.color().to_string(),
            extended_props: EventPayload::Deadline {
                job: job.summary(),
                status: job.status.unwrap_or_default(),
            },
        })
    }
}

/// Admin-created calendar entry
pub fn custom_event(title: impl Into<String>, start: DateTime<Utc>, note: Option<String>) -> CalendarEvent {
    CalendarEvent {
        id: format!("custom-{}", uuid::Uuid::new_v4()),
        title: title.into(),
        start,
        event_type: EventType::Custom,
        color: EventType::Custom.color().to_string(),
        extended_props: EventPayload::Custom {
            note,
            status: ApprovalStatus::Approved,
        },
    }
}

fn decode<T: DeserializeOwned>(records: &[Value], label: &str) -> (Vec<T>, usize) {
    let mut decoded = Vec::with_capacity(records.len());
    let mut failed = 0;

    for (index, record) in records.iter().enumerate() {
        match T::deserialize(record) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                failed += 1;
                tracing::debug!("Skipping {} record #{}: {}", label, index, e);
            }
        }
    }

    (decoded, failed)
}
