//! Declarative endpoint probing.
//!
//! Each record collection lists equivalent endpoints in priority order.
//! [`probe`] walks that list and stops at the first endpoint that yields
//! records. [`probe_all`] probes users and jobs side by side and, when either
//! comes up empty, asks the dashboard summary endpoint once for both.

use serde_json::Value;
use shared_types::{extract_records, extract_total, Extraction};

use crate::error::CalendarResult;
use crate::source::{DataSource, QueryParams};

/// Dashboard summary endpoint of last resort, shared by every collection
pub const DASHBOARD: &str = "/dashboard/stats";

/// One candidate endpoint and the keys its record list may live under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    pub path: &'static str,
    pub fields: &'static [&'static str],
}

impl Resolver {
    pub const fn new(path: &'static str, fields: &'static [&'static str]) -> Self {
        Self { path, fields }
    }
}

/// Ordered resolvers for one kind of record
#[derive(Debug, Clone, Copy)]
pub struct Collection {
    pub name: &'static str,
    pub resolvers: &'static [Resolver],
    /// Key of this collection inside the [`DASHBOARD`] body
    pub dashboard_field: &'static str,
}

const USER_FIELDS: &[&str] = &["users", "items", "docs", "results"];
const JOB_FIELDS: &[&str] = &["jobs", "items", "docs", "results"];

pub const USERS: Collection = Collection {
    name: "users",
    resolvers: &[
        Resolver::new("/admin/users", USER_FIELDS),
        Resolver::new("/dashboard/users", USER_FIELDS),
        Resolver::new("/users/list", USER_FIELDS),
        Resolver::new("/users/all", USER_FIELDS),
    ],
    dashboard_field: "recentUsers",
};

pub const JOBS: Collection = Collection {
    name: "jobs",
    resolvers: &[
        Resolver::new("/jobs", JOB_FIELDS),
        Resolver::new("/admin/jobs", JOB_FIELDS),
    ],
    dashboard_field: "recentJobs",
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// First endpoint that produced records
    Found {
        endpoint: &'static str,
        records: Vec<Value>,
        total: Option<u64>,
    },
    /// Every endpoint answered, none had records
    Empty { reasons: Vec<String> },
    /// No records, and at least one endpoint failed at the transport level
    Unreachable {
        last_error: String,
        reasons: Vec<String>,
    },
}

impl ProbeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ProbeOutcome::Found { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ProbeOutcome::Unreachable { .. })
    }

    /// Records and total, empty when nothing was found
    pub fn into_records(self) -> (Vec<Value>, u64) {
        match self {
            ProbeOutcome::Found { records, total, .. } => {
                let total = total.unwrap_or(records.len() as u64);
                (records, total)
            }
            _ => (Vec::new(), 0),
        }
    }

    /// Record a failed endpoint. A transport failure makes the outcome unreachable.
    fn failed(self, reason: String, transport: bool) -> Self {
        match self {
            ProbeOutcome::Found { .. } => self,
            ProbeOutcome::Empty { mut reasons } => {
                reasons.push(reason.clone());
                if transport {
                    ProbeOutcome::Unreachable {
                        last_error: reason,
                        reasons,
                    }
                } else {
                    ProbeOutcome::Empty { reasons }
                }
            }
            ProbeOutcome::Unreachable {
                last_error,
                mut reasons,
            } => {
                reasons.push(reason.clone());
                ProbeOutcome::Unreachable {
                    last_error: if transport { reason } else { last_error },
                    reasons,
                }
            }
        }
    }

    /// Fold one endpoint response into the outcome; a found outcome is kept as is
    fn answer(
        self,
        path: &'static str,
        fields: &[&str],
        response: &CalendarResult<Value>,
    ) -> Self {
        if self.is_found() {
            return self;
        }
        match response {
            Ok(body) => match extract_records(body, fields) {
                Extraction::Records(records) => ProbeOutcome::Found {
                    endpoint: path,
                    total: extract_total(body),
                    records,
                },
                Extraction::Empty => self.failed(format!("{}: empty", path), false),
                Extraction::Unsuccessful(message) => {
                    self.failed(format!("{}: {}", path, message), false)
                }
            },
            Err(e) => {
                tracing::debug!("Endpoint {} failed: {}", path, e);
                self.failed(e.to_string(), e.is_transport())
            }
        }
    }
}

/// Try each resolver of `collection` in order until one yields records
pub async fn probe(
    source: &dyn DataSource,
    collection: &Collection,
    query: &QueryParams,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome::Empty {
        reasons: Vec::new(),
    };

    for resolver in collection.resolvers {
        let response = source.get_json(resolver.path, query).await;
        outcome = outcome.answer(resolver.path, resolver.fields, &response);
        if let ProbeOutcome::Found { records, .. } = &outcome {
            tracing::debug!(
                "Loaded {} {} from {}",
                records.len(),
                collection.name,
                resolver.path
            );
            break;
        }
    }

    outcome
}

/// Probe users and jobs, then fill whichever is missing from [`DASHBOARD`].
///
/// The dashboard endpoint is requested at most once per call.
pub async fn probe_all(source: &dyn DataSource, query: &QueryParams) -> (ProbeOutcome, ProbeOutcome) {
    let (users, jobs) = tokio::join!(
        probe(source, &USERS, query),
        probe(source, &JOBS, query),
    );
    if users.is_found() && jobs.is_found() {
        return (users, jobs);
    }

    let missing: Vec<&str> = [(&USERS, &users), (&JOBS, &jobs)]
        .into_iter()
        .filter(|(_, outcome)| !outcome.is_found())
        .map(|(collection, _)| collection.name)
        .collect();
    tracing::warn!(
        "All primary {} endpoints failed, trying {}",
        missing.join(" and "),
        DASHBOARD
    );

    let dashboard = source.get_json(DASHBOARD, query).await;
    (
        users.answer(DASHBOARD, &[USERS.dashboard_field], &dashboard),
        jobs.answer(DASHBOARD, &[JOBS.dashboard_field], &dashboard),
    )
}
