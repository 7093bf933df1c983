//! Scripted data source and fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{CalendarError, CalendarResult};
use crate::source::{DataSource, QueryParams};

#[derive(Debug, Clone)]
enum Route {
    Json(Value),
    Down,
    Reject,
}

/// In-memory [`DataSource`] answering from a route table.
///
/// Unknown paths answer 404 like a live server without that route. While an
/// outage is active, every call fails at the transport level and decrements
/// the outage counter.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    outage: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Users on `/admin/users`, jobs on `/jobs`
    pub(crate) fn portal() -> Self {
        Self::new()
            .respond("/admin/users", json!({"success": true, "data": portal_users()}))
            .respond("/jobs", json!({"success": true, "data": portal_jobs()}))
    }

    pub(crate) fn respond(self, path: &str, body: Value) -> Self {
        self.set_route(path, body);
        self
    }

    pub(crate) fn down(self, path: &str) -> Self {
        self.set_down(path);
        self
    }

    pub(crate) fn reject(self, path: &str) -> Self {
        self.routes.lock().unwrap().insert(path.to_string(), Route::Reject);
        self
    }

    pub(crate) fn with_outage(self, calls: usize) -> Self {
        self.set_outage(calls);
        self
    }

    pub(crate) fn set_outage(&self, calls: usize) {
        self.outage.store(calls, Ordering::SeqCst);
    }

    pub(crate) fn set_route(&self, path: &str, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Json(body));
    }

    /// Make `path` fail at the transport level, like a 503 or timeout
    pub(crate) fn set_down(&self, path: &str) {
        self.routes.lock().unwrap().insert(path.to_string(), Route::Down);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn get_json(&self, path: &str, _query: &QueryParams) -> CalendarResult<Value> {
        self.calls.lock().unwrap().push(path.to_string());

        let in_outage = self
            .outage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if in_outage {
            return Err(CalendarError::transport(path, "connection reset"));
        }

        let route = self.routes.lock().unwrap().get(path).cloned();
        match route {
            Some(Route::Json(body)) => Ok(body),
            Some(Route::Reject) => Err(CalendarError::unsuccessful(path, "HTTP 403")),
            Some(Route::Down) => Err(CalendarError::transport(path, "HTTP 503")),
            None => Err(CalendarError::unsuccessful(path, "HTTP 404")),
        }
    }
}

/// Three users in May 2024, two of them with a resume
pub(crate) fn portal_users() -> Vec<Value> {
    vec![
        json!({
            "_id": "u1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "jobSeeker",
            "status": "approved",
            "createdAt": "2024-05-02T10:00:00Z",
            "professionalInfo": {"resume": "https://cdn.example.com/u1.pdf"}
        }),
        json!({
            "_id": "u2",
            "name": "Alan Turing",
            "email": "alan@example.com",
            "role": "trainer",
            "status": "pending",
            "createdAt": "2024-05-03T10:00:00Z",
            "professionalInfo": {"resume": "https://cdn.example.com/u2.pdf"}
        }),
        json!({
            "_id": "u3",
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "role": "employer",
            "status": "approved",
            "createdAt": "2024-05-04T10:00:00Z"
        }),
    ]
}

/// Two jobs created in May 2024 with deadlines later that month
pub(crate) fn portal_jobs() -> Vec<Value> {
    vec![
        json!({
            "_id": "j1",
            "title": "Rust Engineer",
            "company": "Ferrous Inc",
            "status": "approved",
            "createdAt": "2024-05-05T08:00:00Z",
            "applicationDeadline": "2024-05-20T17:00:00Z"
        }),
        json!({
            "_id": "j2",
            "title": "Data Analyst",
            "company": "Ferrous Inc",
            "status": "pending",
            "createdAt": "2024-05-06T08:00:00Z",
            "applicationDeadline": "2024-05-25T17:00:00Z"
        }),
    ]
}

/// `count` job seekers with resumes, one per hour from 2024-05-01
pub(crate) fn many_users(count: usize) -> Vec<Value> {
    let base = chrono::DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    (0..count)
        .map(|i| {
            let created = base + chrono::Duration::hours(i as i64);
            json!({
                "_id": format!("bulk-{:04}", i),
                "name": format!("Applicant {}", i),
                "role": "jobSeeker",
                "status": "approved",
                "createdAt": created.to_rfc3339(),
                "professionalInfo": {"resume": format!("https://cdn.example.com/bulk-{}.pdf", i)}
            })
        })
        .collect()
}
