//! Synthetic records served outside production when the API has no data.

use chrono::Duration;
use serde_json::{json, Value};
use shared_types::DateRange;

/// Dates are placed inside `window` so the fallback is visible in the current view
pub fn mock_users(window: &DateRange) -> Vec<Value> {
    let at = |days: i64| (window.start + Duration::days(days)).min(window.end).to_rfc3339();

    vec![
        json!({
            "_id": "mock-user-1",
            "name": "Sample Job Seeker",
            "email": "seeker@example.com",
            "role": "jobSeeker",
            "status": "approved",
            "createdAt": at(1),
            "professionalInfo": {"resume": "https://example.com/resumes/sample-1.pdf"},
            "applications": [
                {"job": "mock-job-1", "jobTitle": "Sample Frontend Developer", "status": "pending", "interviewDate": at(4)}
            ]
        }),
        json!({
            "_id": "mock-user-2",
            "name": "Sample Trainer",
            "email": "trainer@example.com",
            "role": "trainer",
            "status": "pending",
            "createdAt": at(2),
            "professionalInfo": {"resume": "https://example.com/resumes/sample-2.pdf"}
        }),
        json!({
            "_id": "mock-user-3",
            "name": "Sample Employer",
            "email": "employer@example.com",
            "role": "employer",
            "status": "approved",
            "createdAt": at(3)
        }),
    ]
}

pub fn mock_jobs(window: &DateRange) -> Vec<Value> {
    let at = |days: i64| (window.start + Duration::days(days)).min(window.end).to_rfc3339();

    vec![
        json!({
            "_id": "mock-job-1",
            "title": "Sample Frontend Developer",
            "company": "Example Corp",
            "location": "Remote",
            "status": "approved",
            "createdAt": at(0),
            "applicationDeadline": at(10)
        }),
        json!({
            "_id": "mock-job-2",
            "title": "Sample Data Analyst",
            "company": "Example Corp",
            "location": "Lagos",
            "status": "pending",
            "createdAt": at(5)
        }),
    ]
}
