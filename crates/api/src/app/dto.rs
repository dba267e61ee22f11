use serde::Serialize;

// -------------------------
// Response DTOs
// -------------------------

/// Acknowledgement of a manual trigger. Never carries the job's outcome.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: String,
}

impl TriggerResponse {
    pub fn triggered(slug: &str) -> Self {
        Self {
            status: format!("{slug} cleanup triggered"),
        }
    }
}
