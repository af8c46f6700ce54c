use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pointer-move observation, relative to session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub elapsed_seconds: f64,
}

impl PointerSample {
    /// Coordinate cell text, `"<x>,<y>"`.
    pub fn coordinate_label(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointerSampleInput {
    pub x: f64,
    pub y: f64,
    /// Client-side event time; the server clock is used when absent.
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPointerRequest {
    pub samples: Vec<PointerSampleInput>,
}

#[derive(Debug, Serialize)]
pub struct RecordPointerResponse {
    pub accepted: usize,
    pub dropped: usize,
    pub trace_len: usize,
}
