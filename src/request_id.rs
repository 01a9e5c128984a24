//! Request ID generation for tracing
//!
//! Generates a unique UUID for each analysis request so that every log line
//! produced while scoring, selecting, and dispatching can be correlated.

use serde::Serialize;
use uuid::Uuid;

/// Request ID wrapper type attached to every analysis request
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
