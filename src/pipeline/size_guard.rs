use serde::Serialize;

use crate::pipeline::error::PipelineError;
use crate::pipeline::outcome::OperationResult;

/// Measures the encoded size of outbound payloads against a byte limit
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    max_bytes: usize,
}

impl SizeGuard {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Encoded JSON length of `payload`, or an encoding failure
    pub fn measure<T: Serialize + ?Sized>(&self, payload: &T) -> Result<usize, PipelineError> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(bytes.len())
    }

    /// Reject payloads whose encoding is larger than the limit. Absent results always pass.
    pub fn check<T: Serialize>(&self, payload: &OperationResult<T>) -> Result<usize, PipelineError> {
        if payload.is_empty() {
            return Ok(0);
        }
        self.check_value(payload)
    }

    pub fn check_value<T: Serialize + ?Sized>(&self, payload: &T) -> Result<usize, PipelineError> {
        let size = self.measure(payload)?;
        if size > self.max_bytes {
            tracing::warn!(size, limit = self.max_bytes, "outbound payload exceeds size limit");
            return Err(PipelineError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(size)
    }
}
