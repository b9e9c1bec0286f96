// Diagnostics - Validation failures and the channel that reports them
// The engine never fails a call; rejected input is reported here and ignored

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// A rejected configuration call or bad accessor index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be between 0 and {max}, got {index}")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        max: usize,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::OutOfRange { field, .. } | Self::IndexOutOfRange { field, .. } => field,
        }
    }

    /// Checks `value` against the closed interval `[min, max]`
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value < min || value > max || value.is_nan() {
            return Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Checks `index` against `[0, max]`
    pub fn check_index(field: &'static str, index: usize, max: usize) -> Result<(), Self> {
        if index > max {
            return Err(Self::IndexOutOfRange { field, index, max });
        }
        Ok(())
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Host-side receiver for validation failures
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, error: &ValidationError);
}

/// Forwards every failure to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, error: &ValidationError) {
        tracing::warn!(field = error.field(), "[grav] {}", error);
    }
}

/// Drops every failure
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _error: &ValidationError) {}
}

/// A reported failure with its arrival time
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub at: DateTime<Utc>,
    pub field: &'static str,
    pub message: String,
}

/// Keeps reported failures in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, error: &ValidationError) {
        self.entries.lock().push(Diagnostic {
            at: Utc::now(),
            field: error.field(),
            message: error.to_string(),
        });
    }
}
