//! Core trait and error definitions for the CHRONOS flow core
//!
//! This module fixes the numeric model shared by every flow component, the
//! error taxonomy of a maximum-flow computation, the run metrics reported
//! alongside a result, and the parameter surface through which solvers are
//! configured.
//!
//! # Numeric Model
//! Capacities, flows and excesses are exact 64-bit integers. The residual
//! network builder guarantees that the sum of all arc capacities fits in an
//! `i64`, so no intermediate value of a run can overflow.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::Debug;
use serde::{Serialize, Deserialize};

/// Edge capacity type
pub type Capacity = i64;

/// Flow and excess value type
pub type Flow = i64;

/// Distance label type for push-relabel
pub type Height = usize;

/// Comprehensive error types for flow computations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Rejected before any residual network exists
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An infinite-capacity path joins source and sink
    #[error("Infinite capacity path, flow unbounded above")]
    Unbounded,

    /// Bookkeeping defect detected during the run
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl FlowError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        FlowError::InvalidInput(reason.into())
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        FlowError::InternalInvariantViolation(reason.into())
    }
}

/// Flow algorithm performance metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Number of push operations
    pub push_operations: usize,
    /// Number of relabel operations
    pub relabel_operations: usize,
    /// Number of global relabel passes
    pub global_relabels: usize,
    /// Number of gap heuristic applications
    pub gap_relabels: usize,
    /// Algorithm execution time
    pub execution_time_ms: f64,
}

/// Algorithm parameter with strongly typed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
    pub description: String,
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Boolean,
}

/// Main algorithm trait for configurable flow solvers
///
/// # Invariants
/// - State isolation between runs: no residual network, label table or
///   budget outlives a single solve call
/// - Deterministic behavior for given inputs
pub trait Algorithm: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g., max_flow)
    fn category(&self) -> &'static str;

    /// Returns the algorithm's description with complexity guarantees
    fn description(&self) -> String;

    /// Returns supported parameters with type information
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), FlowError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// Returns every parameter as a name/value map
    fn get_parameters(&self) -> HashMap<String, String> {
        self.parameters()
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect()
    }
}
