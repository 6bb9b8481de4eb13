//! Error types for filter simulation, dataset handling, training and design.
//!
//! This module provides a unified error type [`DesignError`] that covers
//! netlist parsing, circuit validation, AC simulation, model I/O and the
//! inverse-design loop.

use thiserror::Error;

/// Result type alias using [`DesignError`].
pub type Result<T> = std::result::Result<T, DesignError>;

/// Unified error type for all operations in this crate.
#[derive(Error, Debug)]
pub enum DesignError {
    // ============ Netlist Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid component definition
    #[error("Invalid component '{name}' at line {line}: {message}")]
    InvalidComponent {
        name: String,
        line: usize,
        message: String,
    },

    /// Unknown component type
    #[error("Unknown component type '{component_type}' at line {line}")]
    UnknownComponentType { component_type: String, line: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for '{component}': {message}")]
    InvalidParameter {
        component: String,
        param: String,
        message: String,
    },

    // ============ Circuit Validation Errors ============
    /// Node not found in circuit
    #[error("Node '{node}' not found in circuit")]
    NodeNotFound { node: String },

    /// Missing input node
    #[error("No input node specified (use '.input <node>')")]
    MissingInput,

    /// Missing output node
    #[error("No output node specified (use '.output <node>')")]
    MissingOutput,

    /// Duplicate component name
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    /// Structurally unusable circuit
    #[error("Invalid circuit: {message}")]
    InvalidCircuit { message: String },

    // ============ Simulation Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix - circuit may have a short circuit or floating node")]
    SingularMatrix,

    /// The AC solve failed at a swept frequency
    #[error("Simulation failed at {frequency:.3e} Hz: {message}")]
    SimulationFailure { frequency: f64, message: String },

    /// The solver backend did not pass its startup self-check
    #[error("Circuit solver backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    // ============ Design Errors ============
    /// Requested filter kind is not supported
    #[error("Invalid filter topology '{name}' (expected lowpass, highpass or bandpass)")]
    InvalidTopology { name: String },

    /// A component value required by the topology was not supplied
    #[error("{topology} filter requires a value for {param}")]
    MissingParameter { topology: String, param: String },

    /// Two pieces of data disagree on a length or shape
    #[error("Dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    /// Invalid training or generation configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Loss became NaN or infinite
    #[error("Training diverged at epoch {epoch}: loss is not finite")]
    TrainingDiverged { epoch: usize },

    // ============ I/O Errors ============
    /// Error reading a file
    #[error("Failed to read '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a file
    #[error("Failed to write '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or unreadable dataset archive
    #[error("Failed to read dataset '{path}': {source}")]
    NpzRead {
        path: String,
        #[source]
        source: ndarray_npy::ReadNpzError,
    },

    /// Dataset archive lacks a required array
    #[error("Dataset '{path}' has no '{name}' array")]
    MissingArray { path: String, name: String },

    /// Dataset archive holds values no simulation could have produced
    #[error("Corrupt dataset '{path}': {message}")]
    CorruptDataset { path: String, message: String },

        /// Dataset archive could not be written
    #[error("Failed to write dataset '{path}': {source}")]
    NpzWrite {
        path: String,
        #[source]
        source: ndarray_npy::WriteNpzError,
    },

    /// Malformed checkpoint file
    #[error("Invalid checkpoint '{path}': {source}")]
    CheckpointFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Metrics log could not be written
    #[error("Metrics log error for '{path}': {source}")]
    MetricsLog {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl DesignError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            name: name.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        component: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            component: component.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            got,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a simulation failure at the given frequency
    pub fn simulation_failure(frequency: f64, message: impl Into<String>) -> Self {
        Self::SimulationFailure {
            frequency,
            message: message.into(),
        }
    }
}
