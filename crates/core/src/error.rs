//! Error taxonomy for user-triggered actions
//!
//! Every action the session performs maps its failure onto one of these
//! types. None of them is fatal: the session reports them as notifications.

use std::path::PathBuf;

/// Failures while reading or classifying a source file
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Unsupported file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures produced by the compiler dispatcher
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Compiler diagnostics, kept verbatim
    #[error("{0}")]
    Diagnostics(String),

    #[error("{hint}\n\n{tool}: command not found")]
    ToolNotFound { tool: String, hint: String },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected compiler output: {0}")]
    MalformedOutput(String),

    #[error("No contract found in source")]
    NoContract,

    #[error("Cannot pick a primary contract among: {}", .0.join(", "))]
    AmbiguousContract(Vec<String>),

    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),
}

/// Failures while turning user text into typed call arguments
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Expected {expected} argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("Invalid integer for {ty} '{value}'")]
    InvalidInteger { ty: String, value: String },

    #[error("Invalid {ty} value '{value}': {reason}")]
    InvalidValue {
        ty: String,
        value: String,
        reason: String,
    },

    #[error("Invalid payable value '{0}'")]
    InvalidAmount(String),
}

/// Failures at the network boundary
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Failed to start local test node: {0}")]
    Node(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Transaction {0} was dropped before confirmation")]
    Dropped(String),

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("Receipt for {0} carries no contract address")]
    MissingAddress(String),
}

/// Failures while deploying a compiled artifact
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Compile a contract before deploying")]
    NotCompiled,

    #[error("No active account selected")]
    NoAccount,

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    #[error("Invalid bytecode: {0}")]
    Bytecode(String),

    #[error("Failed to encode constructor call: {0}")]
    Encoding(String),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Failures while invoking a generated control
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("No deployed contract")]
    NotDeployed,

    #[error("Unknown function control #{0}")]
    UnknownControl(usize),

    #[error("No active account selected")]
    NoAccount,

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    #[error("Failed to encode call to {function}: {reason}")]
    Encoding { function: String, reason: String },

    #[error("Failed to decode output of {function}: {reason}")]
    Decoding { function: String, reason: String },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Failures while writing the generated deployment script
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Compile a contract before generating a script")]
    NotCompiled,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while scaffolding a project directory
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("Directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Select and compile a contract before generating a project")]
    NothingToScaffold,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
