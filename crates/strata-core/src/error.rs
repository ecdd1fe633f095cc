use thiserror::Error;

use crate::identifiers::URN;

/// The distinct failure categories the reconciliation engine can raise.
///
/// The core never catches its own errors — every fallible entry point
/// (`generate_manifest`, `plan`, `compile_plan_to_sql`) propagates one of
/// these directly to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("invalid resource: {resource_type} is not permitted by the blueprint's allowlist or scope")]
    InvalidResource { resource_type: String },

    #[error("duplicate resource: {urn} was declared twice with conflicting attributes")]
    DuplicateResource { urn: URN },

    #[error("missing variable: `{0}` was referenced but no value or default was supplied")]
    MissingVar(String),

    #[error("wrong edition: {urn} (or one of its attributes) is not available under account edition {edition}")]
    WrongEdition { urn: URN, edition: String },

    #[error("non-conforming plan: {0}")]
    NonConformingPlan(String),

    /// Reported by the remote client during `apply`. Never constructed by
    /// the planner or compiler themselves — this variant exists so the
    /// (external) apply path can share the engine's error type.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
