//! Reconciliation engine for declaratively managed warehouse objects:
//! resources are declared into a tree, sealed into a [`manifest::Manifest`]
//! against a variable [`var::Environment`], diffed against observed
//! [`state::RemoteState`] by the [`planner`], and compiled to SQL by the
//! [`compiler`]. The engine itself performs no I/O — callers supply
//! remote state and execute the compiled statements themselves.
//!
//! Public surface:
//! - [`identifiers`] — `ResourceName`, `FQN`, `URN`, `ResourceType`
//! - [`account`] — edition, scope, run mode, session context
//! - [`var`] — deferred-interpolation strings and the variable environment
//! - [`resource`] — declared resource records and the container tree
//! - [`kinds`] — per-type defaults and privilege rules
//! - [`config`] — blueprint configuration and its validation rules
//! - [`manifest`] — the manifest builder
//! - [`state`] — the remote-state snapshot type
//! - [`planner`] — diffing, ordering, and plan conformance
//! - [`compiler`] — plan-to-SQL compilation
//! - [`sql`] — the generic DDL renderer used by the compiler
//! - [`serializer`] — plan JSON/text (de)serialization
//! - [`blueprint`] — the top-level facade gluing the above together
//! - [`error`] — the engine's single error type

pub mod account;
pub mod blueprint;
pub mod compiler;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod kinds;
pub mod manifest;
pub mod planner;
pub mod resource;
pub mod serializer;
pub mod sql;
pub mod state;
pub mod var;

pub use account::{AccountEdition, BlueprintScope, RunMode, SessionContext};
pub use blueprint::Blueprint;
pub use config::BlueprintConfig;
pub use error::CoreError;
pub use identifiers::{FQN, ResourceName, ResourceType, URN};
pub use manifest::Manifest;
pub use planner::{ChangeKind, Plan, PlanItem};
pub use state::RemoteState;
