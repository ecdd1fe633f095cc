//! Per-kind defaults and privilege rules for each concrete
//! [`crate::identifiers::ResourceType`]. Each module contributes a thin
//! constructor (sane default attributes) and a `required_privileges`
//! function consulted by the compiler when choosing an acting role
//! (spec §4.G).

pub mod compute_pool;
pub mod database;
pub mod database_role;
pub mod function;
pub mod grant;
pub mod image_repository;
pub mod integration;
pub mod role;
pub mod role_grant;
pub mod root;
pub mod schema;
pub mod table;
pub mod tag;
pub mod task;
pub mod view;
pub mod warehouse;

use crate::identifiers::ResourceType;

/// The privilege token required to act on a resource of this type, if
/// one of the two named exceptions applies; `None` means the session's
/// configured role is used directly (spec §4.G, "minimum-privilege acting
/// role").
pub fn required_privilege(resource_type: ResourceType) -> Option<&'static str> {
    match resource_type {
        ResourceType::Role => Some("CREATE ROLE"),
        ResourceType::RoleGrant => Some("GRANT ROLE"),
        _ => None,
    }
}
