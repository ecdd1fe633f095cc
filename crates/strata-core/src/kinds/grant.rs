use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::{LocalRef, Resource, ResourcePointer};

/// `grant priv ON on_type on_name TO role`. The grant itself has no
/// owner; privileges are exercised by the session's configured role
/// (spec §4.G, "everything else" case).
pub fn new(privilege: impl Into<String>, on: LocalRef, to_role: impl Into<String>) -> Resource {
    let privilege = privilege.into();
    Resource::new(ResourceType::Grant, format!("{}::{}", on.addr(), privilege))
        .with_attr("privilege", json!(privilege))
        .with_attr("on", ResourcePointer(on))
        .with_attr("to_role", json!(to_role.into()))
}
