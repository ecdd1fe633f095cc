use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::{LocalRef, Resource, ResourcePointer};

/// `grant priv ON FUTURE on_type IN on_container TO role`. Applies to
/// objects not yet created under the container.
pub fn new(privilege: impl Into<String>, in_container: LocalRef, on_type: ResourceType, to_role: impl Into<String>) -> Resource {
    let privilege = privilege.into();
    Resource::new(
        ResourceType::FutureGrant,
        format!("{}::future::{}::{}", in_container.addr(), on_type.label(), privilege),
    )
    .with_attr("privilege", json!(privilege))
    .with_attr("in_container", ResourcePointer(in_container))
    .with_attr("on_type", json!(on_type.label()))
    .with_attr("to_role", json!(to_role.into()))
}
