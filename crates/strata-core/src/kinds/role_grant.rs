use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// `GRANT ROLE child TO ROLE parent` (or `TO USER`). Requires
/// `GRANT ROLE`, held by `SECURITYADMIN` on a freshly bootstrapped
/// account (spec §4.G, acting-role resolution).
pub const REQUIRED_PRIVILEGE: &str = "GRANT ROLE";
pub const PRIVILEGED_ROLE: &str = "SECURITYADMIN";

pub fn new(child_role: impl Into<String>, parent_role: impl Into<String>) -> Resource {
    let child_role = child_role.into();
    let parent_role = parent_role.into();
    Resource::new(ResourceType::RoleGrant, child_role.clone())
        .with_attr("role", json!(child_role))
        .with_attr("to_role", json!(parent_role))
}
