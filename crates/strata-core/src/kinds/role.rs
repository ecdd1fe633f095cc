use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// Creating a role requires `CREATE ROLE`, held by `USERADMIN` on a
/// freshly bootstrapped account (spec §4.G, acting-role resolution).
pub const REQUIRED_PRIVILEGE: &str = "CREATE ROLE";
pub const PRIVILEGED_ROLE: &str = "USERADMIN";

pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::Role, name)
}
