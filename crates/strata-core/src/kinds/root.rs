use crate::identifiers::{FQN, ResourceType, URN};
use crate::resource::Resource;

/// The implicit account-scope sentinel. Every blueprint's declared tree
/// has exactly one account resource as its root; it owns no attributes
/// and is never emitted as a DDL statement, but it anchors container
/// nesting and gives every URN an unambiguous top of the tree (spec §3,
/// `ResourceType.ACCOUNT`).
pub fn new() -> Resource {
    Resource::new(ResourceType::Account, "ACCOUNT")
}

pub fn sentinel_urn(account_locator: impl Into<String>) -> URN {
    URN::new(ResourceType::Account, FQN::name("ACCOUNT"), account_locator)
}
