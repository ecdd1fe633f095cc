use serde_json::json;

use crate::account::AccountEdition;
use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// `scaling_policy` is an Enterprise+ attribute; the manifest builder
/// drops it when sealing under [`AccountEdition::Standard`] rather than
/// raising [`crate::error::CoreError::WrongEdition`], since it has a
/// sensible STANDARD-compatible default (spec §4.D step 6, edition
/// check).
pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::Warehouse, name)
        .with_attr("warehouse_size", json!("XSMALL"))
        .with_attr("auto_suspend", json!(60))
        .with_attr("auto_resume", json!(true))
        .with_attr("scaling_policy", json!("STANDARD"))
}

pub fn scaling_policy_editions() -> &'static [AccountEdition] {
    &[AccountEdition::Enterprise, AccountEdition::BusinessCritical]
}
