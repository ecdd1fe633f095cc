use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// Enterprise+ only (spec §3, `ResourceType.edition`).
pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::ComputePool, name)
        .with_attr("min_nodes", json!(1))
        .with_attr("max_nodes", json!(1))
        .with_attr("auto_suspend_secs", json!(300))
}
