use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// The schema named `PUBLIC` exists implicitly in every database and is
/// elided from manifest output unless it carries non-default attributes
/// (spec §4.D, "PUBLIC schema pointer elision").
pub const IMPLICIT_NAME: &str = "PUBLIC";

pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::Schema, name)
        .with_attr("data_retention_time_in_days", json!(1))
        .with_attr("transient", json!(false))
}

pub fn is_implicit_public(resource: &Resource) -> bool {
    resource.resource_type == ResourceType::Schema && resource.display_name().eq_ignore_ascii_case(IMPLICIT_NAME)
}
