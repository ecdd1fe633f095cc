use serde_json::json;

use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// `database` is a container: schemas are declared beneath it via
/// [`crate::resource::Container::add`].
pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::Database, name)
        .with_attr("data_retention_time_in_days", json!(1))
        .with_attr("transient", json!(false))
}
