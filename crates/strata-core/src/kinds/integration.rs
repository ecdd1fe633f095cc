use crate::identifiers::ResourceType;
use crate::resource::Resource;

pub fn new(name: impl Into<crate::resource::NameOrVar>, integration_type: impl Into<String>) -> Resource {
    Resource::new(ResourceType::Integration, name).with_attr("integration_type", serde_json::json!(integration_type.into()))
}
