use crate::identifiers::ResourceType;
use crate::resource::Resource;

pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::Table, name)
}
