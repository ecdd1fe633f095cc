use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// Enterprise+ only (spec §3, `ResourceType.edition`).
pub fn new(name: impl Into<crate::resource::NameOrVar>) -> Resource {
    Resource::new(ResourceType::ImageRepository, name)
}
