use serde_json::{json, Value};

use crate::identifiers::ResourceType;
use crate::resource::Resource;

/// Functions are polymorphic: two declarations with the same name but
/// different `arg_types` are distinct resources (spec §3,
/// `ResourceType.is_polymorphic`). The argument type list lives in the
/// `arg_types` attribute; the manifest builder copies it into the
/// resource's [`crate::identifiers::FQN`] when it assigns a URN.
pub fn new(name: impl Into<crate::resource::NameOrVar>, arg_types: Vec<String>) -> Resource {
    Resource::new(ResourceType::Function, name)
        .with_attr("arg_types", Value::Array(arg_types.into_iter().map(Value::String).collect()))
        .with_attr("language", json!("SQL"))
}
