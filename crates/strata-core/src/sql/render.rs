use serde_json::Value;

use crate::identifiers::URN;

/// A minimal, generic DDL renderer. Intentionally not a per-kind SQL
/// dialect generator: it renders `CREATE <TYPE> <FQN> (key = value, ...)`
/// from whatever attributes the manifest resolved, rather than knowing
/// the specific clause grammar of every resource type. Per-kind SQL
/// surface is explicitly out of scope.
pub fn create(urn: &URN, attrs: &Value) -> String {
    let keyword = urn.resource_type.label().to_uppercase().replace('_', " ");
    let clauses = render_attrs(attrs);
    if clauses.is_empty() {
        format!("CREATE {keyword} {}", urn.fqn)
    } else {
        format!("CREATE {keyword} {} {clauses}", urn.fqn)
    }
}

pub fn alter(urn: &URN, attrs: &Value) -> String {
    let keyword = urn.resource_type.label().to_uppercase().replace('_', " ");
    format!("ALTER {keyword} {} SET {}", urn.fqn, render_attrs(attrs))
}

pub fn drop_stmt(urn: &URN) -> String {
    let keyword = urn.resource_type.label().to_uppercase().replace('_', " ");
    format!("DROP {keyword} {}", urn.fqn)
}

pub fn grant_ownership(urn: &URN, owner: &str) -> String {
    let keyword = urn.resource_type.label().to_uppercase().replace('_', " ");
    format!("GRANT OWNERSHIP ON {keyword} {} TO ROLE {owner} COPY CURRENT GRANTS", urn.fqn)
}

fn render_attrs(attrs: &Value) -> String {
    let Value::Object(map) = attrs else { return String::new() };
    let parts: Vec<String> = map.iter().map(|(k, v)| format!("{} = {}", k.to_uppercase(), render_value(v))).collect();
    parts.join(", ")
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}
