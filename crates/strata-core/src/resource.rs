use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::identifiers::{FQN, ResourceName, ResourceType, URN};
use crate::var::{StringTemplate, VarRef};

/// A resource's declared name: either a literal identifier or a deferred
/// reference to a blueprint variable, resolved no later than manifest
/// sealing (spec §4.D step 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrVar {
    Name(ResourceName),
    Var(VarRef),
}

impl From<&str> for NameOrVar {
    fn from(s: &str) -> Self {
        NameOrVar::Name(ResourceName::new(s))
    }
}
impl From<String> for NameOrVar {
    fn from(s: String) -> Self {
        NameOrVar::Name(ResourceName::new(s))
    }
}
impl From<ResourceName> for NameOrVar {
    fn from(n: ResourceName) -> Self {
        NameOrVar::Name(n)
    }
}
impl From<VarRef> for NameOrVar {
    fn from(v: VarRef) -> Self {
        NameOrVar::Var(v)
    }
}

/// A reference to another resource declared in the same tree, by address
/// rather than by (not-yet-resolved) URN. Used for `owner`, `parent`, and
/// `requires` before the manifest builder has assigned final identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalRef {
    pub resource_type: ResourceType,
    pub name: String,
}

impl LocalRef {
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        LocalRef {
            resource_type,
            name: name.into(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}.{}", self.resource_type.label(), self.name)
    }
}

impl From<&Resource> for LocalRef {
    fn from(r: &Resource) -> Self {
        LocalRef::new(r.resource_type, r.display_name())
    }
}

/// Source: `RoleRef = Union[Role, DatabaseRole, VarString, str]` (see
/// `role_ref.py`). A resource's `owner` may be a literal role name, a
/// deferred variable, or a pointer at another role/database_role
/// resource declared in the same tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Name(ResourceName),
    Var(VarRef),
    Ref(LocalRef),
}

impl From<&str> for RoleRef {
    fn from(s: &str) -> Self {
        RoleRef::Name(ResourceName::new(s))
    }
}
impl From<String> for RoleRef {
    fn from(s: String) -> Self {
        RoleRef::Name(ResourceName::new(s))
    }
}
impl From<VarRef> for RoleRef {
    fn from(v: VarRef) -> Self {
        RoleRef::Var(v)
    }
}
impl From<&Resource> for RoleRef {
    fn from(r: &Resource) -> Self {
        RoleRef::Ref(LocalRef::from(r))
    }
}

/// An attribute value referencing another resource's eventual identity,
/// e.g. a table's `warehouse: <pointer>` field. Resolved during the
/// manifest builder's pointer-merging step (spec §4.D step 4,
/// `_merge_pointers`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePointer(pub LocalRef);

/// The value held at one key of a resource's attribute map.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Json(Value),
    Template(StringTemplate),
    Pointer(ResourcePointer),
}

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        AttrValue::Json(v)
    }
}
impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Template(StringTemplate::parse(s))
    }
}
impl From<StringTemplate> for AttrValue {
    fn from(t: StringTemplate) -> Self {
        AttrValue::Template(t)
    }
}
impl From<ResourcePointer> for AttrValue {
    fn from(p: ResourcePointer) -> Self {
        AttrValue::Pointer(p)
    }
}

/// Ordered attribute map. `IndexMap` preserves declaration order, which
/// the SQL compiler and text plan renderer both depend on for stable
/// output (spec §4.G, §4.H).
pub type ResourceData = IndexMap<String, AttrValue>;

/// A single declared resource: one entry of a blueprint's tree, prior to
/// manifest sealing. Mirrors the single generic record used across every
/// concrete kind, with per-kind defaults and privilege rules supplied by
/// `crate::kinds`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: ResourceType,
    pub name: NameOrVar,
    pub data: ResourceData,
    pub owner: Option<RoleRef>,
    pub parent: Option<LocalRef>,
    pub requires: Vec<LocalRef>,
    /// Marks a reference to a resource assumed to exist (or declared)
    /// elsewhere rather than a full declaration of its own. Merged away
    /// when a concrete sibling with the same address is added to the
    /// same container (spec §4.D step 4, pointer merging).
    pub is_pointer: bool,
}

impl Resource {
    pub fn new(resource_type: ResourceType, name: impl Into<NameOrVar>) -> Self {
        Resource {
            resource_type,
            name: name.into(),
            data: ResourceData::new(),
            owner: None,
            parent: None,
            requires: Vec::new(),
            is_pointer: false,
        }
    }

    /// A standalone pointer at a same-addressed resource declared (or
    /// merged in) elsewhere in the tree. Carries no attributes of its
    /// own; [`Container::add`] resolves it against a concrete sibling
    /// when one is present, in either add order.
    pub fn pointer(resource_type: ResourceType, name: impl Into<NameOrVar>) -> Self {
        Resource {
            is_pointer: true,
            ..Resource::new(resource_type, name)
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<RoleRef>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_parent(mut self, parent: LocalRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn requires(mut self, target: LocalRef) -> Self {
        self.requires.push(target);
        self
    }

    /// The literal name this resource would render as, if its name is
    /// not a deferred variable reference. Used for pre-resolution
    /// addressing (`LocalRef`, dedupe keys).
    pub fn display_name(&self) -> String {
        match &self.name {
            NameOrVar::Name(n) => n.as_str().to_string(),
            NameOrVar::Var(v) => format!("${{var.{}}}", v.name()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}.{}", self.resource_type.label(), self.display_name())
    }
}

/// A node in the declared tree: a resource plus whatever resources were
/// added beneath it via [`Container::add`] (e.g. tables added to a
/// schema). The manifest builder walks this tree; it is not itself part
/// of the sealed manifest.
#[derive(Debug, Clone)]
pub struct Container {
    pub resource: Resource,
    pub children: Vec<Container>,
}

impl Container {
    pub fn new(resource: Resource) -> Self {
        Container {
            resource,
            children: Vec::new(),
        }
    }

    /// Adds a child resource beneath this one. A child whose
    /// `(resource_type, name)` address matches an existing sibling is
    /// merged rather than appended (spec §4.D step 4, pointer merging):
    /// a pointer merges silently into (or behind) a concrete declaration,
    /// and two concrete declarations merge idempotently when they are
    /// equal or are rejected with [`CoreError::DuplicateResource`] when
    /// they conflict.
    pub fn add(&mut self, child: Resource) -> Result<&mut Container, CoreError> {
        let addr = child.addr();
        if let Some(pos) = self.children.iter().position(|c| c.resource.addr() == addr) {
            self.children[pos].resource = merge_resource(&self.children[pos].resource, &child)?;
            return Ok(&mut self.children[pos]);
        }
        self.children.push(Container::new(child));
        Ok(self.children.last_mut().expect("just pushed"))
    }
}

/// Resolves two same-addressed declarations into one. Used by
/// [`Container::add`]; never produces a container holding both.
fn merge_resource(existing: &Resource, incoming: &Resource) -> Result<Resource, CoreError> {
    match (existing.is_pointer, incoming.is_pointer) {
        (true, false) => Ok(incoming.clone()),
        (false, true) | (true, true) => Ok(existing.clone()),
        (false, false) => {
            if existing == incoming {
                Ok(existing.clone())
            } else {
                Err(CoreError::DuplicateResource { urn: addr_urn(existing) })
            }
        }
    }
}

/// A placeholder [`URN`] for a not-yet-sealed resource, used only to
/// identify it in a [`CoreError::DuplicateResource`] raised before the
/// manifest builder has assigned a real account locator.
fn addr_urn(r: &Resource) -> URN {
    URN::new(r.resource_type, FQN::name(ResourceName::new(r.display_name())), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_child_is_merged_idempotently() {
        let mut root = Container::new(Resource::new(ResourceType::Database, "ANALYTICS"));
        root.add(Resource::new(ResourceType::Schema, "PUBLIC")).unwrap();
        root.add(Resource::new(ResourceType::Schema, "PUBLIC")).unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn conflicting_duplicate_is_rejected() {
        let mut root = Container::new(Resource::new(ResourceType::Database, "ANALYTICS"));
        root.add(Resource::new(ResourceType::Schema, "PUBLIC")).unwrap();
        let conflicting = Resource::new(ResourceType::Schema, "PUBLIC").with_attr("comment", serde_json::json!("not the same"));
        let err = root.add(conflicting).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateResource { .. }));
    }

    #[test]
    fn pointer_merges_into_concrete_declaration_either_order() {
        let mut root = Container::new(Resource::new(ResourceType::Account, "ACCOUNT"));
        root.add(Resource::pointer(ResourceType::Database, "DB")).unwrap();
        root.add(Resource::new(ResourceType::Database, "DB").with_attr("comment", serde_json::json!("real one")))
            .unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(!root.children[0].resource.is_pointer);

        let mut root2 = Container::new(Resource::new(ResourceType::Account, "ACCOUNT"));
        root2.add(Resource::new(ResourceType::Database, "DB")).unwrap();
        root2.add(Resource::pointer(ResourceType::Database, "DB")).unwrap();
        assert_eq!(root2.children.len(), 1);
        assert!(!root2.children[0].resource.is_pointer);
    }

    #[test]
    fn role_ref_from_resource_points_at_its_address() {
        let role = Resource::new(ResourceType::Role, "SOME_ROLE");
        let owner = RoleRef::from(&role);
        assert_eq!(owner, RoleRef::Ref(LocalRef::new(ResourceType::Role, "SOME_ROLE")));
    }
}
