use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::account::AccountEdition;

/// A case-preserving identifier whose equality follows the platform's
/// casing rule: unquoted names compare case-insensitively (canonical
/// upper-case); quoted names compare byte-for-byte. Equality is
/// consistent with hashing (spec §4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceName {
    raw: String,
    quoted: bool,
}

impl ResourceName {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let quoted = raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2;
        ResourceName { raw, quoted }
    }

    /// The value used for comparison and hashing: the quoted body
    /// verbatim, or the upper-cased unquoted name.
    fn canonical(&self) -> &str {
        if self.quoted {
            &self.raw[1..self.raw.len() - 1]
        } else {
            &self.raw
        }
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// The rendered form, quotes included when present.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for ResourceName {
    fn eq(&self, other: &Self) -> bool {
        if self.quoted || other.quoted {
            self.quoted == other.quoted && self.canonical() == other.canonical()
        } else {
            self.canonical().eq_ignore_ascii_case(other.canonical())
        }
    }
}
impl Eq for ResourceName {}

impl Hash for ResourceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.quoted.hash(state);
        if self.quoted {
            self.canonical().hash(state);
        } else {
            self.canonical().to_ascii_uppercase().hash(state);
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        ResourceName::new(s)
    }
}
impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        ResourceName::new(s)
    }
}

/// `(database?, schema?, name, arg_types?)`. `arg_types` participates in
/// identity for overloadable callables (functions, procedures).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FQN {
    pub database: Option<ResourceName>,
    pub schema: Option<ResourceName>,
    pub name: ResourceName,
    pub arg_types: Option<Vec<String>>,
}

impl FQN {
    pub fn name(name: impl Into<ResourceName>) -> Self {
        FQN {
            database: None,
            schema: None,
            name: name.into(),
            arg_types: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<ResourceName>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<ResourceName>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_arg_types(mut self, arg_types: Vec<String>) -> Self {
        self.arg_types = Some(arg_types);
        self
    }
}

impl fmt::Display for FQN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(db) = &self.database {
            write!(f, "{db}.")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(args) = &self.arg_types {
            write!(f, "({})", args.join(","))?;
        }
        Ok(())
    }
}

/// The closed enumeration of resource kinds the engine understands.
/// Static metadata (scope, supported editions, polymorphism, whether it
/// may own children) lives on this type, not on instances (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Account,
    Database,
    Schema,
    Table,
    View,
    Function,
    Warehouse,
    Role,
    DatabaseRole,
    Grant,
    FutureGrant,
    RoleGrant,
    Task,
    ComputePool,
    ImageRepository,
    Tag,
    Integration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Account,
    Database,
    Schema,
}

impl ResourceType {
    /// The URN path segment (and manifest `resource_type` JSON string).
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Account => "account",
            ResourceType::Database => "database",
            ResourceType::Schema => "schema",
            ResourceType::Table => "table",
            ResourceType::View => "view",
            ResourceType::Function => "function",
            ResourceType::Warehouse => "warehouse",
            ResourceType::Role => "role",
            ResourceType::DatabaseRole => "database_role",
            ResourceType::Grant => "grant",
            ResourceType::FutureGrant => "future_grant",
            ResourceType::RoleGrant => "role_grant",
            ResourceType::Task => "task",
            ResourceType::ComputePool => "compute_pool",
            ResourceType::ImageRepository => "image_repository",
            ResourceType::Tag => "tag",
            ResourceType::Integration => "integration",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "account" => ResourceType::Account,
            "database" => ResourceType::Database,
            "schema" => ResourceType::Schema,
            "table" => ResourceType::Table,
            "view" => ResourceType::View,
            "function" => ResourceType::Function,
            "warehouse" => ResourceType::Warehouse,
            "role" => ResourceType::Role,
            "database_role" => ResourceType::DatabaseRole,
            "grant" => ResourceType::Grant,
            "future_grant" => ResourceType::FutureGrant,
            "role_grant" => ResourceType::RoleGrant,
            "task" => ResourceType::Task,
            "compute_pool" => ResourceType::ComputePool,
            "image_repository" => ResourceType::ImageRepository,
            "tag" => ResourceType::Tag,
            "integration" => ResourceType::Integration,
            _ => return None,
        })
    }

    pub fn scope(&self) -> Scope {
        match self {
            ResourceType::Account
            | ResourceType::Database
            | ResourceType::Role
            | ResourceType::RoleGrant
            | ResourceType::Warehouse
            | ResourceType::Integration
            | ResourceType::ComputePool => Scope::Account,
            ResourceType::Schema | ResourceType::DatabaseRole => Scope::Database,
            ResourceType::Table
            | ResourceType::View
            | ResourceType::Function
            | ResourceType::Task
            | ResourceType::ImageRepository
            | ResourceType::Tag => Scope::Schema,
            // Grants and future grants take their scope from their target
            // (`on_*`); the manifest builder resolves this per-instance.
            // Account scope is the conservative default used for ordering.
            ResourceType::Grant | ResourceType::FutureGrant => Scope::Account,
        }
    }

    pub fn editions(&self) -> &'static [AccountEdition] {
        use AccountEdition::*;
        const ALL: &[AccountEdition] = &[Standard, Enterprise, BusinessCritical];
        match self {
            ResourceType::ComputePool | ResourceType::ImageRepository => &[Enterprise, BusinessCritical],
            _ => ALL,
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self, ResourceType::Function)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ResourceType::Account | ResourceType::Database | ResourceType::Schema)
    }

    /// Ties are broken by declaration order within a scope (spec §4.F).
    pub fn declaration_order(&self) -> u8 {
        match self {
            ResourceType::Account => 0,
            ResourceType::Role => 1,
            ResourceType::DatabaseRole => 2,
            ResourceType::RoleGrant => 3,
            ResourceType::Integration => 4,
            ResourceType::Warehouse => 5,
            ResourceType::ComputePool => 6,
            ResourceType::Database => 7,
            ResourceType::Schema => 8,
            ResourceType::Table => 9,
            ResourceType::View => 10,
            ResourceType::Function => 11,
            ResourceType::Task => 12,
            ResourceType::ImageRepository => 13,
            ResourceType::Tag => 14,
            ResourceType::Grant => 15,
            ResourceType::FutureGrant => 16,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Global identifier for a resource: `urn:<locator?>:<type>/<fqn>[?k=v&...]`.
/// The sole identity used across manifest, remote state, and plan (spec §3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct URN {
    pub resource_type: ResourceType,
    pub fqn: FQN,
    pub account_locator: String,
    /// Grant-target discriminators, e.g. `role=SYSADMIN` for a role grant.
    /// Preserved in declaration order; compared as an unordered set.
    pub query: Vec<(String, String)>,
}

impl URN {
    pub fn new(resource_type: ResourceType, fqn: FQN, account_locator: impl Into<String>) -> Self {
        URN {
            resource_type,
            fqn,
            account_locator: account_locator.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut s = format!("urn:{}:{}/{}", self.account_locator, self.resource_type.label(), self.fqn);
        if !self.query.is_empty() {
            s.push('?');
            let parts: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            s.push_str(&parts.join("&"));
        }
        s
    }
}

impl fmt::Display for URN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// URNs serialize as their rendered wire string, matching plan JSON output
// (spec §4.H) rather than a structural `{resource_type, fqn, ...}` object.
impl Serialize for URN {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for URN {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_urn(&s).ok_or_else(|| serde::de::Error::custom(format!("malformed urn: {s}")))
    }
}

/// Parses the wire form `urn:<locator?>:<type>/<fqn>[?k=v&...]`.
/// Inverse of [`URN::render`] for all well-formed URNs the core produces.
pub fn parse_urn(s: &str) -> Option<URN> {
    let rest = s.strip_prefix("urn:")?;
    let mut parts = rest.splitn(2, ':');
    let locator = parts.next()?.to_string();
    let rest = parts.next()?;
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    let (type_label, fqn_str) = path.split_once('/')?;
    let resource_type = ResourceType::parse(type_label)?;

    let segments: Vec<&str> = fqn_str.split('.').collect();
    let (name_part, database, schema) = match segments.len() {
        1 => (segments[0], None, None),
        2 => (segments[1], Some(segments[0]), None),
        3 => (segments[2], Some(segments[0]), Some(segments[1])),
        _ => return None,
    };
    let (name, arg_types) = if let Some(idx) = name_part.find('(') {
        if !name_part.ends_with(')') {
            return None;
        }
        let name = &name_part[..idx];
        let args = &name_part[idx + 1..name_part.len() - 1];
        let arg_types = if args.is_empty() {
            Vec::new()
        } else {
            args.split(',').map(|s| s.to_string()).collect()
        };
        (name, Some(arg_types))
    } else {
        (name_part, None)
    };

    let fqn = FQN {
        database: database.map(ResourceName::new),
        schema: schema.map(ResourceName::new),
        name: ResourceName::new(name),
        arg_types,
    };

    let query = query
        .map(|q| {
            q.split('&')
                .filter_map(|kv| kv.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Some(URN {
        resource_type,
        fqn,
        account_locator: locator,
        query,
    })
}

impl FromStr for URN {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_urn(s).ok_or(())
    }
}
