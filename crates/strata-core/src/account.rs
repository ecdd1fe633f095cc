use serde::{Deserialize, Serialize};

/// Tier of the hosting account. Restricts which resource types and
/// attributes may be declared (spec §3, `ResourceType.edition`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountEdition {
    Standard,
    Enterprise,
    BusinessCritical,
}

impl AccountEdition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountEdition::Standard => "STANDARD",
            AccountEdition::Enterprise => "ENTERPRISE",
            AccountEdition::BusinessCritical => "BUSINESS_CRITICAL",
        }
    }
}

impl std::fmt::Display for AccountEdition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a blueprint addresses the whole account, a single database, or
/// a single schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlueprintScope {
    Account,
    Database,
    Schema,
}

/// `CREATE-OR-UPDATE` (no drops) vs `SYNC` (drops extraneous allowlisted
/// URNs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    #[serde(rename = "CREATE-OR-UPDATE")]
    CreateOrUpdate,
    #[serde(rename = "SYNC")]
    Sync,
}

impl RunMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE-OR-UPDATE" => Some(RunMode::CreateOrUpdate),
            "SYNC" => Some(RunMode::Sync),
            _ => None,
        }
    }
}

/// Facts about the connected session, supplied by the caller for every
/// call into the engine. The source's global client/session cache is
/// replaced by this explicit value (spec §9, "Global client/session").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub account: String,
    pub account_edition: AccountEdition,
    pub account_locator: String,
    pub role: String,
    pub available_roles: Vec<String>,
}

impl SessionContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.available_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(role))
    }
}
