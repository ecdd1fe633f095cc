use serde::{Deserialize, Serialize};

use crate::account::{BlueprintScope, RunMode};
use crate::error::CoreError;

/// Configuration governing how a blueprint's declared tree is built and
/// planned: scope, run mode, and the allowlist gating which resource
/// types may appear (spec §4.D step 1/2, §6 Configuration contract).
///
/// Mirrors the source's `BlueprintConfig`: `run_mode`, `allowlist`, and
/// `scope` are mutually constrained rather than independently free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintConfig {
    pub scope: BlueprintScope,
    pub run_mode: RunMode,
    pub allowlist: Option<Vec<String>>,
    /// Required when `scope` is `Database` or `Schema`: the container the
    /// blueprint is confined to.
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl BlueprintConfig {
    /// Validates the mutual-exclusivity and completeness rules the
    /// source enforces at `BlueprintConfig` construction time, not
    /// deferred to manifest building.
    pub fn new(
        scope: BlueprintScope,
        run_mode: RunMode,
        allowlist: Option<Vec<String>>,
        database: Option<String>,
        schema: Option<String>,
    ) -> Result<Self, CoreError> {
        let config = BlueprintConfig {
            scope,
            run_mode,
            allowlist,
            database,
            schema,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self.scope {
            BlueprintScope::Account => {
                if self.database.is_some() || self.schema.is_some() {
                    return Err(CoreError::ConfigError(
                        "account-scoped blueprint must not set database or schema".to_string(),
                    ));
                }
            }
            BlueprintScope::Database => {
                if self.database.is_none() {
                    return Err(CoreError::ConfigError("database-scoped blueprint requires database".to_string()));
                }
                if self.schema.is_some() {
                    return Err(CoreError::ConfigError(
                        "database-scoped blueprint must not set schema".to_string(),
                    ));
                }
            }
            BlueprintScope::Schema => {
                if self.database.is_none() || self.schema.is_none() {
                    return Err(CoreError::ConfigError(
                        "schema-scoped blueprint requires both database and schema".to_string(),
                    ));
                }
            }
        }
        if matches!(self.run_mode, RunMode::Sync) && self.allowlist.is_none() {
            return Err(CoreError::ConfigError(
                "SYNC run mode requires an explicit allowlist, to bound what may be dropped".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a resource type's label may appear in this blueprint's
    /// declared tree at all. An absent allowlist permits everything.
    pub fn permits(&self, resource_type_label: &str) -> bool {
        match &self.allowlist {
            Some(list) => list.iter().any(|t| t.eq_ignore_ascii_case(resource_type_label)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_scope_rejects_database() {
        let err = BlueprintConfig::new(
            BlueprintScope::Account,
            RunMode::CreateOrUpdate,
            None,
            Some("ANALYTICS".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn schema_scope_requires_both_containers() {
        let err = BlueprintConfig::new(
            BlueprintScope::Schema,
            RunMode::CreateOrUpdate,
            None,
            Some("ANALYTICS".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn sync_without_allowlist_is_rejected() {
        let err = BlueprintConfig::new(BlueprintScope::Account, RunMode::Sync, None, None, None).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn valid_account_scope_config_accepted() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        assert!(config.permits("warehouse"));
    }
}
