use crate::account::SessionContext;
use crate::compiler::compile_plan_to_sql;
use crate::config::BlueprintConfig;
use crate::error::CoreError;
use crate::kinds;
use crate::manifest::{Manifest, build_manifest};
use crate::planner::{Plan, plan as run_plan};
use crate::resource::{Container, Resource};
use crate::state::RemoteState;
use crate::var::Environment;

/// The top-level facade: a declared tree plus the configuration and
/// variable environment it will be sealed with. Mirrors the source's
/// `Blueprint`, which owns resource declaration, manifest generation,
/// planning, and SQL compilation behind one object.
pub struct Blueprint {
    config: BlueprintConfig,
    session: SessionContext,
    env: Environment,
    root: Container,
}

impl Blueprint {
    pub fn new(config: BlueprintConfig, session: SessionContext) -> Self {
        Blueprint {
            config,
            session,
            env: Environment::new(),
            root: Container::new(kinds::root::new()),
        }
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn root_mut(&mut self) -> &mut Container {
        &mut self.root
    }

    /// Declares a resource directly under the account root, enforcing the
    /// allowlist at declaration time rather than only at manifest
    /// sealing — matching the source's `blueprint.add()` behavior, which
    /// raises immediately for a disallowed resource type instead of
    /// waiting for `generate_manifest`.
    pub fn add(&mut self, resource: Resource) -> Result<&mut Container, CoreError> {
        if !self.config.permits(resource.resource_type.label()) {
            return Err(CoreError::InvalidResource {
                resource_type: resource.resource_type.label().to_string(),
            });
        }
        self.root.add(resource)
    }

    pub fn generate_manifest(&self) -> Result<Manifest, CoreError> {
        build_manifest(&self.config, &self.env, &self.session, &self.root)
    }

    pub fn plan(&self, remote: &RemoteState) -> Result<Plan, CoreError> {
        let manifest = self.generate_manifest()?;
        run_plan(&manifest, remote, &self.config)
    }

    pub fn compile(&self, plan: &Plan) -> Vec<String> {
        compile_plan_to_sql(plan, &self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountEdition, BlueprintScope, RunMode};
    use crate::identifiers::ResourceType;

    fn session() -> SessionContext {
        SessionContext {
            account: "ACME".to_string(),
            account_edition: AccountEdition::Standard,
            account_locator: "AB12345".to_string(),
            role: "SYSADMIN".to_string(),
            available_roles: vec!["SYSADMIN".to_string(), "USERADMIN".to_string()],
        }
    }

    #[test]
    fn add_rejects_resource_type_outside_allowlist() {
        let config = BlueprintConfig::new(
            BlueprintScope::Account,
            RunMode::CreateOrUpdate,
            Some(vec!["warehouse".to_string()]),
            None,
            None,
        )
        .unwrap();
        let mut bp = Blueprint::new(config, session());
        let err = bp.add(kinds::role::new("SOME_ROLE")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidResource { resource_type } if resource_type == ResourceType::Role.label()));
    }

    #[test]
    fn plan_against_empty_remote_state_creates_everything() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let mut bp = Blueprint::new(config, session());
        bp.add(kinds::warehouse::new("WH")).unwrap();

        let sentinel = kinds::root::sentinel_urn(bp.session.account_locator.clone());
        let remote = RemoteState::new(sentinel);
        let plan = bp.plan(&remote).unwrap();
        assert_eq!(plan.items.len(), 1);
    }
}
