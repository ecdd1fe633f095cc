use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::SessionContext;
use crate::config::BlueprintConfig;
use crate::error::CoreError;
use crate::identifiers::{FQN, ResourceName, ResourceType, URN};
use crate::kinds::schema;
use crate::resource::{AttrValue, Container, NameOrVar, RoleRef};
use crate::var::Environment;

/// One sealed entry: fully resolved attributes, owner, and references, all
/// keyed by the resource's own [`URN`] (spec §4.D step 8, "emission").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub owner: Option<String>,
    pub parent: Option<URN>,
    pub requires: Vec<URN>,
    pub attrs: IndexMap<String, Value>,
}

/// The sealed output of [`build_manifest`]: every declared resource
/// resolved to a final URN and literal attributes, with no remaining
/// variable references or resource pointers. This is the only input the
/// planner consults (spec §4.D, §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub account_locator: String,
    pub resources: IndexMap<URN, ManifestEntry>,
}

impl Manifest {
    pub fn get(&self, urn: &URN) -> Option<&ManifestEntry> {
        self.resources.get(urn)
    }
}

struct BuildCtx<'a> {
    config: &'a BlueprintConfig,
    env: &'a Environment,
    session: &'a SessionContext,
    addr_to_urn: IndexMap<String, URN>,
}

/// Implements the eight-step manifest-build algorithm: scope validation,
/// allowlist enforcement, variable resolution, pointer merging, container
/// stubbing, edition check, normalization, emission.
pub fn build_manifest(config: &BlueprintConfig, env: &Environment, session: &SessionContext, root: &Container) -> Result<Manifest, CoreError> {
    // Step 1: scope validation. An account-scoped blueprint's root must
    // be the account sentinel; database/schema scope additionally pin
    // which container the tree may declare resources under.
    if root.resource.resource_type != ResourceType::Account {
        return Err(CoreError::ConfigError("declared tree must be rooted at the account sentinel".to_string()));
    }

    let mut ctx = BuildCtx {
        config,
        env,
        session,
        addr_to_urn: IndexMap::new(),
    };

    // First pass: assign every resource's final URN, so step 4 (pointer
    // merging) can resolve `LocalRef`s regardless of declaration order.
    assign_urns(&mut ctx, root, None)?;
    tracing::debug!(count = ctx.addr_to_urn.len(), "assigned urns");

    let mut resources = IndexMap::new();
    seal(&mut ctx, root, None, &mut resources)?;
    tracing::debug!(count = resources.len(), "sealed declared resources");

    // Step 5: container stubbing. Any container implied by a child's URN
    // (e.g. a schema never explicitly declared) but absent from
    // `resources` gets a default stub entry, except the elided implicit
    // PUBLIC schema.
    stub_implied_containers(&ctx, &mut resources);

    // Step 7: normalization. Stable order by URN string keeps repeated
    // builds of the same tree byte-identical.
    resources.sort_by(|a, _, b, _| a.render().cmp(&b.render()));

    tracing::debug!(total = resources.len(), "manifest sealed");
    Ok(Manifest {
        account_locator: session.account_locator.clone(),
        resources,
    })
}

// Sibling-level duplicate declarations are already rejected by
// `Container::add`; this pass only needs to assign URNs and index them
// by shallow `(resource_type, name)` address for `LocalRef` resolution
// (`owner`, `parent`, `requires`, pointers). That addressing assumes
// account-scoped kinds (role, warehouse, database, ...) are unique by
// name, which the platform itself requires; it is not used to identify
// schema-nested resources, which are addressed by full URN once sealed.
fn assign_urns(ctx: &mut BuildCtx, node: &Container, parent_urn: Option<&URN>) -> Result<(), CoreError> {
    let urn = resolve_urn(ctx, node, parent_urn)?;
    let addr = node.resource.addr();
    ctx.addr_to_urn.insert(addr.clone(), urn);
    let this_urn = ctx.addr_to_urn.get(&addr).unwrap().clone();
    for child in &node.children {
        assign_urns(ctx, child, Some(&this_urn))?;
    }
    Ok(())
}

fn resolve_urn(ctx: &BuildCtx, node: &Container, parent_urn: Option<&URN>) -> Result<URN, CoreError> {
    let name = resolve_name(ctx, &node.resource.name)?;
    let mut fqn = FQN::name(name);
    if let Some(parent) = parent_urn {
        match parent.resource_type {
            ResourceType::Database => {
                fqn = fqn.with_database(parent.fqn.name.clone());
                // A schema-scoped resource declared directly under a
                // database (skipping an explicit schema) belongs to the
                // implicit PUBLIC schema.
                if node.resource.resource_type.scope() == crate::identifiers::Scope::Schema {
                    fqn = fqn.with_schema(ResourceName::new(schema::IMPLICIT_NAME));
                }
            }
            ResourceType::Schema => {
                fqn = fqn
                    .with_database(parent.fqn.database.clone().unwrap_or_else(|| parent.fqn.name.clone()))
                    .with_schema(parent.fqn.name.clone());
            }
            _ => {}
        }
    }
    if node.resource.resource_type == ResourceType::Function {
        if let Some(AttrValue::Json(Value::Array(args))) = node.resource.data.get("arg_types") {
            let arg_types = args.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
            fqn = fqn.with_arg_types(arg_types);
        } else {
            fqn = fqn.with_arg_types(Vec::new());
        }
    }
    let mut urn = URN::new(node.resource.resource_type, fqn, ctx.session.account_locator.clone());

    // Grant-family URNs carry the grantee role as a query discriminator
    // so two grants/future-grants on the same target to different roles
    // (or two role-grants of the same child role to different parents)
    // do not collide on address.
    match node.resource.resource_type {
        ResourceType::RoleGrant => {
            if let Some(AttrValue::Json(Value::String(to_role))) = node.resource.data.get("to_role") {
                urn = urn.with_query("role", to_role.clone());
            }
        }
        ResourceType::Grant | ResourceType::FutureGrant => {
            if let Some(AttrValue::Json(Value::String(to_role))) = node.resource.data.get("to_role") {
                urn = urn.with_query("to_role", to_role.clone());
            }
        }
        _ => {}
    }

    Ok(urn)
}

fn resolve_name(ctx: &BuildCtx, name: &NameOrVar) -> Result<ResourceName, CoreError> {
    match name {
        NameOrVar::Name(n) => Ok(n.clone()),
        NameOrVar::Var(v) => {
            let value = ctx.env.resolve(v.name())?;
            let s = value.as_str().ok_or_else(|| CoreError::ConfigError(format!("variable `{}` is not a string", v.name())))?;
            Ok(ResourceName::new(s))
        }
    }
}

fn seal(ctx: &mut BuildCtx, node: &Container, parent_urn: Option<URN>, out: &mut IndexMap<URN, ManifestEntry>) -> Result<(), CoreError> {
    let addr = node.resource.addr();
    let urn = ctx.addr_to_urn.get(&addr).expect("assigned in first pass").clone();

    // A standalone pointer (never merged with a concrete declaration)
    // asserts that the resource already exists but is not itself managed
    // by this blueprint: it contributes no manifest entry, but its
    // children still seal anchored at its URN.
    if node.resource.is_pointer {
        for child in &node.children {
            seal(ctx, child, Some(urn.clone()), out)?;
        }
        return Ok(());
    }

    // Step 2: allowlist enforcement.
    if !ctx.config.permits(node.resource.resource_type.label()) {
        return Err(CoreError::InvalidResource {
            resource_type: node.resource.resource_type.label().to_string(),
        });
    }

    // Step 6: edition check. Drop editions-restricted attributes with a
    // STANDARD-compatible default instead of failing the whole build;
    // reject resource types unsupported in this edition outright.
    if !node.resource.resource_type.editions().contains(&ctx.session.account_edition) {
        return Err(CoreError::WrongEdition {
            urn: urn.clone(),
            edition: ctx.session.account_edition.to_string(),
        });
    }

    // Step 3: variable resolution + step 4: pointer merging, attribute by
    // attribute.
    let mut attrs = IndexMap::new();
    for (key, value) in &node.resource.data {
        if key == "scaling_policy"
            && node.resource.resource_type == ResourceType::Warehouse
            && !crate::kinds::warehouse::scaling_policy_editions().contains(&ctx.session.account_edition)
        {
            continue;
        }
        let (out_key, resolved) = match value {
            AttrValue::Json(v) => (key.clone(), v.clone()),
            AttrValue::Template(t) => (key.clone(), Value::String(t.resolve(ctx.env)?)),
            AttrValue::Pointer(p) => {
                let target_urn = ctx
                    .addr_to_urn
                    .get(&p.0.addr())
                    .ok_or_else(|| CoreError::NonConformingPlan(format!("pointer to undeclared resource: {}", p.0.addr())))?;
                // A grant's polymorphic `on` target is normalized early
                // into a discriminated `on_<type>` attribute rather than
                // staying a generic pointer (spec §4.B, §9).
                let out_key = if key == "on" && node.resource.resource_type == ResourceType::Grant {
                    format!("on_{}", target_urn.resource_type.label())
                } else {
                    key.clone()
                };
                (out_key, Value::String(target_urn.render()))
            }
        };
        attrs.insert(out_key, resolved);
    }

    let owner = match &node.resource.owner {
        Some(RoleRef::Name(n)) => Some(n.as_str().to_string()),
        Some(RoleRef::Var(v)) => {
            let value = ctx.env.resolve(v.name())?;
            Some(value.as_str().unwrap_or_default().to_string())
        }
        Some(RoleRef::Ref(local)) => {
            let target = ctx
                .addr_to_urn
                .get(&local.addr())
                .ok_or_else(|| CoreError::NonConformingPlan(format!("owner references undeclared resource: {}", local.addr())))?;
            Some(target.fqn.name.as_str().to_string())
        }
        None => None,
    };

    let requires = node
        .resource
        .requires
        .iter()
        .map(|r| {
            ctx.addr_to_urn
                .get(&r.addr())
                .cloned()
                .ok_or_else(|| CoreError::NonConformingPlan(format!("requires() references undeclared resource: {}", r.addr())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // PUBLIC schema pointer elision: an undeclared-but-default PUBLIC
    // schema never reaches `seal` (it simply isn't in the tree), but a
    // declared one with only default attributes is still emitted, since
    // emission here only omits genuinely *implied* containers (step 5
    // handles those separately).
    out.insert(
        urn,
        ManifestEntry {
            owner,
            parent: parent_urn,
            requires,
            attrs,
        },
    );

    let this_urn = ctx.addr_to_urn.get(&addr).unwrap().clone();
    for child in &node.children {
        seal(ctx, child, Some(this_urn.clone()), out)?;
    }
    Ok(())
}

fn stub_implied_containers(ctx: &BuildCtx, out: &mut IndexMap<URN, ManifestEntry>) {
    let implied: Vec<URN> = out
        .keys()
        .filter_map(|urn| implied_parent_urn(ctx, urn))
        .filter(|parent| !out.contains_key(parent))
        .collect();
    for parent in implied {
        if parent.resource_type == ResourceType::Schema && parent.fqn.name.as_str().eq_ignore_ascii_case(schema::IMPLICIT_NAME) {
            tracing::warn!(urn = %parent, "eliding implicit PUBLIC schema");
            continue;
        }
        out.insert(
            parent,
            ManifestEntry {
                owner: None,
                parent: None,
                requires: Vec::new(),
                attrs: IndexMap::new(),
            },
        );
    }
}

fn implied_parent_urn(ctx: &BuildCtx, urn: &URN) -> Option<URN> {
    match urn.resource_type.scope() {
        crate::identifiers::Scope::Schema => {
            let database = urn.fqn.database.clone()?;
            let schema_name = urn.fqn.schema.clone()?;
            Some(URN::new(
                ResourceType::Schema,
                FQN::name(schema_name).with_database(database),
                ctx.session.account_locator.clone(),
            ))
        }
        crate::identifiers::Scope::Database if urn.resource_type != ResourceType::Database => {
            let database = urn.fqn.database.clone()?;
            Some(URN::new(ResourceType::Database, FQN::name(database), ctx.session.account_locator.clone()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountEdition, BlueprintScope, RunMode};
    use crate::kinds;

    fn session() -> SessionContext {
        SessionContext {
            account: "ACME".to_string(),
            account_edition: AccountEdition::Standard,
            account_locator: "AB12345".to_string(),
            role: "SYSADMIN".to_string(),
            available_roles: vec!["SYSADMIN".to_string(), "USERADMIN".to_string(), "SECURITYADMIN".to_string()],
        }
    }

    #[test]
    fn warehouse_under_standard_edition_drops_scaling_policy() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        root.add(kinds::warehouse::new("WH")).unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        let (urn, entry) = manifest
            .resources
            .iter()
            .find(|(urn, _)| urn.resource_type == ResourceType::Warehouse)
            .unwrap();
        assert_eq!(urn.fqn.name.as_str(), "WH");
        assert!(!entry.attrs.contains_key("scaling_policy"));
    }

    #[test]
    fn explicit_schema_is_included_in_manifest() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        let db = root.add(kinds::database::new("ANALYTICS")).unwrap();
        let sch = db.add(kinds::schema::new("REPORTING")).unwrap();
        sch.add(kinds::table::new("EVENTS")).unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        assert!(manifest
            .resources
            .keys()
            .any(|urn| urn.resource_type == ResourceType::Schema && urn.fqn.name.as_str() == "REPORTING"));
    }

    #[test]
    fn implicit_public_schema_is_elided() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        let db = root.add(kinds::database::new("ANALYTICS")).unwrap();
        db.add(kinds::table::new("EVENTS")).unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        assert!(!manifest
            .resources
            .keys()
            .any(|urn| urn.resource_type == ResourceType::Schema && urn.fqn.name.as_str().eq_ignore_ascii_case("PUBLIC")));
    }

    #[test]
    fn pointer_merges_with_concrete_declaration_into_one_manifest_entry() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        root.add(crate::resource::Resource::pointer(ResourceType::Database, "DB")).unwrap();
        root.add(kinds::database::new("DB")).unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        assert_eq!(manifest.resources.keys().filter(|urn| urn.resource_type == ResourceType::Database).count(), 1);
    }

    #[test]
    fn role_grant_urn_carries_role_query_discriminator() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        root.add(kinds::role_grant::new("SOME_ROLE", "SYSADMIN")).unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        let urn = manifest
            .resources
            .keys()
            .find(|urn| urn.resource_type == ResourceType::RoleGrant)
            .unwrap();
        assert_eq!(urn.render(), format!("urn:{}:role_grant/SOME_ROLE?role=SYSADMIN", session().account_locator));
    }

    #[test]
    fn grant_on_pointer_is_canonicalized_into_discriminated_attribute() {
        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let env = Environment::new();
        let mut root = Container::new(kinds::root::new());
        root.add(kinds::warehouse::new("WH")).unwrap();
        root.add(kinds::grant::new("USAGE", crate::resource::LocalRef::new(ResourceType::Warehouse, "WH"), "SYSADMIN"))
            .unwrap();

        let manifest = build_manifest(&config, &env, &session(), &root).unwrap();
        let entry = manifest
            .resources
            .iter()
            .find(|(urn, _)| urn.resource_type == ResourceType::Grant)
            .map(|(_, entry)| entry)
            .unwrap();
        assert!(!entry.attrs.contains_key("on"));
        assert!(entry.attrs.get("on_warehouse").and_then(|v| v.as_str()).unwrap().contains("warehouse/WH"));
    }
}
