use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::BlueprintScope;
use crate::config::BlueprintConfig;
use crate::error::CoreError;
use crate::identifiers::URN;
use crate::manifest::Manifest;
use crate::state::RemoteState;

/// The four actions a plan entry can carry (spec §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    /// Attributes match but the declared owner differs from the remote
    /// owner: the compiler emits a `GRANT OWNERSHIP` instead of full DDL.
    Transfer,
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub urn: URN,
    pub kind: ChangeKind,
    pub owner: Option<String>,
    /// The owner observed in remote state before this change, present
    /// whenever `before` is (spec §4.H, Transfer's `from_owner`).
    pub from_owner: Option<String>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    /// For `Update` only: `{k: after[k] for k where after[k] != before[k]}`,
    /// excluding the owner key (spec §3 `Update(...)`, §4.F).
    pub delta: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn to_create(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind == ChangeKind::Create)
    }
    pub fn to_update(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind == ChangeKind::Update)
    }
    pub fn to_transfer(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind == ChangeKind::Transfer)
    }
    pub fn to_drop(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind == ChangeKind::Drop)
    }
}

/// Diffs a sealed [`Manifest`] against observed [`RemoteState`], orders
/// the resulting changes by dependency, and returns them with creates
/// and updates in topological order followed by drops in reverse (spec
/// §4.F).
pub fn plan(manifest: &Manifest, remote: &RemoteState, config: &BlueprintConfig) -> Result<Plan, CoreError> {
    let in_scope = |urn: &URN| -> bool { urn_in_scope(urn, config) };

    let mut creates_updates = Vec::new();
    for (urn, entry) in &manifest.resources {
        // Out-of-scope manifest entries are not filtered here: a
        // declared resource outside the blueprint's configured scope
        // (e.g. an account-scoped role under a database-scoped
        // blueprint) is a real authoring error that must surface as
        // `NonConformingPlan` via the post-hoc check below, not be
        // silently dropped before it can be caught.
        let after = serde_json::to_value(&entry.attrs)?;
        match remote.get(urn) {
            None => creates_updates.push(PlanItem {
                urn: urn.clone(),
                kind: ChangeKind::Create,
                owner: entry.owner.clone(),
                from_owner: None,
                before: None,
                after: Some(after),
                delta: None,
            }),
            Some(before) => {
                let attrs_match = attrs_equal(before, &after);
                let owner_matches = remote_owner(before) == entry.owner;
                if attrs_match && owner_matches {
                    continue;
                }
                let kind = if attrs_match && !owner_matches {
                    ChangeKind::Transfer
                } else {
                    ChangeKind::Update
                };
                let delta = matches!(kind, ChangeKind::Update).then(|| compute_delta(before, &entry.attrs));
                creates_updates.push(PlanItem {
                    urn: urn.clone(),
                    kind,
                    owner: entry.owner.clone(),
                    from_owner: remote_owner(before),
                    before: Some(before.clone()),
                    after: Some(after),
                    delta,
                });
            }
        }
    }

    let ordered = topo_sort(manifest, &creates_updates);

    let mut drops: Vec<PlanItem> = Vec::new();
    if matches!(config.run_mode, crate::account::RunMode::Sync) {
        for (urn, attrs) in remote.iter() {
            if urn.resource_type == crate::identifiers::ResourceType::Account {
                continue;
            }
            if !in_scope(urn) || manifest.resources.contains_key(urn) {
                continue;
            }
            if !config.permits(urn.resource_type.label()) {
                continue;
            }
            drops.push(PlanItem {
                urn: urn.clone(),
                kind: ChangeKind::Drop,
                owner: remote_owner(attrs),
                from_owner: remote_owner(attrs),
                before: Some(attrs.clone()),
                after: None,
                delta: None,
            });
        }
        // Reverse-order drops: deeper-scoped resources (tables before
        // schemas before databases) are dropped first.
        drops.sort_by(|a, b| drop_depth(&b.urn).cmp(&drop_depth(&a.urn)).then_with(|| b.urn.render().cmp(&a.urn.render())));
    } else {
        for (urn, _) in remote.iter() {
            if urn.resource_type != crate::identifiers::ResourceType::Account && in_scope(urn) && !manifest.resources.contains_key(urn) {
                tracing::warn!(urn = %urn, "resource exists remotely but not in the manifest; not dropped outside SYNC mode");
            }
        }
    }

    let mut items = ordered;
    items.extend(drops);

    raise_for_nonconforming_plan(&items, config)?;

    for item in &items {
        tracing::info!(urn = %item.urn, kind = ?item.kind, "planned change");
    }

    Ok(Plan { items })
}

fn urn_in_scope(urn: &URN, config: &BlueprintConfig) -> bool {
    match config.scope {
        BlueprintScope::Account => true,
        BlueprintScope::Database => config
            .database
            .as_deref()
            .map(|db| {
                urn.fqn.database.as_ref().map(|d| d.as_str().eq_ignore_ascii_case(db)).unwrap_or(false)
                    || (urn.resource_type == crate::identifiers::ResourceType::Database && urn.fqn.name.as_str().eq_ignore_ascii_case(db))
            })
            .unwrap_or(false),
        BlueprintScope::Schema => config
            .schema
            .as_deref()
            .map(|s| urn.fqn.schema.as_ref().map(|sch| sch.as_str().eq_ignore_ascii_case(s)).unwrap_or(false))
            .unwrap_or(false),
    }
}

/// Compares remote and manifest attributes for the diff rule, ignoring
/// the remote-only `__owner` key: owner is tracked and compared
/// separately (as `Transfer`), so it must never make an otherwise
/// identical resource look like it needs an `Update`.
fn attrs_equal(before: &Value, after: &Value) -> bool {
    strip_owner(before) == strip_owner(after)
}

fn strip_owner(v: &Value) -> Value {
    match v.as_object() {
        Some(obj) => {
            let mut m = obj.clone();
            m.remove("__owner");
            Value::Object(m)
        }
        None => v.clone(),
    }
}

fn remote_owner(attrs: &Value) -> Option<String> {
    attrs.get("__owner").and_then(|v| v.as_str()).map(str::to_string)
}

/// `{k: after[k] for k where after[k] != before[k]}`, excluding the
/// owner key, plus a `null` entry for any remote key the manifest no
/// longer declares (spec §3 `Update(...)`, §4.F). Never includes a key
/// whose value did not change, so the serialized delta is minimal.
fn compute_delta(before: &Value, after: &IndexMap<String, Value>) -> Value {
    let before_obj = before.as_object();
    let mut delta = serde_json::Map::new();
    for (key, value) in after {
        if key == "__owner" {
            continue;
        }
        if before_obj.and_then(|b| b.get(key)) != Some(value) {
            delta.insert(key.clone(), value.clone());
        }
    }
    if let Some(b) = before_obj {
        for key in b.keys() {
            if key == "__owner" || after.contains_key(key) {
                continue;
            }
            delta.insert(key.clone(), Value::Null);
        }
    }
    Value::Object(delta)
}

fn drop_depth(urn: &URN) -> u8 {
    match urn.resource_type.scope() {
        crate::identifiers::Scope::Account => 0,
        crate::identifiers::Scope::Database => 1,
        crate::identifiers::Scope::Schema => 2,
    }
}

/// Stable topological sort over `parent`/`requires` edges. Ties (no
/// dependency relationship) break by each type's declaration order, then
/// by URN text, so repeated planning of the same manifest always
/// produces the same ordering.
fn topo_sort(manifest: &Manifest, items: &[PlanItem]) -> Vec<PlanItem> {
    let by_urn: HashMap<URN, &PlanItem> = items.iter().map(|i| (i.urn.clone(), i)).collect();
    let mut in_degree: HashMap<URN, usize> = items.iter().map(|i| (i.urn.clone(), 0)).collect();
    let mut dependents: HashMap<URN, Vec<URN>> = HashMap::new();

    for item in items {
        let Some(entry) = manifest.resources.get(&item.urn) else { continue };
        let mut deps: Vec<URN> = entry.requires.clone();
        if let Some(parent) = &entry.parent {
            deps.push(parent.clone());
        }
        for dep in deps {
            if by_urn.contains_key(&dep) {
                dependents.entry(dep.clone()).or_default().push(item.urn.clone());
                *in_degree.get_mut(&item.urn).unwrap() += 1;
            }
        }
    }

    let mut ready: Vec<URN> = in_degree.iter().filter(|(_, d)| **d == 0).map(|(u, _)| u.clone()).collect();
    sort_ready(manifest, &mut ready);

    let mut queue: VecDeque<URN> = ready.into();
    let mut seen: HashSet<URN> = HashSet::new();
    let mut ordered = Vec::with_capacity(items.len());

    while let Some(urn) = queue.pop_front() {
        if !seen.insert(urn.clone()) {
            continue;
        }
        ordered.push((**by_urn.get(&urn).unwrap()).clone());
        if let Some(children) = dependents.get(&urn) {
            let mut newly_ready = Vec::new();
            for child in children {
                let d = in_degree.get_mut(child).unwrap();
                *d -= 1;
                if *d == 0 {
                    newly_ready.push(child.clone());
                }
            }
            sort_ready(manifest, &mut newly_ready);
            for n in newly_ready {
                queue.push_back(n);
            }
        }
    }

    // Any item untouched by the edge walk (shouldn't happen outside a
    // dependency cycle) is appended deterministically rather than lost.
    for item in items {
        if !seen.contains(&item.urn) {
            ordered.push(item.clone());
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{BlueprintScope, RunMode};
    use crate::manifest::{Manifest, ManifestEntry};
    use indexmap::IndexMap as Map;
    use serde_json::json;

    fn account_urn() -> URN {
        URN::new(crate::identifiers::ResourceType::Account, crate::identifiers::FQN::name("ACCOUNT"), "AB12345")
    }

    fn manifest_with(urn: URN, owner: Option<&str>, attrs: Map<String, Value>) -> Manifest {
        let mut resources = Map::new();
        resources.insert(
            urn,
            ManifestEntry {
                owner: owner.map(str::to_string),
                parent: None,
                requires: Vec::new(),
                attrs,
            },
        );
        Manifest {
            account_locator: "AB12345".to_string(),
            resources,
        }
    }

    #[test]
    fn update_delta_is_minimal() {
        let urn = URN::new(crate::identifiers::ResourceType::Warehouse, crate::identifiers::FQN::name("WH"), "AB12345");
        let mut attrs = Map::new();
        attrs.insert("warehouse_size".to_string(), json!("SMALL"));
        attrs.insert("comment".to_string(), json!("new"));
        let manifest = manifest_with(urn.clone(), Some("SYSADMIN"), attrs);

        let mut remote = RemoteState::new(account_urn());
        remote.insert(urn.clone(), json!({"warehouse_size": "SMALL", "comment": "old", "__owner": "SYSADMIN"}));

        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let result = plan(&manifest, &remote, &config).unwrap();
        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.kind, ChangeKind::Update);
        assert_eq!(item.delta, Some(json!({"comment": "new"})));
    }

    #[test]
    fn equal_attrs_differing_owner_yields_single_transfer() {
        let urn = URN::new(crate::identifiers::ResourceType::Warehouse, crate::identifiers::FQN::name("WH"), "AB12345");
        let mut attrs = Map::new();
        attrs.insert("warehouse_size".to_string(), json!("SMALL"));
        let manifest = manifest_with(urn.clone(), Some("NEW_OWNER"), attrs);

        let mut remote = RemoteState::new(account_urn());
        remote.insert(urn.clone(), json!({"warehouse_size": "SMALL", "__owner": "OLD_OWNER"}));

        let config = BlueprintConfig::new(BlueprintScope::Account, RunMode::CreateOrUpdate, None, None, None).unwrap();
        let result = plan(&manifest, &remote, &config).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].kind, ChangeKind::Transfer);
        assert_eq!(result.items[0].from_owner.as_deref(), Some("OLD_OWNER"));
    }

    #[test]
    fn out_of_scope_declared_resource_fails_conformance() {
        let urn = URN::new(crate::identifiers::ResourceType::Role, crate::identifiers::FQN::name("SOME_ROLE"), "AB12345");
        let manifest = manifest_with(urn, None, Map::new());
        let remote = RemoteState::new(account_urn());

        let config = BlueprintConfig::new(
            BlueprintScope::Database,
            RunMode::CreateOrUpdate,
            None,
            Some("ANALYTICS".to_string()),
            None,
        )
        .unwrap();
        let err = plan(&manifest, &remote, &config).unwrap_err();
        assert!(matches!(err, CoreError::NonConformingPlan(_)));
    }
}

fn sort_ready(_manifest: &Manifest, urns: &mut [URN]) {
    urns.sort_by(|a, b| a.resource_type.declaration_order().cmp(&b.resource_type.declaration_order()).then_with(|| a.render().cmp(&b.render())));
}

/// Post-hoc conformance check: every entry in the finished plan must
/// still belong to the blueprint's scope and allowlist. Catches planner
/// bugs that would otherwise silently widen a blueprint's blast radius.
fn raise_for_nonconforming_plan(items: &[PlanItem], config: &BlueprintConfig) -> Result<(), CoreError> {
    for item in items {
        if !urn_in_scope(&item.urn, config) {
            return Err(CoreError::NonConformingPlan(format!("{} falls outside the blueprint's scope", item.urn)));
        }
        if !config.permits(item.urn.resource_type.label()) {
            return Err(CoreError::NonConformingPlan(format!("{} is not permitted by the blueprint's allowlist", item.urn)));
        }
    }
    Ok(())
}
