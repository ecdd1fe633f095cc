use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{ResourceType, URN};

/// A snapshot of what actually exists in the warehouse account, as read
/// by the (external) remote client. The planner only ever compares a
/// [`crate::manifest::Manifest`] against one of these — it never talks
/// to the warehouse itself (spec §4.E).
///
/// Must contain an `account/ACCOUNT` sentinel entry; [`RemoteState::new`]
/// enforces this so the planner can always assume a stable root to hang
/// scope-stubbed containers off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteState {
    resources: IndexMap<URN, Value>,
}

impl RemoteState {
    pub fn new(sentinel: URN) -> Self {
        let mut resources = IndexMap::new();
        resources.insert(sentinel, Value::Object(Default::default()));
        RemoteState { resources }
    }

    pub fn insert(&mut self, urn: URN, attrs: Value) -> &mut Self {
        self.resources.insert(urn, attrs);
        self
    }

    pub fn get(&self, urn: &URN) -> Option<&Value> {
        self.resources.get(urn)
    }

    pub fn contains(&self, urn: &URN) -> bool {
        self.resources.contains_key(urn)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&URN, &Value)> {
        self.resources.iter()
    }

    pub fn has_sentinel(&self) -> bool {
        self.resources.keys().any(|u| u.resource_type == ResourceType::Account)
    }
}
