use serde_json::Value;

use crate::error::CoreError;
use crate::planner::{ChangeKind, Plan};

/// Serializes a [`Plan`] to the JSON form used for storage and
/// round-tripping through [`plan_from_dict`] (spec §4.H).
pub fn dump_plan_json(plan: &Plan) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// The inverse of [`dump_plan_json`]: re-hydrates a plan previously
/// produced by this engine so it can be applied without rerunning
/// `generate_manifest`/`plan` (supplemented from the source's
/// `plan_from_dict`/`blueprint_apply_plan`, which allow a previously
/// computed plan to be re-applied verbatim).
pub fn plan_from_dict(raw: &Value) -> Result<Plan, CoreError> {
    Ok(serde_json::from_value(raw.clone())?)
}

pub fn plan_from_json(s: &str) -> Result<Plan, CoreError> {
    Ok(serde_json::from_str(s)?)
}

/// Renders the same summary a human reviewing `strata plan` output would
/// see: a banner line, a one-line tally, then one line per change in
/// plan order.
pub fn dump_plan_text(plan: &Plan) -> String {
    let creates = plan.to_create().count();
    let updates = plan.to_update().count();
    let transfers = plan.to_transfer().count();
    let drops = plan.to_drop().count();

    let mut out = String::new();
    out.push_str("» strata\n");
    out.push_str(&format!(
        "» Plan: {creates} to create, {updates} to update, {transfers} to transfer, {drops} to drop\n"
    ));
    for item in &plan.items {
        out.push_str(&format!("  {} {}", symbol(item.kind), item.urn));
        if let Some(Value::Object(delta)) = &item.delta {
            let keys: Vec<&str> = delta.keys().map(String::as_str).collect();
            if !keys.is_empty() {
                out.push_str(&format!(" ({})", keys.join(", ")));
            }
        }
        out.push('\n');
    }
    out
}

fn symbol(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Create => "+",
        ChangeKind::Update => "~",
        ChangeKind::Transfer => "»",
        ChangeKind::Drop => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{FQN, ResourceType, URN};
    use crate::planner::PlanItem;
    use serde_json::json;

    fn sample_plan() -> Plan {
        Plan {
            items: vec![PlanItem {
                urn: URN::new(ResourceType::Warehouse, FQN::name("WH"), "AB12345"),
                kind: ChangeKind::Create,
                owner: None,
                from_owner: None,
                before: None,
                after: Some(json!({"warehouse_size": "XSMALL"})),
                delta: None,
            }],
        }
    }

    #[test]
    fn json_round_trips_through_plan_from_dict() {
        let plan = sample_plan();
        let json = dump_plan_json(&plan).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let restored = plan_from_dict(&value).unwrap();
        assert_eq!(restored.items.len(), 1);
        assert_eq!(restored.items[0].urn, plan.items[0].urn);
    }

    #[test]
    fn text_summary_reports_tally_and_banner() {
        let text = dump_plan_text(&sample_plan());
        assert!(text.starts_with("» strata\n"));
        assert!(text.contains("1 to create, 0 to update, 0 to transfer, 0 to drop"));
    }

    #[test]
    fn update_delta_round_trips_and_appears_in_text() {
        let plan = Plan {
            items: vec![PlanItem {
                urn: URN::new(ResourceType::Warehouse, FQN::name("WH"), "AB12345"),
                kind: ChangeKind::Update,
                owner: Some("SYSADMIN".to_string()),
                from_owner: Some("SYSADMIN".to_string()),
                before: Some(json!({"comment": "old"})),
                after: Some(json!({"comment": "new"})),
                delta: Some(json!({"comment": "new"})),
            }],
        };

        let json = dump_plan_json(&plan).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let restored = plan_from_dict(&value).unwrap();
        assert_eq!(restored.items[0].delta, Some(json!({"comment": "new"})));

        let text = dump_plan_text(&plan);
        assert!(text.contains("~ urn:AB12345:warehouse/WH (comment)"));
    }
}
