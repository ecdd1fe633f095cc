use crate::account::SessionContext;
use crate::kinds;
use crate::planner::{ChangeKind, Plan, PlanItem};
use crate::sql::render;

/// `acting_role` resolves the minimum-privilege role from
/// `available_roles` that holds the privilege a change requires:
/// `CREATE ROLE` -> `USERADMIN`, `GRANT ROLE` -> `SECURITYADMIN`,
/// everything else -> the session's configured role (spec §4.G).
fn acting_role(item: &PlanItem, session: &SessionContext) -> String {
    match kinds::required_privilege(item.urn.resource_type) {
        Some(priv_name) => {
            let candidate = match priv_name {
                "CREATE ROLE" => kinds::role::PRIVILEGED_ROLE,
                "GRANT ROLE" => kinds::role_grant::PRIVILEGED_ROLE,
                _ => session.role.as_str(),
            };
            if session.has_role(candidate) {
                candidate.to_string()
            } else {
                session.role.clone()
            }
        }
        None => session.role.clone(),
    }
}

/// Compiles a [`Plan`] into an ordered list of SQL statements: a
/// `USE SECONDARY ROLES ALL` prelude, one minimum-privilege role-switch
/// block per change (switching back only when the next change needs a
/// different acting role), an ownership grant for owner-mismatched
/// creates, and an epilogue restoring the session's configured role —
/// emitted only when the last change actually switched away from it, so
/// a script that never left the session's role isn't given a redundant
/// trailing `USE ROLE` (spec §4.G; REDESIGN FLAG applied: the epilogue
/// is unconditional after a role switch, not after every plan).
pub fn compile_plan_to_sql(plan: &Plan, session: &SessionContext) -> Vec<String> {
    let mut statements = Vec::new();
    if !plan.has_changes() {
        return statements;
    }

    statements.push("USE SECONDARY ROLES ALL".to_string());

    let mut current_role: Option<String> = None;
    for item in &plan.items {
        let role = acting_role(item, session);
        if current_role.as_deref() != Some(role.as_str()) {
            statements.push(format!("USE ROLE {role}"));
            current_role = Some(role.clone());
        }
        statements.extend(statements_for(item, &role));
    }

    if current_role.as_deref() != Some(session.role.as_str()) {
        statements.push(format!("USE ROLE {}", session.role));
    }
    statements
}

fn statements_for(item: &PlanItem, acting_role: &str) -> Vec<String> {
    match item.kind {
        ChangeKind::Create => {
            let mut stmts = vec![render::create(&item.urn, item.after.as_ref().expect("create has attrs"))];
            if let Some(owner) = &item.owner {
                if owner != acting_role {
                    stmts.push(render::grant_ownership(&item.urn, owner));
                }
            }
            stmts
        }
        ChangeKind::Update => vec![render::alter(&item.urn, item.after.as_ref().expect("update has attrs"))],
        ChangeKind::Transfer => {
            let owner = item.owner.as_deref().expect("transfer has an owner");
            vec![render::grant_ownership(&item.urn, owner)]
        }
        ChangeKind::Drop => vec![render::drop_stmt(&item.urn)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountEdition;
    use crate::identifiers::{FQN, ResourceType, URN};
    use serde_json::json;

    fn session() -> SessionContext {
        SessionContext {
            account: "ACME".to_string(),
            account_edition: AccountEdition::Standard,
            account_locator: "AB12345".to_string(),
            role: "SYSADMIN".to_string(),
            available_roles: vec!["SYSADMIN".to_string(), "USERADMIN".to_string(), "SECURITYADMIN".to_string()],
        }
    }

    fn urn(resource_type: ResourceType, name: &str) -> URN {
        URN::new(resource_type, FQN::name(name), "AB12345")
    }

    #[test]
    fn owner_mismatched_create_emits_ownership_grant_and_no_redundant_epilogue() {
        // The warehouse's acting role (session.role, SYSADMIN) is already
        // the session role, so the compiler must not append a second,
        // redundant `USE ROLE SYSADMIN` after the ownership grant.
        let plan = Plan {
            items: vec![PlanItem {
                urn: urn(ResourceType::Warehouse, "WH"),
                kind: ChangeKind::Create,
                owner: Some("SOME_ROLE".to_string()),
                from_owner: None,
                before: None,
                after: Some(json!({"warehouse_size": "XSMALL"})),
                delta: None,
            }],
        };
        let sql = compile_plan_to_sql(&plan, &session());
        assert_eq!(sql.len(), 4);
        assert_eq!(sql[0], "USE SECONDARY ROLES ALL");
        assert_eq!(sql[1], "USE ROLE SYSADMIN");
        assert!(sql[2].starts_with("CREATE WAREHOUSE"));
        assert_eq!(sql[3], "GRANT OWNERSHIP ON WAREHOUSE WH TO ROLE SOME_ROLE COPY CURRENT GRANTS");
    }

    #[test]
    fn role_creation_switches_to_useradmin_then_back() {
        let plan = Plan {
            items: vec![PlanItem {
                urn: urn(ResourceType::Role, "SOME_ROLE"),
                kind: ChangeKind::Create,
                owner: None,
                from_owner: None,
                before: None,
                after: Some(json!({})),
                delta: None,
            }],
        };
        let sql = compile_plan_to_sql(&plan, &session());
        assert_eq!(sql, vec![
            "USE SECONDARY ROLES ALL",
            "USE ROLE USERADMIN",
            "CREATE ROLE SOME_ROLE",
            "USE ROLE SYSADMIN",
        ]);
    }

    #[test]
    fn empty_plan_compiles_to_no_statements() {
        let plan = Plan::default();
        assert!(compile_plan_to_sql(&plan, &session()).is_empty());
    }
}
