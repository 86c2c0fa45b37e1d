use akashi_models::agent::{Agent, AgentRole};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

/// `None` means unfiltered (platform_admin/admin); `Some(set)` lists the
/// agent row ids whose decisions the caller may see (§4.11).
///
/// - `agent`: self, plus any agent sharing at least one tag, plus any
///   agent that granted `agent_traces`/`read` to the caller.
/// - `reader`: explicit grants only — no self, no tag overlap.
/// - `org_owner` is treated like `agent` here; ownership of the org does
///   not itself confer trace visibility beyond what the role table grants.
pub async fn compute_allowed_set(pool: &PgPool, caller: &Agent) -> Result<Option<HashSet<Uuid>>, sqlx::Error> {
    if caller.role.bypasses_access_filter() {
        return Ok(None);
    }

    let mut allowed = HashSet::new();

    if matches!(caller.role, AgentRole::Agent | AgentRole::OrgOwner) {
        allowed.insert(caller.id);

        if !caller.tags.is_empty() {
            let tag_sharing: Vec<Uuid> = sqlx::query_scalar(
                "SELECT id FROM agents WHERE org_id = $1 AND id != $2 AND tags && $3",
            )
            .bind(caller.org_id)
            .bind(caller.id)
            .bind(&caller.tags)
            .fetch_all(pool)
            .await?;
            allowed.extend(tag_sharing);
        }
    }

    let granted: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT grantor_agent_id FROM access_grants
        WHERE org_id = $1
          AND grantee_agent_id = $2
          AND resource_type = 'agent_traces'
          AND permission = 'read'
          AND (expires_at IS NULL OR expires_at > now())
        "#,
    )
    .bind(caller.org_id)
    .bind(caller.id)
    .fetch_all(pool)
    .await?;
    allowed.extend(granted);

    Ok(Some(allowed))
}

/// True if both sides of a conflict pair are visible to `allowed` (§4.11,
/// §6 `/v1/conflicts`). `None` (unfiltered) always passes.
pub fn can_see_pair(allowed: &Option<HashSet<Uuid>>, a: Uuid, b: Uuid) -> bool {
    match allowed {
        None => true,
        Some(set) => set.contains(&a) && set.contains(&b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_pair_always_visible() {
        assert!(can_see_pair(&None, Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn pair_requires_both_sides_in_set() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = HashSet::new();
        set.insert(a);
        assert!(!can_see_pair(&Some(set.clone()), a, b));
        set.insert(b);
        assert!(can_see_pair(&Some(set), a, b));
    }
}
