use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Explicit cross-agent permission, independent of tag overlap. Expired
/// grants (`expires_at` in the past) are ignored by the access filter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    pub id: Uuid,
    pub org_id: Uuid,
    pub grantor_agent_id: Uuid,
    pub grantee_agent_id: Uuid,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub permission: Permission,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    AgentTraces,
    Decision,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant(expires_at: Option<DateTime<Utc>>) -> AccessGrant {
        AccessGrant {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            grantor_agent_id: Uuid::new_v4(),
            grantee_agent_id: Uuid::new_v4(),
            resource_type: ResourceType::AgentTraces,
            resource_id: None,
            permission: Permission::Read,
            granted_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn no_expiry_is_always_active() {
        assert!(grant(None).is_active(Utc::now()));
    }

    #[test]
    fn future_expiry_is_active() {
        let g = grant(Some(Utc::now() + Duration::hours(1)));
        assert!(g.is_active(Utc::now()));
    }

    #[test]
    fn past_expiry_is_inactive() {
        let g = grant(Some(Utc::now() - Duration::hours(1)));
        assert!(!g.is_active(Utc::now()));
    }
}
