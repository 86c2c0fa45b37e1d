use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Auth principal within an org. `role` drives the access filter in the
/// query layer; `tags` drive the agent-to-agent visibility rule.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: Uuid,
    pub org_id: Uuid,
    pub agent_id: String,
    pub name: String,
    pub role: AgentRole,
    pub api_key_hash: Option<String>,
    pub tags: Vec<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    PlatformAdmin,
    OrgOwner,
    Admin,
    Agent,
    Reader,
}

impl AgentRole {
    /// `platform_admin` and `admin` see every decision in the org
    /// unfiltered (§4.11).
    pub fn bypasses_access_filter(self) -> bool {
        matches!(self, AgentRole::PlatformAdmin | AgentRole::Admin)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::PlatformAdmin => "platform_admin",
            AgentRole::OrgOwner => "org_owner",
            AgentRole::Admin => "admin",
            AgentRole::Agent => "agent",
            AgentRole::Reader => "reader",
        };
        f.write_str(s)
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_admin" => Ok(AgentRole::PlatformAdmin),
            "org_owner" => Ok(AgentRole::OrgOwner),
            "admin" => Ok(AgentRole::Admin),
            "agent" => Ok(AgentRole::Agent),
            "reader" => Ok(AgentRole::Reader),
            other => Err(format!("unknown agent role: {other}")),
        }
    }
}
