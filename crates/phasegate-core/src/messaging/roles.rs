//! Agent role vocabulary.

use serde::{Deserialize, Serialize};

/// The four logical roles that exchange messages about a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    TechLead,
    Developer,
    Qa,
    Operations,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::TechLead,
        AgentRole::Developer,
        AgentRole::Qa,
        AgentRole::Operations,
    ];
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentRole::TechLead => "tech_lead",
            AgentRole::Developer => "developer",
            AgentRole::Qa => "qa",
            AgentRole::Operations => "operations",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tech_lead" | "techlead" => Ok(AgentRole::TechLead),
            "developer" | "dev" => Ok(AgentRole::Developer),
            "qa" => Ok(AgentRole::Qa),
            "operations" | "ops" => Ok(AgentRole::Operations),
            other => Err(format!("unknown agent role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for role in AgentRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("tech-lead".parse::<AgentRole>(), Ok(AgentRole::TechLead));
        assert_eq!("OPS".parse::<AgentRole>(), Ok(AgentRole::Operations));
        assert!("manager".parse::<AgentRole>().is_err());
    }
}
