//! Monitor ownership.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::apiclient::MonitorOwner;

/// The actor that owns a monitor. State form is `user:<id>` or `team:<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// A single user.
    User(String),
    /// A team.
    Team(String),
}

/// An owner string or API owner that is not a user or team reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected \"user:<id>\" or \"team:<id>\", got {0:?}")]
pub struct OwnerParseError(String);

impl Owner {
    /// Convert the API's `{type, id}` owner.
    pub fn from_api(owner: &MonitorOwner) -> Result<Self, OwnerParseError> {
        Self::from_parts(&owner.owner_type, &owner.id.to_string())
            .ok_or_else(|| OwnerParseError(format!("{}:{}", owner.owner_type, owner.id)))
    }

    fn from_parts(kind: &str, id: &str) -> Option<Self> {
        if id.is_empty() || id.contains(':') {
            return None;
        }
        match kind {
            "user" => Some(Owner::User(id.to_string())),
            "team" => Some(Owner::Team(id.to_string())),
            _ => None,
        }
    }
}

impl FromStr for Owner {
    type Err = OwnerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once(':')
            .and_then(|(kind, id)| Self::from_parts(kind, id))
            .ok_or_else(|| OwnerParseError(s.to_string()))
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::User(id) => write!(f, "user:{}", id),
            Owner::Team(id) => write!(f, "team:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apiclient::FlexibleId;

    #[test]
    fn test_parse_and_format() {
        let owner: Owner = "team:42".parse().unwrap();
        assert_eq!(owner, Owner::Team("42".to_string()));
        assert_eq!(owner.to_string(), "team:42");

        let owner: Owner = "user:7".parse().unwrap();
        assert_eq!(owner, Owner::User("7".to_string()));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["42", "team:", "org:1", "", "user:1:2", "team::1"] {
            assert!(bad.parse::<Owner>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_from_api() {
        let owner = Owner::from_api(&MonitorOwner {
            owner_type: "user".to_string(),
            id: FlexibleId::Number(9),
        })
        .unwrap();
        assert_eq!(owner.to_string(), "user:9");

        let err = Owner::from_api(&MonitorOwner {
            owner_type: "bot".to_string(),
            id: FlexibleId::String("1".to_string()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("bot:1"));
    }
}
