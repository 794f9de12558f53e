use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Closed set of roles an authenticated caller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Staff,
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MEMBER" => Ok(Role::Member),
            "STAFF" => Ok(Role::Staff),
            other => Err(CoreError::validation("role", format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn member(account_id: Uuid) -> Self {
        Self { account_id, role: Role::Member }
    }

    pub fn staff(account_id: Uuid) -> Self {
        Self { account_id, role: Role::Staff }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

/// Identity handed to every core operation by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthContext {
    Anonymous,
    Authenticated(Caller),
}

impl AuthContext {
    pub fn caller(&self) -> CoreResult<&Caller> {
        match self {
            AuthContext::Authenticated(caller) => Ok(caller),
            AuthContext::Anonymous => Err(CoreError::NotAuthenticated),
        }
    }

    pub fn require_staff(&self, action: &str) -> CoreResult<&Caller> {
        let caller = self.caller()?;
        if !caller.is_staff() {
            return Err(CoreError::PermissionDenied(format!(
                "{} requires the STAFF role",
                action
            )));
        }
        Ok(caller)
    }
}

impl From<Caller> for AuthContext {
    fn from(caller: Caller) -> Self {
        AuthContext::Authenticated(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let ctx = AuthContext::Anonymous;
        assert!(matches!(ctx.caller(), Err(CoreError::NotAuthenticated)));
    }

    #[test]
    fn test_require_staff() {
        let member: AuthContext = Caller::member(Uuid::new_v4()).into();
        assert!(matches!(
            member.require_staff("resolve"),
            Err(CoreError::PermissionDenied(_))
        ));

        let staff: AuthContext = Caller::staff(Uuid::new_v4()).into();
        assert!(staff.require_staff("resolve").is_ok());
    }
}
