use super::order::SettlementToken;
use serde::{Deserialize, Serialize};

pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Diner,
    Franchisee,
    Admin,
}

/// A role, optionally scoped to an object such as a franchise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl RoleAssignment {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            object_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }

    /// Any user holding at least one role may place an order.
    pub fn can_order(&self) -> bool {
        !self.roles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: SettlementToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_shape() {
        let json = r#"{"id":"2","name":"Franchisee","email":"f@jwt.com","roles":[{"role":"franchisee","objectId":"2"}]}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.has_role(Role::Franchisee));
        assert!(!user.has_role(Role::Admin));
        assert_eq!(user.roles[0].object_id.as_deref(), Some("2"));
        assert!(user.can_order());
    }

    #[test]
    fn test_user_without_roles_cannot_order() {
        let user = User {
            id: "9".to_string(),
            name: "Nobody".to_string(),
            email: "nobody@jwt.com".to_string(),
            roles: vec![],
        };
        assert!(!user.can_order());
    }
}
