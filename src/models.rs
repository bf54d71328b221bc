use serde::{Deserialize, Serialize};

/// Coarse-grained permission tag carried on every user record.
///
/// Stored as plain text in the database; anything that is not `admin`
/// deserializes to `User`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn from_str(role: &str) -> Self {
        match role {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Full user record as read from the credential store.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Row shape rendered in the admin user table.
#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub username: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::from_str("admin"), Role::Admin);
        assert_eq!(Role::from_str("user"), Role::User);
        assert_eq!(Role::from_str("anything-else"), Role::User);
        assert_eq!(Role::from_str(Role::Admin.as_str()), Role::Admin);
    }
}
