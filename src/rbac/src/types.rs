//! Core RBAC types: identifiers, principals, roles and their external records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{RbacError, Result};

/// Role identifier
///
/// The hosted store keeps role ids as numeric strings; they are parsed into
/// this type at the record boundary and never compared as strings afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u32);

impl RoleId {
    /// Reserved administrator role. Grants every permission.
    pub const ADMINISTRATOR: RoleId = RoleId(1);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_administrator(self) -> bool {
        self == Self::ADMINISTRATOR
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(RoleId)
            .map_err(|_| RbacError::MalformedRoleId(s.to_string()))
    }
}

impl TryFrom<i64> for RoleId {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        u32::try_from(value).map(RoleId)
    }
}

/// Principal identifier (e.g. a user UUID)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A `resource:action` permission token (e.g. `trips:create`)
///
/// Comparison is exact and case-sensitive. There are no wildcards and no
/// hierarchy between tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Wrap a token without validating its shape
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parse a token, requiring a non-empty resource and action
    pub fn parse(token: &str) -> Result<Self> {
        let valid = match token.split_once(':') {
            Some((resource, action)) => {
                !resource.is_empty()
                    && !action.is_empty()
                    && !action.contains(':')
                    && !token.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if valid {
            Ok(Self(token.to_string()))
        } else {
            Err(RbacError::InvalidPermission(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource part (`trips` in `trips:create`)
    pub fn resource(&self) -> Option<&str> {
        self.0.split_once(':').map(|(resource, _)| resource)
    }

    /// Action part (`create` in `trips:create`)
    pub fn action(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, action)| action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Permission {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// Create an active principal
    pub fn new(id: impl Into<UserId>, email: impl Into<String>, role_id: RoleId) -> Self {
        let email = email.into();
        Self {
            id: id.into(),
            name: email.clone(),
            email,
            phone: None,
            status: UserStatus::Active,
            role_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_administrator(&self) -> bool {
        self.role_id.is_administrator()
    }
}

/// Role definition (a "system group" in the fleet application)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new<I, P>(id: RoleId, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            id,
            name: name.into(),
            description: None,
            color: None,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Exact-match membership test
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.contains(&Permission::from(permission))
    }
}

/// Role row as stored upstream (string identifier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl TryFrom<RoleRecord> for Role {
    type Error = RbacError;

    fn try_from(record: RoleRecord) -> Result<Self> {
        let id: RoleId = record.id.parse()?;
        Ok(Self {
            id,
            name: record.name,
            description: record.description,
            color: record.color,
            permissions: record.permissions.into_iter().map(Permission::from).collect(),
        })
    }
}

impl From<Role> for RoleRecord {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name,
            description: role.description,
            color: role.color,
            permissions: role.permissions.into_iter().map(|p| p.0).collect(),
        }
    }
}

/// User row as stored upstream (integer role reference)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    pub role_id: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for Principal {
    type Error = RbacError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let role_id = RoleId::try_from(record.role_id).map_err(|_| {
            RbacError::InvalidRoleReference {
                user_id: record.id.clone(),
                role_id: record.role_id,
            }
        })?;

        Ok(Self {
            id: UserId::new(record.id),
            name: if record.name.is_empty() {
                record.email.clone()
            } else {
                record.name
            },
            email: record.email,
            phone: record.phone,
            status: record.status,
            role_id,
            created_at: record.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_id_parse() {
        assert_eq!("2".parse::<RoleId>().unwrap(), RoleId(2));
        assert_eq!(" 3 ".parse::<RoleId>().unwrap(), RoleId(3));
        assert!(matches!(
            "abc".parse::<RoleId>(),
            Err(RbacError::MalformedRoleId(_))
        ));
        assert!("-1".parse::<RoleId>().is_err());
        assert!("".parse::<RoleId>().is_err());
    }

    #[test]
    fn test_administrator_sentinel() {
        assert!(RoleId(1).is_administrator());
        assert!(!RoleId(2).is_administrator());
    }

    #[test]
    fn test_permission_parse() {
        let perm = Permission::parse("trips:create").unwrap();
        assert_eq!(perm.resource(), Some("trips"));
        assert_eq!(perm.action(), Some("create"));

        assert!(Permission::parse("trips").is_err());
        assert!(Permission::parse(":create").is_err());
        assert!(Permission::parse("trips:").is_err());
        assert!(Permission::parse("a:b:c").is_err());
        assert!(Permission::parse("trips: read").is_err());
    }

    #[test]
    fn test_role_grants_exact_match() {
        let role = Role::new(RoleId(2), "Employee", ["trips:read"]);
        assert!(role.grants("trips:read"));
        assert!(!role.grants("Trips:read"));
        assert!(!role.grants("trips"));
        assert!(!role.grants("trips:read:all"));
    }

    #[test]
    fn test_role_record_conversion() {
        let record = RoleRecord {
            id: "2".to_string(),
            name: "Supervisor".to_string(),
            description: None,
            color: Some("#ea580c".to_string()),
            permissions: vec!["vans:read".to_string(), "vans:read".to_string()],
        };

        let role = Role::try_from(record).unwrap();
        assert_eq!(role.id, RoleId(2));
        assert_eq!(role.permissions.len(), 1);

        let bad = RoleRecord {
            id: "550e8400-e29b-41d4-a716-446655440001".to_string(),
            name: "Administrator".to_string(),
            description: None,
            color: None,
            permissions: vec![],
        };
        assert!(Role::try_from(bad).is_err());
    }

    #[test]
    fn test_user_record_conversion() {
        let json = r#"{"id":"u1","email":"driver@fleet.test","role_id":3}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        let principal = Principal::try_from(record).unwrap();

        assert_eq!(principal.id.as_str(), "u1");
        assert_eq!(principal.name, "driver@fleet.test");
        assert_eq!(principal.status, UserStatus::Active);
        assert_eq!(principal.role_id, RoleId(3));

        let negative: UserRecord =
            serde_json::from_str(r#"{"id":"u2","email":"x@fleet.test","role_id":-4}"#).unwrap();
        assert!(matches!(
            Principal::try_from(negative),
            Err(RbacError::InvalidRoleReference { role_id: -4, .. })
        ));
    }
}
