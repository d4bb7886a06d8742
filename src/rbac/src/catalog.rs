//! Role catalog: the loaded set of role definitions, indexed by id

use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::error::Result;
use crate::types::{Role, RoleId, RoleRecord};

/// Immutable role catalog
///
/// Shared with the resolver as `Arc<RoleCatalog>`. When two roles carry the
/// same id the first one wins, matching a linear "find first" lookup.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: BTreeMap<RoleId, Role>,
    rejected: usize,
}

impl RoleCatalog {
    /// Build a catalog from typed roles
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut catalog = Self::default();
        for role in roles {
            catalog.insert(role);
        }
        catalog
    }

    /// Build a catalog from upstream rows, failing on the first malformed row
    pub fn from_records(records: impl IntoIterator<Item = RoleRecord>) -> Result<Self> {
        let mut catalog = Self::default();
        for record in records {
            catalog.insert(Role::try_from(record)?);
        }
        Ok(catalog)
    }

    /// Build a catalog from upstream rows, skipping malformed rows
    ///
    /// Principals referencing a skipped row resolve to no role and are denied.
    pub fn from_records_lossy(records: impl IntoIterator<Item = RoleRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            let name = record.name.clone();
            match Role::try_from(record) {
                Ok(role) => catalog.insert(role),
                Err(e) => {
                    error!("Rejecting role '{}': {}", name, e);
                    catalog.rejected += 1;
                }
            }
        }
        catalog
    }

    /// Seed groups the hosted store is provisioned with
    pub fn default_groups() -> Self {
        Self::new([
            Role::new(
                RoleId::ADMINISTRATOR,
                "Administrator",
                [
                    "users:read", "users:create", "users:update", "users:delete",
                    "vans:read", "vans:create", "vans:update", "vans:delete",
                    "trips:read", "trips:create", "trips:update", "trips:delete",
                    "companies:read", "companies:create", "companies:update", "companies:delete",
                    "groups:read", "groups:manage",
                    "dashboard:read", "settings:read", "settings:update",
                ],
            )
            .with_description("Full system access")
            .with_color("#dc2626"),
            Role::new(
                RoleId(2),
                "Supervisor",
                [
                    "users:read", "users:update",
                    "vans:read", "vans:update",
                    "trips:read", "trips:create", "trips:update",
                    "companies:read", "groups:read", "dashboard:read",
                ],
            )
            .with_description("Supervisor access")
            .with_color("#ea580c"),
            Role::new(
                RoleId(3),
                "Employee",
                [
                    "dashboard:read", "trips:read", "trips:create",
                    "companies:read", "vans:read",
                ],
            )
            .with_description("Standard employee access")
            .with_color("#3b82f6"),
        ])
    }

    fn insert(&mut self, role: Role) {
        if self.roles.contains_key(&role.id) {
            warn!("Duplicate role id {} ('{}'), keeping the first definition", role.id, role.name);
            return;
        }
        self.roles.insert(role.id, role);
    }

    pub fn get(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(&id)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Number of upstream rows skipped by `from_records_lossy`
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, permissions: &[&str]) -> RoleRecord {
        RoleRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            color: None,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_groups() {
        let catalog = RoleCatalog::default_groups();
        assert_eq!(catalog.len(), 3);

        let employee = catalog.get(RoleId(3)).unwrap();
        assert_eq!(employee.name, "Employee");
        assert!(employee.grants("trips:create"));
        assert!(!employee.grants("trips:delete"));
    }

    #[test]
    fn test_first_definition_wins() {
        let catalog = RoleCatalog::new([
            Role::new(RoleId(2), "First", ["trips:read"]),
            Role::new(RoleId(2), "Second", ["trips:delete"]),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(RoleId(2)).unwrap().name, "First");
    }

    #[test]
    fn test_strict_records_fail_on_malformed_id() {
        let result = RoleCatalog::from_records(vec![
            record("2", "Employee", &["trips:read"]),
            record("two", "Broken", &[]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lossy_records_skip_malformed_id() {
        let catalog = RoleCatalog::from_records_lossy(vec![
            record("1", "Administrator", &[]),
            record("not-a-number", "Broken", &["trips:read"]),
            record("2", "Employee", &["trips:read"]),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.rejected(), 1);
        assert!(catalog.get(RoleId(2)).is_some());
    }
}
