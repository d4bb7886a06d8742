//! Navigation gating: which application sections a principal may open

use serde::{Deserialize, Serialize};

use crate::resolver::PermissionResolver;
use crate::types::Permission;

/// Permission every signed-in user is expected to hold
pub const LANDING_PERMISSION: &str = "dashboard:read";

/// A navigable section of the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub key: String,
    pub route: String,

    /// Required permission; `None` means always visible
    #[serde(default)]
    pub permission: Option<Permission>,

    /// Visible only to the administrator role, whatever the permission says
    #[serde(default)]
    pub admin_only: bool,
}

impl NavEntry {
    pub fn new(key: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            route: route.into(),
            permission: None,
            admin_only: false,
        }
    }

    pub fn requires(mut self, permission: impl Into<Permission>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    fn is_landing(&self) -> bool {
        self.permission
            .as_ref()
            .map_or(true, |p| p.as_str() == LANDING_PERMISSION)
    }
}

/// The fleet application's navigation
pub fn default_navigation() -> Vec<NavEntry> {
    vec![
        NavEntry::new("dashboard", "/dashboard").requires("dashboard:read"),
        NavEntry::new("companies", "/companies").requires("companies:read"),
        NavEntry::new("vans", "/vans").requires("vans:read"),
        NavEntry::new("users", "/users").requires("users:read").admin_only(),
        NavEntry::new("employees", "/employees").requires("users:read"),
        NavEntry::new("trip-logger", "/trip-logger").requires("trips:create"),
        NavEntry::new("trip-history", "/trip-history").requires("trips:read"),
    ]
}

/// Entries `principal_id` may see
///
/// Until the resolver is ready and `principal_id` is its current principal,
/// only the landing entries and entries without a permission are shown.
pub fn visible_entries<'a>(
    resolver: &PermissionResolver,
    principal_id: Option<&str>,
    entries: &'a [NavEntry],
) -> Vec<&'a NavEntry> {
    let current = resolver.current_principal();
    let principal_id = match (principal_id, current) {
        (Some(id), Some(current)) if resolver.is_ready() && current.id.as_str() == id => id,
        _ => return entries.iter().filter(|e| e.is_landing()).collect(),
    };

    let is_admin = resolver.is_administrator(principal_id);

    entries
        .iter()
        .filter(|entry| {
            if entry.admin_only && !is_admin {
                return false;
            }
            match &entry.permission {
                Some(permission) => resolver.check(principal_id, permission.as_str()),
                None => true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoleCatalog;
    use crate::types::{Principal, RoleId};
    use std::sync::Arc;

    fn keys(entries: &[&NavEntry]) -> Vec<String> {
        entries.iter().map(|e| e.key.clone()).collect()
    }

    fn resolver_for(role_id: RoleId) -> PermissionResolver {
        let resolver = PermissionResolver::new();
        resolver.initialize(
            &[Principal::new("u1", "user@fleet.test", role_id)],
            Arc::new(RoleCatalog::default_groups()),
        );
        resolver
    }

    #[test]
    fn test_not_ready_shows_landing_only() {
        let resolver = PermissionResolver::new();
        let entries = default_navigation();

        let visible = visible_entries(&resolver, Some("u1"), &entries);
        assert_eq!(keys(&visible), vec!["dashboard"]);
    }

    #[test]
    fn test_no_principal_shows_landing_only() {
        let resolver = resolver_for(RoleId(2));
        let entries = default_navigation();

        let visible = visible_entries(&resolver, None, &entries);
        assert_eq!(keys(&visible), vec!["dashboard"]);
    }

    #[test]
    fn test_signed_out_principal_shows_landing_only() {
        let resolver = resolver_for(RoleId(3));
        let entries = default_navigation();
        let catalog = resolver.catalog().unwrap();

        resolver.initialize(&[], catalog);

        let visible = visible_entries(&resolver, Some("u1"), &entries);
        assert_eq!(keys(&visible), vec!["dashboard"]);
    }

    #[test]
    fn test_other_principal_shows_landing_only() {
        let resolver = resolver_for(RoleId::ADMINISTRATOR);
        let entries = default_navigation();

        let visible = visible_entries(&resolver, Some("u2"), &entries);
        assert_eq!(keys(&visible), vec!["dashboard"]);
    }

    #[test]
    fn test_employee_navigation() {
        let resolver = resolver_for(RoleId(3));
        let entries = default_navigation();

        let visible = visible_entries(&resolver, Some("u1"), &entries);
        assert_eq!(
            keys(&visible),
            vec!["dashboard", "companies", "vans", "trip-logger", "trip-history"]
        );
    }

    #[test]
    fn test_supervisor_cannot_see_admin_only() {
        let resolver = resolver_for(RoleId(2));
        let entries = default_navigation();

        let visible = visible_entries(&resolver, Some("u1"), &entries);
        let keys = keys(&visible);
        assert!(keys.contains(&"employees".to_string()));
        assert!(!keys.contains(&"users".to_string()));
    }

    #[test]
    fn test_administrator_sees_everything() {
        let resolver = resolver_for(RoleId::ADMINISTRATOR);
        let entries = default_navigation();

        let visible = visible_entries(&resolver, Some("u1"), &entries);
        assert_eq!(visible.len(), entries.len());
    }

    #[test]
    fn test_unrestricted_entry_always_visible() {
        let resolver = resolver_for(RoleId(3));
        let entries = vec![NavEntry::new("settings", "/settings")];

        assert_eq!(visible_entries(&resolver, Some("u1"), &entries).len(), 1);
        assert_eq!(visible_entries(&resolver, None, &entries).len(), 1);
    }
}
