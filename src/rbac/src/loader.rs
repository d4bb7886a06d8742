//! Data loading: fetches users and roles from the directory store and seeds
//! the resolver once both have arrived.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::catalog::RoleCatalog;
use crate::config::LoaderConfig;
use crate::error::{RbacError, Result};
use crate::resolver::PermissionResolver;
use crate::types::{Principal, RoleRecord, UserId, UserRecord};

/// Source of user and role rows (the hosted backend)
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn load_users(&self) -> Result<Vec<UserRecord>>;

    async fn load_roles(&self) -> Result<Vec<RoleRecord>>;
}

/// Serialized directory contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
}

impl DirectorySnapshot {
    /// No users and the provisioned seed groups
    pub fn seeded() -> Self {
        Self {
            users: Vec::new(),
            roles: RoleCatalog::default_groups()
                .roles()
                .cloned()
                .map(RoleRecord::from)
                .collect(),
        }
    }

    /// Read a snapshot from a JSON file
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// In-memory directory store
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    snapshot: RwLock<DirectorySnapshot>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub async fn set_users(&self, users: Vec<UserRecord>) {
        self.snapshot.write().await.users = users;
    }

    pub async fn set_roles(&self, roles: Vec<RoleRecord>) {
        self.snapshot.write().await.roles = roles;
    }

    /// Replace the permission list of one role. Returns false if no row has
    /// that id.
    pub async fn update_role_permissions(&self, role_id: &str, permissions: Vec<String>) -> bool {
        let mut snapshot = self.snapshot.write().await;
        match snapshot.roles.iter_mut().find(|r| r.id == role_id) {
            Some(role) => {
                role.permissions = permissions;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn load_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.snapshot.read().await.users.clone())
    }

    async fn load_roles(&self) -> Result<Vec<RoleRecord>> {
        Ok(self.snapshot.read().await.roles.clone())
    }
}

/// Authenticated session signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Session {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Outcome of a load cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Principal derived from the session (`None` after logout)
    pub principal_id: Option<UserId>,

    /// Principal was synthesized because no user row matched the session
    pub synthesized: bool,

    pub users_loaded: usize,
    pub roles_loaded: usize,
    pub roles_rejected: usize,

    /// Resolver was (re)seeded; false when the catalog came back empty
    pub initialized: bool,
}

/// Drives resolver initialization from the authenticated-session signal
pub struct RbacLoader {
    store: Arc<dyn DirectoryStore>,
    resolver: Arc<PermissionResolver>,
    config: LoaderConfig,
}

impl RbacLoader {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        resolver: Arc<PermissionResolver>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    pub fn resolver(&self) -> &Arc<PermissionResolver> {
        &self.resolver
    }

    /// React to a session change
    ///
    /// With a session, users and roles are loaded concurrently and the
    /// resolver is initialized once with both. Without one (logout), the
    /// resolver keeps its catalog but loses its principal. On load failure
    /// the resolver is left exactly as it was.
    pub async fn on_session(&self, session: Option<&Session>) -> Result<LoadReport> {
        match session {
            Some(session) => self.load_for(session).await,
            None => Ok(self.sign_out()),
        }
    }

    fn sign_out(&self) -> LoadReport {
        let initialized = match self.resolver.catalog() {
            Some(catalog) => {
                info!("Session ended, dropping current principal");
                self.resolver.initialize(&[], catalog);
                true
            }
            None => false,
        };

        LoadReport {
            principal_id: None,
            synthesized: false,
            users_loaded: 0,
            roles_loaded: 0,
            roles_rejected: 0,
            initialized,
        }
    }

    async fn load_for(&self, session: &Session) -> Result<LoadReport> {
        info!("Loading RBAC data for session {}", session.email);

        let timeout = Duration::from_millis(self.config.load_timeout_ms);
        let loaded = tokio::time::timeout(timeout, async {
            tokio::try_join!(self.store.load_users(), self.store.load_roles())
        })
        .await;

        let (user_rows, role_rows) = match loaded {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                error!("Failed to load RBAC data: {}", e);
                return Err(e);
            }
            Err(_) => {
                error!("RBAC data load timed out after {} ms", self.config.load_timeout_ms);
                return Err(RbacError::LoadTimeout(self.config.load_timeout_ms));
            }
        };

        debug!("Loaded {} users and {} roles", user_rows.len(), role_rows.len());

        let catalog = Arc::new(RoleCatalog::from_records_lossy(role_rows));
        let users = principals_from_records(user_rows);
        let (principal, synthesized) = match find_principal(&users, session) {
            Some(principal) => (principal.clone(), false),
            None => (self.fallback_principal(session), true),
        };

        let report = LoadReport {
            principal_id: Some(principal.id.clone()),
            synthesized,
            users_loaded: users.len(),
            roles_loaded: catalog.len(),
            roles_rejected: catalog.rejected(),
            initialized: !catalog.is_empty(),
        };

        self.resolver.initialize(std::slice::from_ref(&principal), catalog);
        Ok(report)
    }

    fn fallback_principal(&self, session: &Session) -> Principal {
        let id = session
            .user_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        warn!(
            "No user row matches session {}, using fallback principal with role {}",
            session.email, self.config.fallback_role_id
        );

        Principal::new(id, session.email.clone(), self.config.fallback_role_id)
            .with_name(self.config.fallback_name.clone())
    }
}

fn principals_from_records(records: Vec<UserRecord>) -> Vec<Principal> {
    records
        .into_iter()
        .filter_map(|record| match Principal::try_from(record) {
            Ok(principal) => Some(principal),
            Err(e) => {
                error!("Rejecting user row: {}", e);
                None
            }
        })
        .collect()
}

/// Email match first (case-insensitive), then session user id
fn find_principal<'a>(users: &'a [Principal], session: &Session) -> Option<&'a Principal> {
    let email = session.email.trim();
    users
        .iter()
        .find(|user| user.email.trim().eq_ignore_ascii_case(email))
        .or_else(|| {
            let user_id = session.user_id.as_deref()?;
            users.iter().find(|user| user.id.as_str() == user_id)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoleId;

    fn user(id: &str, email: &str, role_id: i64) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: email.to_string(),
            name: String::new(),
            phone: None,
            status: Default::default(),
            role_id,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_find_principal_by_email() {
        let users = principals_from_records(vec![
            user("u1", "Alice@Fleet.test", 2),
            user("u2", "bob@fleet.test", 3),
        ]);

        let session = Session::new("alice@fleet.test");
        assert_eq!(find_principal(&users, &session).unwrap().id.as_str(), "u1");
    }

    #[test]
    fn test_find_principal_by_user_id() {
        let users = principals_from_records(vec![user("u2", "bob@fleet.test", 3)]);

        let session = Session::new("renamed@fleet.test").with_user_id("u2");
        assert_eq!(find_principal(&users, &session).unwrap().role_id, RoleId(3));

        let unknown = Session::new("nobody@fleet.test");
        assert!(find_principal(&users, &unknown).is_none());
    }

    #[test]
    fn test_invalid_user_rows_are_dropped() {
        let users = principals_from_records(vec![
            user("u1", "a@fleet.test", -1),
            user("u2", "b@fleet.test", 2),
        ]);
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_update_role_permissions() {
        let directory = InMemoryDirectory::new();
        directory
            .set_roles(vec![RoleRecord {
                id: "2".to_string(),
                name: "Employee".to_string(),
                description: None,
                color: None,
                permissions: vec![],
            }])
            .await;

        assert!(directory.update_role_permissions("2", vec!["trips:read".to_string()]).await);
        assert!(!directory.update_role_permissions("9", vec![]).await);

        let roles = directory.load_roles().await.unwrap();
        assert_eq!(roles[0].permissions, vec!["trips:read".to_string()]);
    }
}
