//! # FleetDesk RBAC
//!
//! Role-based permission resolution for the FleetDesk fleet and trip
//! management application.
//!
//! ## Features
//!
//! - **Permission resolver** answering `resource:action` checks for the
//!   authenticated principal, with a memoized decision cache
//! - **Administrator bypass** for role `1`
//! - **Deny by default** for unknown principals and unresolvable roles
//! - **Session-gated loader** that fetches users and roles concurrently and
//!   seeds the resolver once
//! - **Navigation gating** for the application's sections
//!
//! ## Example
//!
//! ```rust
//! use fleetdesk_rbac::{PermissionResolver, Principal, RoleCatalog, RoleId};
//! use std::sync::Arc;
//!
//! let resolver = PermissionResolver::new();
//! let driver = Principal::new("u1", "driver@fleet.test", RoleId(3));
//!
//! resolver.initialize(&[driver], Arc::new(RoleCatalog::default_groups()));
//!
//! assert!(resolver.check("u1", "trips:create"));
//! assert!(!resolver.check("u1", "trips:delete"));
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod loader;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use catalog::RoleCatalog;
pub use config::{LoaderConfig, RbacConfig};
pub use error::{RbacError, Result};
pub use gate::{default_navigation, visible_entries, NavEntry};
pub use loader::{DirectorySnapshot, DirectoryStore, InMemoryDirectory, LoadReport, RbacLoader, Session};
pub use resolver::{CacheStats, Decision, DecisionReason, PermissionResolver, ResolverMetrics};
pub use types::{Permission, Principal, Role, RoleId, RoleRecord, UserId, UserRecord, UserStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
