//! Permission resolver
//!
//! Answers "may principal U perform P" for the authenticated principal
//! against the loaded role catalog, memoizing every answer until the next
//! `initialize` or `clear`.
//!
//! ```text
//! check(id, perm) → [cache] ─hit─────────────────────────→ bool
//!                      ↓ miss
//!                principal? ─no / mismatch──────→ deny ─┐
//!                      ↓                                │
//!                role_id == 1 ─yes──────────────→ allow ┤
//!                      ↓                                │
//!                catalog[role_id] ─missing──────→ deny ─┤
//!                      ↓                                ↓
//!                perm ∈ role.permissions ──────────→ [cache] → bool
//! ```

pub mod cache;
pub mod decision;
pub mod metrics;

pub use cache::CacheStats;
pub use decision::{Decision, DecisionReason};
pub use metrics::ResolverMetrics;

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::catalog::RoleCatalog;
use crate::types::{Permission, Principal};
use cache::{CacheKey, DecisionCache};
use metrics::MetricsCollector;

/// State guarded by the resolver lock
#[derive(Debug)]
struct ResolverState {
    principal: Option<Principal>,
    catalog: Option<Arc<RoleCatalog>>,
    cache: DecisionCache,
}

impl ResolverState {
    fn resolve(&self, principal_id: &str, permission: &str, metrics: &MetricsCollector) -> DecisionReason {
        let principal = match &self.principal {
            None => return DecisionReason::NoPrincipal,
            Some(p) if p.id.as_str() != principal_id => return DecisionReason::PrincipalMismatch,
            Some(p) => p,
        };

        if principal.is_administrator() {
            return DecisionReason::AdministratorBypass;
        }

        metrics.record_role_lookup();
        let role = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.get(principal.role_id));

        match role {
            Some(role) if role.grants(permission) => DecisionReason::RoleGrant { role_id: role.id },
            Some(role) => DecisionReason::PermissionNotGranted { role_id: role.id },
            None => DecisionReason::UnknownRole {
                role_id: principal.role_id,
            },
        }
    }
}

/// Role-based permission resolver with a memoized decision cache
///
/// # Thread Safety
///
/// The current principal, the catalog reference and the decision cache sit
/// behind a single mutex. `initialize`, `clear` and the lookup-compute-insert
/// sequence of `check` each run under that lock, so no query observes a
/// partially seeded or partially cleared state.
#[derive(Debug)]
pub struct PermissionResolver {
    state: Mutex<ResolverState>,
    metrics: MetricsCollector,
}

impl PermissionResolver {
    /// Create an uninitialized resolver. Every check denies until a
    /// non-empty catalog is supplied.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResolverState {
                principal: None,
                catalog: None,
                cache: DecisionCache::new(),
            }),
            metrics: MetricsCollector::new(),
        }
    }

    /// Seed the resolver with the authenticated principal and role catalog
    ///
    /// The first entry of `principals` becomes the current principal; an
    /// empty slice leaves the resolver with no principal. An empty catalog
    /// makes this a no-op so the resolver never claims readiness without
    /// role data.
    pub fn initialize(&self, principals: &[Principal], catalog: Arc<RoleCatalog>) {
        if catalog.is_empty() {
            warn!("Skipping resolver initialization: role catalog is empty");
            self.metrics.record_initialization(false);
            return;
        }

        let principal = principals.first().cloned();
        let mut state = self.state.lock();

        info!(
            "Resolver initialized: principal={}, roles={}",
            principal.as_ref().map(|p| p.id.as_str()).unwrap_or("<none>"),
            catalog.len()
        );

        state.principal = principal;
        state.catalog = Some(catalog);
        state.cache.clear();
        self.metrics.record_initialization(true);
    }

    /// Whether `principal_id` may perform `permission`
    ///
    /// Never fails: every unresolvable case is a denial.
    pub fn check(&self, principal_id: &str, permission: &str) -> bool {
        self.check_detailed(principal_id, permission).allowed
    }

    /// Like `check`, with the reason and whether the cache answered
    pub fn check_detailed(&self, principal_id: &str, permission: &str) -> Decision {
        let key = CacheKey::new(principal_id, permission);
        let mut state = self.state.lock();

        if let Some(reason) = state.cache.get(&key) {
            self.metrics.record_cache_hit();
            self.metrics.record_decision(reason);
            trace!("Cache hit: {} for {} = {}", permission, principal_id, reason.is_allowed());
            return Decision::from_cache(reason);
        }
        self.metrics.record_cache_miss();

        let reason = state.resolve(principal_id, permission, &self.metrics);
        match reason {
            DecisionReason::NoPrincipal | DecisionReason::PrincipalMismatch => {
                debug!("Denying {} for {}: {}", permission, principal_id, reason);
            }
            DecisionReason::UnknownRole { role_id } => {
                warn!(
                    "Role {} not found for principal {}, denying {}",
                    role_id, principal_id, permission
                );
            }
            _ => {
                debug!(
                    "Permission check: {} = {} for {} ({})",
                    permission,
                    reason.is_allowed(),
                    principal_id,
                    reason
                );
            }
        }

        if reason.is_fault() {
            self.metrics.record_fault();
        }
        state.cache.put(key, reason);
        self.metrics.record_decision(reason);
        Decision::computed(reason)
    }

    /// Permissions declared by the principal's role
    ///
    /// Empty when the principal or role cannot be resolved. The
    /// administrator bypass is not applied: an administrator gets only what
    /// its role declares. Use `is_administrator` for that question.
    pub fn permissions_of(&self, principal_id: &str) -> BTreeSet<Permission> {
        let state = self.state.lock();

        let Some(principal) = state.principal.as_ref().filter(|p| p.id.as_str() == principal_id)
        else {
            return BTreeSet::new();
        };

        state
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.get(principal.role_id))
            .map(|role| role.permissions.clone())
            .unwrap_or_default()
    }

    /// Whether `principal_id` is the current principal and holds role 1
    pub fn is_administrator(&self, principal_id: &str) -> bool {
        self.state
            .lock()
            .principal
            .as_ref()
            .is_some_and(|p| p.id.as_str() == principal_id && p.is_administrator())
    }

    /// Drop every cached decision. Idempotent.
    ///
    /// Leaves the principal and catalog references in place; call
    /// `initialize` when either of those changes.
    pub fn clear(&self) {
        self.state.lock().cache.clear();
        self.metrics.record_clear();
        debug!("Permission cache cleared");
    }

    /// Whether a non-empty catalog has been supplied
    pub fn is_ready(&self) -> bool {
        self.state.lock().catalog.is_some()
    }

    pub fn current_principal(&self) -> Option<Principal> {
        self.state.lock().principal.clone()
    }

    pub fn catalog(&self) -> Option<Arc<RoleCatalog>> {
        self.state.lock().catalog.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.lock().cache.stats()
    }

    pub fn metrics(&self) -> ResolverMetrics {
        self.metrics.snapshot()
    }
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new()
    }
}
