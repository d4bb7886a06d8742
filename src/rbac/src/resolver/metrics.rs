//! Resolver counters and Prometheus text export

use std::sync::atomic::{AtomicU64, Ordering};

use super::decision::DecisionReason;

/// Snapshot of resolver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverMetrics {
    /// Total permission checks
    pub checks: u64,

    /// Checks answered from the decision cache
    pub cache_hits: u64,

    /// Checks that had to be computed
    pub cache_misses: u64,

    /// Catalog lookups performed while computing a decision
    pub role_lookups: u64,

    pub allowed: u64,
    pub denied: u64,

    /// Computed denials caused by a principal referencing a missing role.
    /// Repeat queries served from the cache do not count again.
    pub fault_denials: u64,

    pub initializations: u64,
    pub skipped_initializations: u64,
    pub clears: u64,
}

impl ResolverMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed + self.denied;
        if total == 0 {
            0.0
        } else {
            self.allowed as f64 / total as f64
        }
    }

    /// Render in the Prometheus text exposition format
    pub fn export_prometheus(&self) -> String {
        format!(
            r#"# HELP rbac_checks_total Total number of permission checks
# TYPE rbac_checks_total counter
rbac_checks_total {}

# HELP rbac_cache_hits_total Checks answered from the decision cache
# TYPE rbac_cache_hits_total counter
rbac_cache_hits_total {}

# HELP rbac_cache_misses_total Checks computed from the role catalog
# TYPE rbac_cache_misses_total counter
rbac_cache_misses_total {}

# HELP rbac_role_lookups_total Role catalog lookups
# TYPE rbac_role_lookups_total counter
rbac_role_lookups_total {}

# HELP rbac_decisions_total Permission decisions by outcome
# TYPE rbac_decisions_total counter
rbac_decisions_total{{outcome="allow"}} {}
rbac_decisions_total{{outcome="deny"}} {}

# HELP rbac_fault_denials_total Computed denials caused by unresolvable roles
# TYPE rbac_fault_denials_total counter
rbac_fault_denials_total {}

# HELP rbac_initializations_total Resolver initializations
# TYPE rbac_initializations_total counter
rbac_initializations_total{{result="applied"}} {}
rbac_initializations_total{{result="skipped"}} {}

# HELP rbac_cache_clears_total Explicit cache clears
# TYPE rbac_cache_clears_total counter
rbac_cache_clears_total {}
"#,
            self.checks,
            self.cache_hits,
            self.cache_misses,
            self.role_lookups,
            self.allowed,
            self.denied,
            self.fault_denials,
            self.initializations,
            self.skipped_initializations,
            self.clears,
        )
    }
}

/// Lock-free counter set owned by a resolver
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    checks: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    role_lookups: AtomicU64,
    allowed: AtomicU64,
    denied: AtomicU64,
    fault_denials: AtomicU64,
    initializations: AtomicU64,
    skipped_initializations: AtomicU64,
    clears: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_role_lookup(&self) {
        self.role_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decision(&self, reason: DecisionReason) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if reason.is_allowed() {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Counted once per computed decision, never on cache hits
    pub(crate) fn record_fault(&self) {
        self.fault_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_initialization(&self, applied: bool) {
        if applied {
            self.initializations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.skipped_initializations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ResolverMetrics {
        ResolverMetrics {
            checks: self.checks.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            role_lookups: self.role_lookups.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            fault_denials: self.fault_denials.load(Ordering::Relaxed),
            initializations: self.initializations.load(Ordering::Relaxed),
            skipped_initializations: self.skipped_initializations.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}
