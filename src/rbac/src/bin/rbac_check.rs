//! FleetDesk RBAC - permission check CLI
//!
//! Loads a directory snapshot, signs in as the given session and reports
//! the resolver's decision for each requested permission.

use anyhow::{Context, Result};
use clap::Parser;
use fleetdesk_rbac::{
    default_navigation, visible_entries, DirectorySnapshot, InMemoryDirectory, PermissionResolver,
    RbacConfig, RbacLoader, Session,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "rbac-check")]
#[command(about = "Resolve FleetDesk permissions for a session")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "FLEETDESK_RBAC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory snapshot (JSON with `users` and `roles`); seed groups if omitted
    #[arg(short, long, env = "FLEETDESK_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Session email
    #[arg(short, long)]
    email: String,

    /// Session user id, used when no user row matches the email
    #[arg(long)]
    user_id: Option<String>,

    /// Print the permissions declared by the principal's role
    #[arg(long)]
    list: bool,

    /// Print the navigation entries the principal may see
    #[arg(long)]
    nav: bool,

    /// Print resolver metrics in Prometheus format
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Permissions to check (e.g. trips:create)
    permissions: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RbacConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RbacConfig::default(),
    };

    let log_level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},fleetdesk_rbac={}", log_level, log_level).into()),
        )
        .with_target(config.logging.with_target)
        .with_writer(std::io::stderr)
        .init();

    let snapshot = match &cli.directory {
        Some(path) => DirectorySnapshot::from_json_file(path)
            .await
            .with_context(|| format!("reading directory snapshot {}", path.display()))?,
        None => DirectorySnapshot::seeded(),
    };

    let resolver = Arc::new(PermissionResolver::new());
    let loader = RbacLoader::new(
        Arc::new(InMemoryDirectory::from_snapshot(snapshot)),
        Arc::clone(&resolver),
        config.loader.clone(),
    );

    let mut session = Session::new(cli.email.clone());
    if let Some(user_id) = &cli.user_id {
        session = session.with_user_id(user_id.clone());
    }

    let report = loader
        .on_session(Some(&session))
        .await
        .context("loading users and roles")?;

    info!(
        "Loaded {} users, {} roles ({} rejected)",
        report.users_loaded, report.roles_loaded, report.roles_rejected
    );

    let principal_id = report
        .principal_id
        .as_ref()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();

    println!(
        "principal {}{}",
        principal_id,
        if report.synthesized { " (fallback)" } else { "" }
    );

    for permission in &cli.permissions {
        let decision = resolver.check_detailed(&principal_id, permission);
        println!(
            "{:<24} {} ({})",
            permission,
            if decision.allowed { "ALLOW" } else { "DENY" },
            decision.reason
        );
    }

    if cli.list {
        for permission in resolver.permissions_of(&principal_id) {
            println!("role grants {}", permission);
        }
    }

    if cli.nav {
        let entries = if config.navigation.is_empty() {
            default_navigation()
        } else {
            config.navigation.clone()
        };
        for entry in visible_entries(&resolver, Some(&principal_id), &entries) {
            println!("nav {:<14} {}", entry.key, entry.route);
        }
    }

    if cli.metrics {
        print!("{}", resolver.metrics().export_prometheus());
    }

    Ok(())
}
