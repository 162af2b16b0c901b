//! Assemble an [`AccountScheduler`] and a [`GeofenceStore`] from [`AppConfig`].

use anyhow::Context;

use crate::config::{AccountSetConfig, AppConfig, GeofenceConfig};
use crate::core::{
    AccountScheduler, AccountSpec, AppResult, Credentials, GeofenceRegistry, GeofenceStore,
    SchedulerError,
};
use crate::util::clock::Clock;

/// Scheduler and geofence store built from one configuration.
pub struct Engine<C: Clock> {
    /// Account scheduler with every configured set registered.
    pub scheduler: AccountScheduler<C>,
    /// Geofence store holding the configured regions.
    pub geofence: GeofenceStore,
}

fn account_specs(set: &AccountSetConfig) -> Vec<AccountSpec> {
    set.accounts
        .iter()
        .map(|a| AccountSpec {
            identifier: a.identifier.clone(),
            credentials: Credentials::new(a.credentials.clone()),
            blocked: a.blocked,
        })
        .collect()
}

/// Register every configured set on a scheduler using `clock`.
pub fn build_scheduler<C: Clock>(
    cfg: &AppConfig,
    clock: C,
) -> Result<AccountScheduler<C>, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;

    let scheduler = AccountScheduler::with_clock(clock);
    for (name, set) in &cfg.sets {
        scheduler.create_set(name.clone(), set.max_speed_kmph, account_specs(set))?;
    }
    Ok(scheduler)
}

/// Load the configured region files into a new store.
pub fn build_geofence_store(cfg: &GeofenceConfig) -> Result<GeofenceStore, SchedulerError> {
    let registry = GeofenceRegistry::load_files(
        cfg.allowed_path.as_deref(),
        cfg.forbidden_path.as_deref(),
    )?;
    Ok(GeofenceStore::with_registry(registry))
}

/// Build both components, attaching context for startup diagnostics.
pub fn build_engine<C: Clock>(cfg: &AppConfig, clock: C) -> AppResult<Engine<C>> {
    let scheduler = build_scheduler(cfg, clock).context("building account scheduler")?;
    let geofence = build_geofence_store(&cfg.geofence).with_context(|| {
        format!(
            "loading geofences (allowed: {:?}, forbidden: {:?})",
            cfg.geofence.allowed_path, cfg.geofence.forbidden_path
        )
    })?;
    tracing::info!(
        "engine ready: {} account sets, {} geofences",
        cfg.sets.len(),
        geofence.snapshot().len()
    );
    Ok(Engine {
        scheduler,
        geofence,
    })
}
