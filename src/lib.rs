//! # Geolease
//!
//! Account leasing and geofencing for workers that perform location-bound
//! remote calls.
//!
//! The crate covers the two stateful pieces of such a system:
//!
//! - **Account scheduling**: an [`AccountScheduler`](core::AccountScheduler)
//!   hands out exclusive leases on pooled accounts. An account that was last
//!   used at one location cannot be leased for a distant one until enough real
//!   time has passed to travel there at the set's speed limit.
//! - **Geofencing**: a [`GeofenceStore`](core::GeofenceStore) loads named
//!   allowed and forbidden polygons and filters candidate coordinates before
//!   any remote call is made. Forbidden regions always win.
//!
//! Transport, request construction, persistence, and retry policy for the
//! remote calls live outside this crate and talk to it through the types
//! re-exported from [`core`].
//!
//! ## Leasing an account
//!
//! ```rust
//! use geolease::core::{AccountScheduler, AccountSpec, Coordinate, Credentials};
//!
//! let scheduler = AccountScheduler::new();
//! scheduler
//!     .create_set("scouts", 35.0, vec![AccountSpec::new("scout-1", Credentials::default())])
//!     .unwrap();
//!
//! let target = Coordinate::new(40.7128, -74.0060);
//! if let Some(lease) = scheduler.acquire("scouts", target).unwrap() {
//!     // ... remote work with lease.credentials() ...
//!     scheduler.release(&lease).unwrap();
//! }
//! ```
//!
//! ## Filtering by geofence
//!
//! ```rust
//! use geolease::core::{Coordinate, GeofenceStore};
//!
//! let store = GeofenceStore::new();
//! store
//!     .load(["[City]", "0,0", "0,10", "10,10", "10,0"], ["[Park]", "4,4", "4,6", "6,6", "6,4"])
//!     .unwrap();
//!
//! let kept = store.classify(&[Coordinate::new(2.0, 2.0), Coordinate::new(5.0, 5.0)]);
//! assert_eq!(kept, vec![Coordinate::new(2.0, 2.0)]);
//! ```
//!
//! For complete scenarios, see:
//! - `tests/account_scheduler_test.rs` - leasing, cooldown, and concurrency
//! - `tests/geofence_test.rs` - region loading and classification

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Geometry, geofencing, account scheduling, and audit.
pub mod core;
/// Configuration models for account sets and geofence sources.
pub mod config;
/// Builders to construct components from configuration.
pub mod builders;
/// Infrastructure adapters for geofence persistence.
pub mod infra;
/// Async worker helpers on tokio.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
