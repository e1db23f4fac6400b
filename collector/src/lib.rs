//! Refreshes Instagram profile statistics in the background and exposes the
//! latest complete snapshot to Prometheus scrapes.
//!
//! - [`Fetcher`] walks every tracked identity once and builds a [`Snapshot`].
//! - [`Scheduler`] warms the [`SnapshotStore`] up, then refreshes it on a timer.
//! - [`SnapshotCollector`] translates whatever the store holds into gauges on
//!   each scrape without ever triggering a fetch.

#[macro_use]
extern crate tracing;

pub mod fetcher;
pub mod measurement;
pub mod metrics;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod upstream;

pub use fetcher::{
    FetchError,
    Fetcher,
};
pub use measurement::{
    Identity,
    Measurement,
    MetricDescriptor,
    MetricKind,
};
pub use metrics::SnapshotCollector;
pub use scheduler::{
    Scheduler,
    SchedulerHandle,
    SchedulerState,
};
pub use session::{
    login_client,
    resolve_session,
    Session,
    SessionStash,
    StartupError,
};
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
pub use upstream::{
    HttpUpstream,
    Upstream,
    UpstreamError,
};
