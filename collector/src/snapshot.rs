use crate::Measurement;
use chrono::{
    DateTime,
    Utc,
};
use std::{
    ops::Deref,
    sync::Arc,
};

/// The complete set of measurements from one fetch cycle. Cloning shares the
/// underlying measurements; a snapshot is never modified after creation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    measurements: Arc<Vec<Measurement>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self {
            measurements: Arc::new(measurements),
            fetched_at: Some(Utc::now()),
        }
    }

    /// What readers see before the first cycle completed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// When the cycle that produced this snapshot completed. `None` for [`Snapshot::empty`].
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }
}

impl Deref for Snapshot {
    type Target = [Measurement];

    fn deref(&self) -> &Self::Target {
        &self.measurements
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.measurements == other.measurements
    }
}
