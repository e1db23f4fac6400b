use crate::{
    MetricKind,
    SnapshotStore,
};
use prometheus::{
    core::{
        Collector,
        Desc,
    },
    proto::MetricFamily,
    GaugeVec,
    Opts,
};
use strum::IntoEnumIterator as _;

/// Exposes the current snapshot of a [`SnapshotStore`] as gauges.
///
/// Every scrape rebuilds the families from the snapshot installed at that
/// moment, so measurements dropped by a later cycle disappear from the output
/// instead of lingering with their last value.
pub struct SnapshotCollector {
    namespace: String,
    store: SnapshotStore,
    /// One template per [`MetricKind`], only used for descriptions.
    templates: Vec<GaugeVec>,
}

impl SnapshotCollector {
    pub fn new(namespace: impl Into<String>, store: SnapshotStore) -> prometheus::Result<Self> {
        let namespace = namespace.into();
        let templates = families(&namespace)?;
        Ok(Self {
            namespace,
            store,
            templates,
        })
    }
}

/// A fresh gauge family per kind, indexed by `MetricKind as usize`.
fn families(namespace: &str) -> prometheus::Result<Vec<GaugeVec>> {
    MetricKind::iter()
        .map(|kind| {
            let descriptor = kind.descriptor();
            let mut opts = Opts::new(descriptor.name, descriptor.help);
            if !namespace.is_empty() {
                opts = opts.namespace(namespace);
            }
            GaugeVec::new(opts, descriptor.label_names)
        })
        .collect()
}

impl Collector for SnapshotCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.templates.iter().flat_map(|family| family.desc()).collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = self.store.current_or_empty();
        let families = match families(&self.namespace) {
            Ok(families) => families,
            Err(err) => {
                error!("cannot build metric families: {err}");
                return Vec::new();
            }
        };

        for measurement in snapshot.iter() {
            let labels = measurement.labels().iter().map(String::as_str).collect::<Vec<_>>();
            match families[measurement.kind() as usize].get_metric_with_label_values(&labels) {
                Ok(gauge) => gauge.set(measurement.value()),
                Err(err) => warn!(kind = ?measurement.kind(), ?labels, "skipping measurement: {err}"),
            }
        }

        debug!(
            measurements = snapshot.len(),
            fetched_at = ?snapshot.fetched_at(),
            "collected snapshot"
        );
        families
            .iter()
            .flat_map(|family| family.collect())
            .filter(|family| !family.get_metric().is_empty())
            .collect()
    }
}
