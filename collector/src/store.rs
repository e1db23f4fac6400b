use crate::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// Holds the latest installed [`Snapshot`].
///
/// Cloning yields another handle to the same store. Readers only hold the
/// inner lock for the duration of an `Arc` clone, so they neither wait on each
/// other nor on a fetch in progress, and always see one snapshot in full.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    sender: Arc<watch::Sender<Option<Snapshot>>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current snapshot. The previous one is dropped once its last
    /// reader lets go of it.
    pub fn install(&self, snapshot: Snapshot) {
        let measurements = snapshot.len();
        let previous = self.sender.send_replace(Some(snapshot));
        trace!(
            measurements,
            previous = previous.as_ref().map(|snapshot| snapshot.len()),
            "installed snapshot"
        );
    }

    /// The latest installed snapshot, `None` before the first install.
    pub fn current(&self) -> Option<Snapshot> {
        self.sender.borrow().clone()
    }

    pub fn current_or_empty(&self) -> Snapshot {
        self.current().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Identity,
        Measurement,
    };
    use std::{
        sync::atomic::{
            AtomicBool,
            Ordering,
        },
        thread,
    };

    fn cycle(generation: u64, size: usize) -> Snapshot {
        let identity = Identity::from("alice");
        Snapshot::new(
            (0..size)
                .map(|item| Measurement::likes(&identity, &item.to_string(), generation))
                .collect(),
        )
    }

    #[test]
    fn empty_before_first_install() {
        let store = SnapshotStore::new();
        assert!(store.current().is_none());
        let snapshot = store.current_or_empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.fetched_at().is_none());
    }

    #[test]
    fn install_replaces_wholesale() {
        let store = SnapshotStore::new();
        store.install(cycle(1, 3));
        let first = store.current().unwrap();
        store.install(cycle(2, 1));

        assert_eq!(store.current().unwrap(), cycle(2, 1));
        // Readers holding the old snapshot keep it intact.
        assert_eq!(first, cycle(1, 3));
    }

    #[test]
    fn clones_share_state() {
        let store = SnapshotStore::new();
        let reader = store.clone();
        store.install(cycle(7, 2));
        assert_eq!(reader.current_or_empty().len(), 2);
    }

    #[test]
    fn concurrent_readers_never_see_a_mixed_snapshot() {
        const GENERATIONS: u64 = 500;
        const READERS: usize = 4;

        let store = SnapshotStore::new();
        let done = Arc::new(AtomicBool::new(false));

        let readers = (0..READERS)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut observed = 0usize;
                    while !done.load(Ordering::Acquire) {
                        let snapshot = store.current_or_empty();
                        if let Some(first) = snapshot.first() {
                            let generation = first.value();
                            assert_eq!(snapshot.len(), generation as usize % 7 + 1);
                            assert!(snapshot.iter().all(|measurement| measurement.value() == generation));
                            observed += 1;
                        }
                    }
                    observed
                })
            })
            .collect::<Vec<_>>();

        for generation in 1..=GENERATIONS {
            store.install(cycle(generation, generation as usize % 7 + 1));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.current().unwrap(), cycle(GENERATIONS, GENERATIONS as usize % 7 + 1));
    }
}
