use crate::{
    FetchError,
    Fetcher,
    Identity,
    Snapshot,
    SnapshotStore,
};
use eyre::{
    Context as _,
    Result,
};
use instagram_exporter_config::FailurePolicy;
use std::time::Duration;
use strum::Display;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{
        self,
        Instant,
        MissedTickBehavior,
    },
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    #[default]
    Created,
    /// First fetch in progress, nothing to report yet.
    Warming,
    Steady,
    /// Terminal.
    Stopped,
}

/// Keeps a [`SnapshotStore`] fresh by running the [`Fetcher`] on a fixed
/// interval.
pub struct Scheduler {
    fetcher: Fetcher,
    identities: Vec<Identity>,
    interval: Duration,
    policy: FailurePolicy,
    store: SnapshotStore,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(fetcher: Fetcher, identities: Vec<Identity>, interval: Duration, policy: FailurePolicy) -> Self {
        let (state, _) = watch::channel(SchedulerState::Created);
        Self {
            fetcher,
            identities,
            interval,
            policy,
            store: SnapshotStore::new(),
            state,
        }
    }

    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }

    /// The latest snapshot, empty until the warm-up completed.
    pub fn report(&self) -> Snapshot {
        self.store.current_or_empty()
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Run the warm-up cycle and, once it succeeded, spawn the refresh loop.
    ///
    /// A failed warm-up is returned as is and leaves the store empty.
    pub async fn start(self, cancellation: CancellationToken) -> Result<SchedulerHandle, FetchError> {
        self.state.send_replace(SchedulerState::Warming);
        info!(identities = self.identities.len(), interval = ?self.interval, "warming up");

        match self.fetcher.fetch(&self.identities).await {
            Ok(snapshot) => self.store.install(snapshot),
            Err(err) => {
                error!(identity = %err.identity(), "warm-up failed: {err}");
                self.state.send_replace(SchedulerState::Stopped);
                return Err(err);
            }
        }
        self.state.send_replace(SchedulerState::Steady);

        let store = self.store.clone();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(cancellation));
        Ok(SchedulerHandle { store, state, task })
    }

    async fn run(self, cancellation: CancellationToken) -> Result<(), FetchError> {
        let mut ticks = time::interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            let fetched = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break Ok(()),

                fetched = async {
                    ticks.tick().await;
                    self.fetcher.fetch(&self.identities).await
                } => fetched,
            };

            match fetched {
                Ok(snapshot) => self.store.install(snapshot),
                Err(err) => match self.policy {
                    FailurePolicy::Exit => {
                        error!(identity = %err.identity(), "refresh failed, stopping: {err}");
                        break Err(err);
                    }
                    FailurePolicy::KeepLastGood => {
                        warn!(identity = %err.identity(), "refresh failed, keeping the last snapshot: {err}");
                    }
                },
            }
        };

        self.state.send_replace(SchedulerState::Stopped);
        debug!("refresh loop stopped");
        result
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// A running refresh loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    store: SnapshotStore,
    state: watch::Receiver<SchedulerState>,
    task: JoinHandle<Result<(), FetchError>>,
}

impl SchedulerHandle {
    pub fn report(&self) -> Snapshot {
        self.store.current_or_empty()
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Wait for the loop to end, either through cancellation or a fatal refresh error.
    pub async fn join(self) -> Result<()> {
        self.task.await.wrap_err("refresh loop panicked")??;
        Ok(())
    }
}
