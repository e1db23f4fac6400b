use crate::{
    upstream::{
        pages,
        Upstream,
        UpstreamError,
    },
    Identity,
    Measurement,
    Snapshot,
};
use futures::TryStreamExt as _;
use std::{
    sync::Arc,
    time::Instant,
};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("cannot fetch the profile of {identity}: {source}")]
    Profile {
        identity: Identity,
        #[source]
        source: UpstreamError,
    },
    #[error("cannot fetch page {page} of the feed of {identity}: {source}")]
    Feed {
        identity: Identity,
        /// One based.
        page: usize,
        #[source]
        source: UpstreamError,
    },
}

impl FetchError {
    pub fn identity(&self) -> &Identity {
        match self {
            FetchError::Profile { identity, .. } | FetchError::Feed { identity, .. } => identity,
        }
    }
}

/// Runs one fetch cycle over every tracked identity.
#[derive(Clone)]
pub struct Fetcher {
    upstream: Arc<dyn Upstream>,
}

impl Fetcher {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Build a complete [`Snapshot`] or fail. Identities are walked in order;
    /// for each one the three profile counters come first, then a like and a
    /// comment measurement per feed item, page after page.
    ///
    /// The first upstream failure aborts the cycle, nothing partial is returned.
    pub async fn fetch(&self, identities: &[Identity]) -> Result<Snapshot, FetchError> {
        let started = Instant::now();
        let mut measurements = Vec::new();
        for identity in identities {
            self.fetch_identity(identity, &mut measurements).await?;
        }
        info!(
            identities = identities.len(),
            measurements = measurements.len(),
            elapsed = ?started.elapsed(),
            "fetch cycle complete"
        );
        Ok(Snapshot::new(measurements))
    }

    async fn fetch_identity(&self, identity: &Identity, measurements: &mut Vec<Measurement>) -> Result<(), FetchError> {
        let profile = self
            .upstream
            .profile(identity)
            .await
            .map_err(|source| FetchError::Profile {
                identity: identity.clone(),
                source,
            })?;
        measurements.push(Measurement::media(identity, profile.media_count));
        measurements.push(Measurement::followers(identity, profile.follower_count));
        measurements.push(Measurement::following(identity, profile.following_count));

        let mut feed = std::pin::pin!(pages(self.upstream.as_ref(), &profile));
        let mut page = 0;
        let mut items = 0;
        loop {
            page += 1;
            let Some(batch) = feed.try_next().await.map_err(|source| FetchError::Feed {
                identity: identity.clone(),
                page,
                source,
            })?
            else {
                break;
            };
            items += batch.len();
            for item in batch {
                measurements.push(Measurement::likes(identity, &item.id, item.like_count));
                measurements.push(Measurement::comments(identity, &item.id, item.comment_count));
            }
        }

        debug!(%identity, pages = page - 1, items, "fetched identity");
        Ok(())
    }
}
