//! The data source the [`Fetcher`](crate::Fetcher) reads from.

use crate::Identity;
use futures::{
    future::BoxFuture,
    stream,
    Stream,
};
use reqwest::StatusCode;
use serde::Deserialize;

#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use http::HttpUpstream;
pub(crate) use http::{
    endpoint,
    USER_AGENT,
};

/// Profile level counters of one account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Numeric account id, needed to page through the feed.
    #[serde(rename = "pk")]
    pub id: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// One post of an account's feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default)]
    pub like_count: u64,
    /// Absent when comments are disabled on the post.
    #[serde(default)]
    pub comment_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Cursor of the following page, `None` on the last page.
    pub next_cursor: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} rejected the session ({status})")]
    Unauthorized { url: String, status: StatusCode },
    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },
    #[error("cannot decode the response of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("feed of account {profile} returned cursor {cursor:?} twice in a row")]
    RepeatedCursor { profile: u64, cursor: String },
}

/// Read access to profiles and feeds.
///
/// Futures are boxed and `Send` so a fetch cycle can run on a spawned task.
pub trait Upstream: Send + Sync {
    fn profile<'a>(&'a self, identity: &'a Identity) -> BoxFuture<'a, Result<Profile, UpstreamError>>;

    /// One page of the feed. `cursor` is `None` for the first page and the
    /// previous page's [`FeedPage::next_cursor`] afterwards.
    fn feed_page<'a>(
        &'a self,
        profile: &'a Profile,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FeedPage, UpstreamError>>;
}

enum Cursor {
    First,
    Next(String),
    Done,
}

/// The feed of `profile` as a lazy sequence of pages. Each page is requested
/// only when the previous one was consumed; the stream ends after the page
/// without a next cursor. A page pointing back to its own cursor fails with
/// [`UpstreamError::RepeatedCursor`] instead of looping forever.
pub fn pages<'a>(
    upstream: &'a dyn Upstream,
    profile: &'a Profile,
) -> impl Stream<Item = Result<Vec<FeedItem>, UpstreamError>> + Send + 'a {
    stream::try_unfold(Cursor::First, move |cursor| async move {
        let cursor = match cursor {
            Cursor::First => None,
            Cursor::Next(cursor) => Some(cursor),
            Cursor::Done => return Ok(None),
        };
        let page = upstream.feed_page(profile, cursor.as_deref()).await?;
        let next = match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Err(UpstreamError::RepeatedCursor {
                    profile: profile.id,
                    cursor: next,
                });
            }
            Some(next) => Cursor::Next(next),
            None => Cursor::Done,
        };
        Ok(Some((page.items, next)))
    })
}
