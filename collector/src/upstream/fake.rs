use super::{
    FeedItem,
    FeedPage,
    Profile,
    Upstream,
    UpstreamError,
};
use crate::Identity;
use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use reqwest::StatusCode;
use std::sync::{
    atomic::{
        AtomicUsize,
        Ordering,
    },
    Arc,
    Mutex,
};
use tokio::sync::Semaphore;

pub(crate) fn item(id: &str, likes: u64, comments: u64) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        like_count: likes,
        comment_count: comments,
    }
}

#[derive(Debug, Clone)]
struct Account {
    name: String,
    counters: Result<(u64, u64, u64), StatusCode>,
    pages: Vec<Vec<FeedItem>>,
    failing_page: Option<(usize, StatusCode)>,
    stuck_page: Option<usize>,
}

/// In-memory upstream whose accounts can be changed between fetch cycles.
/// Page cursors are the page index as a string.
#[derive(Debug, Default)]
pub(crate) struct ScriptedUpstream {
    accounts: Mutex<Vec<Account>>,
    feed_requests: Mutex<Vec<Option<String>>>,
    profile_requests: AtomicUsize,
}

impl ScriptedUpstream {
    pub(crate) fn account(self, name: &str, counters: (u64, u64, u64), pages: Vec<Vec<FeedItem>>) -> Self {
        self.set_account(name, counters, pages);
        self
    }

    pub(crate) fn failing_profile(self, name: &str, status: StatusCode) -> Self {
        self.fail_profile(name, status);
        self
    }

    pub(crate) fn set_account(&self, name: &str, counters: (u64, u64, u64), pages: Vec<Vec<FeedItem>>) {
        self.upsert(Account {
            name: name.to_string(),
            counters: Ok(counters),
            pages,
            failing_page: None,
            stuck_page: None,
        });
    }

    pub(crate) fn fail_profile(&self, name: &str, status: StatusCode) {
        self.upsert(Account {
            name: name.to_string(),
            counters: Err(status),
            pages: Vec::new(),
            failing_page: None,
            stuck_page: None,
        });
    }

    /// Make the zero based `page` of `name`'s feed fail.
    pub(crate) fn fail_feed_page(&self, name: &str, page: usize, status: StatusCode) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|account| account.name == name) {
            account.failing_page = Some((page, status));
        }
    }

    /// Make the zero based `page` of `name`'s feed hand back its own cursor.
    pub(crate) fn repeat_cursor(&self, name: &str, page: usize) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|account| account.name == name) {
            account.stuck_page = Some(page);
        }
    }

    pub(crate) fn feed_requests(&self) -> Vec<Option<String>> {
        self.feed_requests.lock().unwrap().clone()
    }

    pub(crate) fn profile_requests(&self) -> usize {
        self.profile_requests.load(Ordering::SeqCst)
    }

    fn upsert(&self, account: Account) {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|existing| existing.name == account.name) {
            Some(existing) => *existing = account,
            None => accounts.push(account),
        }
    }
}

impl Upstream for ScriptedUpstream {
    fn profile<'a>(&'a self, identity: &'a Identity) -> BoxFuture<'a, Result<Profile, UpstreamError>> {
        self.profile_requests.fetch_add(1, Ordering::SeqCst);
        let url = format!("fake://users/{identity}");
        let accounts = self.accounts.lock().unwrap();
        let result = match accounts
            .iter()
            .position(|account| account.name == identity.as_str())
        {
            None => Err(UpstreamError::Status {
                url,
                status: StatusCode::NOT_FOUND,
            }),
            Some(index) => match accounts[index].counters {
                Ok((media_count, follower_count, following_count)) => Ok(Profile {
                    id: index as u64,
                    media_count,
                    follower_count,
                    following_count,
                }),
                Err(status) => Err(UpstreamError::Status { url, status }),
            },
        };
        futures::future::ready(result).boxed()
    }

    fn feed_page<'a>(
        &'a self,
        profile: &'a Profile,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FeedPage, UpstreamError>> {
        self.feed_requests.lock().unwrap().push(cursor.map(str::to_string));
        let page = cursor.and_then(|cursor| cursor.parse::<usize>().ok()).unwrap_or(0);
        let url = format!("fake://feed/{}?page={page}", profile.id);
        let accounts = self.accounts.lock().unwrap();
        let result = match accounts.get(profile.id as usize) {
            None => Err(UpstreamError::Status {
                url,
                status: StatusCode::NOT_FOUND,
            }),
            Some(Account {
                failing_page: Some((failing, status)),
                ..
            }) if *failing == page => Err(UpstreamError::Status { url, status: *status }),
            Some(account) => Ok(FeedPage {
                items: account.pages.get(page).cloned().unwrap_or_default(),
                next_cursor: match account.stuck_page {
                    Some(stuck) if stuck == page => Some(page.to_string()),
                    _ => (page + 1 < account.pages.len()).then(|| (page + 1).to_string()),
                },
            }),
        };
        futures::future::ready(result).boxed()
    }
}

/// Holds every profile lookup of the wrapped upstream until a permit is
/// released through [`Gated::open`].
pub(crate) struct Gated<U> {
    inner: Arc<U>,
    permits: Arc<Semaphore>,
}

impl<U> Gated<U> {
    pub(crate) fn new(inner: Arc<U>) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    pub(crate) fn open(&self, lookups: usize) {
        self.permits.add_permits(lookups);
    }
}

impl<U: Upstream> Upstream for Gated<U> {
    fn profile<'a>(&'a self, identity: &'a Identity) -> BoxFuture<'a, Result<Profile, UpstreamError>> {
        async move {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
            self.inner.profile(identity).await
        }
        .boxed()
    }

    fn feed_page<'a>(
        &'a self,
        profile: &'a Profile,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FeedPage, UpstreamError>> {
        self.inner.feed_page(profile, cursor)
    }
}
