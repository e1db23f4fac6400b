use super::{
    FeedItem,
    FeedPage,
    Profile,
    Upstream,
    UpstreamError,
};
use crate::{
    Identity,
    Session,
};
use eyre::{
    eyre,
    Context as _,
    Result,
};
use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use reqwest::{
    header::{
        HeaderMap,
        HeaderValue,
        AUTHORIZATION,
    },
    StatusCode,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::time::Duration;
use url::Url;

pub(crate) const USER_AGENT: &str = concat!("instagram-exporter/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct UserInfoResponse {
    user: Profile,
}

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<FeedItem>,
    #[serde(default)]
    more_available: bool,
    #[serde(default)]
    next_max_id: Option<String>,
}

impl From<FeedResponse> for FeedPage {
    fn from(response: FeedResponse) -> Self {
        Self {
            items: response.items,
            next_cursor: response.next_max_id.filter(|_| response.more_available),
        }
    }
}

/// [`Upstream`] backed by the private mobile API, authenticated with a
/// [`Session`].
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpUpstream {
    pub fn new(base_url: Url, session: &Session, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(eyre!("upstream URL {base_url} cannot be used as a base URL"));
        }

        let mut headers = HeaderMap::new();
        let mut authorization =
            HeaderValue::from_str(session.authorization()).context("session authorization is not a valid header")?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to build upstream HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// `segments` appended to the base URL, with the trailing slash the API expects.
    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base_url, segments)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        trace!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::Unauthorized {
                url: url.to_string(),
                status,
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| UpstreamError::Request {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| UpstreamError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

pub(crate) fn endpoint(base_url: &Url, segments: &[&str]) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments).push("");
    }
    url
}

impl Upstream for HttpUpstream {
    fn profile<'a>(&'a self, identity: &'a Identity) -> BoxFuture<'a, Result<Profile, UpstreamError>> {
        async move {
            let url = self.endpoint(&["api", "v1", "users", identity.as_str(), "usernameinfo"]);
            let response: UserInfoResponse = self.get(url).await?;
            Ok(response.user)
        }
        .boxed()
    }

    fn feed_page<'a>(
        &'a self,
        profile: &'a Profile,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FeedPage, UpstreamError>> {
        async move {
            let id = profile.id.to_string();
            let mut url = self.endpoint(&["api", "v1", "feed", "user", &id]);
            if let Some(cursor) = cursor {
                url.query_pairs_mut().append_pair("max_id", cursor);
            }
            let response: FeedResponse = self.get(url).await?;
            Ok(response.into())
        }
        .boxed()
    }
}
