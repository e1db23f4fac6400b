use crate::upstream::{
    endpoint,
    UpstreamError,
    USER_AGENT,
};
use chrono::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::PathBuf,
    time::Duration,
};
use url::Url;

/// Response header carrying the authorization of a fresh login.
const AUTHORIZATION_HEADER: &str = "ig-set-authorization";

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("no stored session at {0:?} and no login/password configured")]
    MissingCredentials(PathBuf),
    #[error("cannot log in as {login}: {source}")]
    Login {
        login: String,
        #[source]
        source: UpstreamError,
    },
    #[error("login as {login} succeeded but the response carried no authorization")]
    MissingAuthorization { login: String },
    #[error("cannot store the session at {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An authenticated upstream session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub username: String,
    authorization: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl ToString, authorization: impl ToString) -> Self {
        Self {
            username: username.to_string(),
            authorization: authorization.to_string(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn authorization(&self) -> &str {
        &self.authorization
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// A [`Session`] persisted as JSON so restarts don't log in again.
#[derive(Clone, Debug)]
pub struct SessionStash {
    file: PathBuf,
}

impl SessionStash {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// The stored session, `None` if there is none or it cannot be read.
    pub fn load(&self) -> Option<Session> {
        let file = &self.file;
        file.exists()
            .then(|| {
                std::fs::File::open(file)
                    .ok()
                    .and_then(|f| serde_json::from_reader(f).ok())
            })
            .flatten()
            .inspect(|session: &Session| {
                debug!(?file, username = session.username, "loaded session");
            })
            .or_else(|| {
                debug!(?file, "no stored session found");
                None
            })
    }

    pub fn save(&self, session: &Session) -> Result<(), StartupError> {
        let persist = |source| StartupError::Persist {
            path: self.file.clone(),
            source,
        };
        if let Some(dir) = self.file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(persist)?;
        }
        let content = serde_json::to_vec_pretty(session).map_err(|err| persist(err.into()))?;
        std::fs::write(&self.file, content).map_err(persist)?;
        debug!(file = ?self.file, "saved session");
        Ok(())
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// Client for the unauthenticated login request.
pub fn login_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).timeout(timeout).build()
}

/// Use the stored session if there is one, otherwise log in with
/// `credentials` and store the new session.
pub async fn resolve_session(
    client: &reqwest::Client,
    base_url: &Url,
    stash: &SessionStash,
    credentials: Option<(&str, &str)>,
) -> Result<Session, StartupError> {
    if let Some(session) = stash.load() {
        return Ok(session);
    }

    let (login, password) = credentials.ok_or_else(|| StartupError::MissingCredentials(stash.file.clone()))?;
    debug!(login, "trying to log in with the provided credentials");
    let session = log_in(client, base_url, login, password).await?;
    stash.save(&session)?;
    info!(login, "login success");
    Ok(session)
}

async fn log_in(client: &reqwest::Client, base_url: &Url, login: &str, password: &str) -> Result<Session, StartupError> {
    let url = endpoint(base_url, &["api", "v1", "accounts", "login"]);
    let failed = |source| StartupError::Login {
        login: login.to_string(),
        source,
    };

    let response = client
        .post(url.clone())
        .form(&[("username", login), ("password", password)])
        .send()
        .await
        .map_err(|source| {
            failed(UpstreamError::Request {
                url: url.to_string(),
                source,
            })
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(failed(UpstreamError::Unauthorized {
            url: url.to_string(),
            status,
        }));
    }
    if !status.is_success() {
        return Err(failed(UpstreamError::Status {
            url: url.to_string(),
            status,
        }));
    }

    let authorization = response
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StartupError::MissingAuthorization {
            login: login.to_string(),
        })?;

    Ok(Session::new(login, authorization))
}
