//! Verifying user claims by fetching the published message.
//!
//! Network access goes through a [`Requestor`]. Each check is bounded by a
//! timeout, and dropping the returned future cancels the fetch.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sigkeys_core::{Sigchain, User};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Failure fetching a URL.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Nothing is published at the URL.
    #[error("not found")]
    NotFound,

    /// The server answered with an error status.
    #[error("http status {0}")]
    Status(u16),

    /// Connection or transport failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fetches the content published at a URL.
#[async_trait]
pub trait Requestor: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, RequestError>;
}

/// Requestor serving content from memory.
#[derive(Default)]
pub struct MemoryRequestor {
    responses: RwLock<HashMap<String, Vec<u8>>>,
    delay: Option<Duration>,
}

impl MemoryRequestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, e.g. to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `body` at `url`.
    pub async fn set_response(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.write().await.insert(url.into(), body.into());
    }
}

#[async_trait]
impl Requestor for MemoryRequestor {
    async fn get(&self, url: &str) -> Result<Vec<u8>, RequestError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or(RequestError::NotFound)
    }
}

/// Outcome of checking a user claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStatus {
    /// The published message proves the claim.
    Ok,
    /// The URL could not be fetched.
    ConnFailure,
    /// The fetch did not finish in time.
    Timeout,
    /// The URL has no message.
    ContentNotFound,
    /// The URL has a message that does not prove the claim.
    ContentInvalid,
    /// The claim's statement has been revoked.
    StatementRevoked,
    /// The claim itself is malformed or not in the sigchain.
    Failure,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Ok => "ok",
            UserStatus::ConnFailure => "connection-fail",
            UserStatus::Timeout => "timeout",
            UserStatus::ContentNotFound => "content-not-found",
            UserStatus::ContentInvalid => "content-invalid",
            UserStatus::StatementRevoked => "statement-revoked",
            UserStatus::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// Result of checking a user claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserResult {
    pub user: User,
    pub status: UserStatus,
    /// Why the check failed, if it did.
    pub err: Option<String>,
    /// When the check ran (Unix ms).
    pub timestamp: i64,
    /// When the claim was last verified (Unix ms), 0 if never.
    pub verified_at: i64,
}

impl UserResult {
    pub fn is_ok(&self) -> bool {
        self.status == UserStatus::Ok
    }
}

/// Check a user claim against its sigchain and the message published at its
/// URL.
pub async fn verify_user(
    requestor: &dyn Requestor,
    sc: &Sigchain,
    user: &User,
    timeout: Duration,
    now: i64,
) -> UserResult {
    let (status, err) = check_user(requestor, sc, user, timeout).await;
    match status {
        UserStatus::Ok => debug!(kid = %user.kid, service = %user.service, name = %user.name, "user verified"),
        _ => warn!(kid = %user.kid, service = %user.service, name = %user.name, %status, err = err.as_deref().unwrap_or(""), "user not verified"),
    }
    UserResult {
        user: user.clone(),
        status,
        err,
        timestamp: now,
        verified_at: if status == UserStatus::Ok { now } else { 0 },
    }
}

async fn check_user(
    requestor: &dyn Requestor,
    sc: &Sigchain,
    user: &User,
    timeout: Duration,
) -> (UserStatus, Option<String>) {
    if user.kid != *sc.kid() {
        return (UserStatus::Failure, Some(format!("user kid {} not in sigchain {}", user.kid, sc.kid())));
    }
    match sc.get(user.seq).map(User::from_statement) {
        Some(Ok(ref found)) if found == user => {}
        Some(Err(e)) => return (UserStatus::Failure, Some(e.to_string())),
        _ => return (UserStatus::Failure, Some(format!("user statement not found at seq {}", user.seq))),
    }
    if sc.is_revoked(user.seq) {
        return (UserStatus::StatementRevoked, None);
    }

    let body = match tokio::time::timeout(timeout, requestor.get(&user.url)).await {
        Err(_) => return (UserStatus::Timeout, Some(format!("no response after {timeout:?}"))),
        Ok(Err(RequestError::NotFound)) => return (UserStatus::ContentNotFound, None),
        Ok(Err(e)) => return (UserStatus::ConnFailure, Some(e.to_string())),
        Ok(Ok(body)) => body,
    };

    match user.find_and_verify(&String::from_utf8_lossy(&body)) {
        Ok(Some(_)) => (UserStatus::Ok, None),
        Ok(None) => (UserStatus::ContentNotFound, None),
        Err(e) => (UserStatus::ContentInvalid, Some(e.to_string())),
    }
}
