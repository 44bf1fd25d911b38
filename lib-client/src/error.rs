use std::sync::Arc;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Describes things that can go wrong in the token lifecycle
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("No session token record for the given session id")]
  SessionNotFound,

  #[error("Session cannot self-renew, full sign-in flow required")]
  ReauthenticationRequired,

  /// The cause is behind an `Arc` so that every caller queued on the same
  /// renewal flight receives the same failure
  #[error("Failed to renew access token: {0}")]
  RefreshFailed(Arc<AuthError>),

  #[error("Failed to fetch discovery document: {0}")]
  DiscoveryUnavailable(#[source] Box<AuthError>),

  #[error("Authorization server rejected the refresh grant: {code}")]
  GrantRejected {
    code: String,
    description: Option<String>,
  },

  #[error("Failed to build authorization server endpoint url")]
  MalformedEndpoint,

  #[error("No userinfo endpoint in discovery document")]
  NoUserinfoEndpoint,

  #[error("TokenHttpClient response is not 20x: {code}")]
  HttpClientErrorResponse { code: u16 },

  #[cfg(feature = "reqwest")]
  #[error(transparent)]
  ReqwestClientError(#[from] reqwest::Error),

  // black hole
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}
