mod constants;
mod error;
mod log;
mod manager;
mod message;
mod oidc;
mod store;

#[cfg(feature = "reqwest")]
mod http;

use libcommon::RENEWAL_SKEW_SECS;
use url::Url;

pub use error::{AuthError, AuthResult};
pub use manager::TokenManager;
pub use message::{DiscoveryDocument, TokenGrant};
pub use oidc::{OidcClient, TokenHttpClient};
pub use store::{MemorySessionStore, SessionStore};

#[cfg(feature = "reqwest")]
pub use http::ReqwestTokenHttpClient;

pub mod identity {
  pub use libcommon::*;
}

/// Static per-deployment client registration against the identity provider
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
  pub issuer: Url,
  pub client_id: String,
  pub client_secret: String,
  /// Seconds subtracted from the access token expiry when judging freshness
  pub renewal_skew_secs: i64,
}

impl ClientConfig {
  pub fn new(issuer: Url, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
    Self {
      issuer,
      client_id: client_id.into(),
      client_secret: client_secret.into(),
      renewal_skew_secs: RENEWAL_SKEW_SECS,
    }
  }
}

// client_secret must never reach logs
impl std::fmt::Debug for ClientConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ClientConfig")
      .field("issuer", &self.issuer.as_str())
      .field("client_id", &self.client_id)
      .field("client_secret", &"<redacted>")
      .field("renewal_skew_secs", &self.renewal_skew_secs)
      .finish()
  }
}
