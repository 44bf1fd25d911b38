use crate::{constants::*, error::*, log::*, message::*, ClientConfig};
use async_trait::async_trait;
use libcommon::{Claim, ClaimSet};
use serde::de::DeserializeOwned;
use std::{
  marker::{Send, Sync},
  sync::Arc,
};
use tokio::sync::RwLock;
use url::Url;

/// Trait defining the http client used against the authorization server
#[async_trait]
pub trait TokenHttpClient {
  /// Send GET request and get JSON response
  async fn get_json<R>(&self, url: &Url) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync;
  /// Send GET request with a bearer access token and get JSON response
  async fn get_json_with_bearer<R>(&self, url: &Url, bearer_token: &str) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync;
  /// Send POST request with a form-encoded body and get JSON response.
  /// Implementations must also surface the JSON body of an OAuth error
  /// response (HTTP 400) rather than treating it as transport failure.
  async fn post_form<R>(&self, url: &Url, form: &[(&str, &str)]) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync;
}

/// Protocol client against the identity provider's discovery, token and
/// userinfo endpoints. Holds no session state; both operations are idempotent
/// network calls.
pub struct OidcClient<H>
where
  H: TokenHttpClient,
{
  pub(super) config: ClientConfig,
  pub(super) http_client: Arc<RwLock<H>>,
}

impl<H> OidcClient<H>
where
  H: TokenHttpClient,
{
  pub fn new(config: &ClientConfig, http_client: Arc<RwLock<H>>) -> Self {
    Self {
      config: config.clone(),
      http_client,
    }
  }

  /// Fetch the discovery document from the issuer's well-known location
  pub async fn fetch_discovery_document(&self) -> AuthResult<DiscoveryDocument> {
    let mut discovery_endpoint = self.config.issuer.clone();
    discovery_endpoint
      .path_segments_mut()
      .map_err(|_| AuthError::MalformedEndpoint)?
      .pop_if_empty()
      .extend(DISCOVERY_PATH_SEGMENTS);

    let client_lock = self.http_client.read().await;
    let disco = client_lock
      .get_json::<DiscoveryDocument>(&discovery_endpoint)
      .await
      .map_err(|e| AuthError::DiscoveryUnavailable(Box::new(e)))?;
    drop(client_lock);

    debug!("discovery document fetched: token endpoint {}", disco.token_endpoint);

    Ok(disco)
  }

  /// Perform the OAuth2 refresh-token grant against the token endpoint.
  /// A rejection by the authorization server (e.g. `invalid_grant`) is
  /// terminal for the presented refresh token.
  pub async fn refresh_access_token(&self, disco: &DiscoveryDocument, refresh_token: &str) -> AuthResult<TokenGrant> {
    let form = [
      ("grant_type", GRANT_TYPE_REFRESH_TOKEN),
      ("client_id", self.config.client_id.as_str()),
      ("client_secret", self.config.client_secret.as_str()),
      ("refresh_token", refresh_token),
    ];

    let client_lock = self.http_client.read().await;
    let res = client_lock
      .post_form::<TokenEndpointResponse>(&disco.token_endpoint, &form)
      .await?;
    drop(client_lock);

    match res {
      TokenEndpointResponse::Granted(grant) => {
        debug!("access token renewed via refresh grant");
        Ok(grant)
      }
      TokenEndpointResponse::Rejected(rejection) => {
        warn!("refresh grant rejected by authorization server: {}", rejection.error);
        Err(AuthError::GrantRejected {
          code: rejection.error,
          description: rejection.error_description,
        })
      }
    }
  }

  /// Fetch caller claims from the userinfo endpoint with a bearer access token
  pub async fn fetch_userinfo(&self, disco: &DiscoveryDocument, access_token: &str) -> AuthResult<ClaimSet> {
    let Some(userinfo_endpoint) = disco.userinfo_endpoint.as_ref() else {
      return Err(AuthError::NoUserinfoEndpoint);
    };

    let client_lock = self.http_client.read().await;
    let res = client_lock
      .get_json_with_bearer::<serde_json::Map<String, serde_json::Value>>(userinfo_endpoint, access_token)
      .await?;
    drop(client_lock);

    let claims = res
      .iter()
      .flat_map(|(claim_type, value)| match value {
        serde_json::Value::String(s) => vec![Claim::new(claim_type.as_str(), s.as_str())],
        serde_json::Value::Array(values) => values
          .iter()
          .filter_map(|v| v.as_str().map(|s| Claim::new(claim_type.as_str(), s)))
          .collect(),
        other => vec![Claim::new(claim_type.as_str(), other.to_string())],
      })
      .collect::<ClaimSet>();

    Ok(claims)
  }
}
