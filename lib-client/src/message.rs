use serde::Deserialize;
use url::Url;

/// Authorization server metadata from `<issuer>/.well-known/openid-configuration`
#[derive(Deserialize, Debug, Clone)]
pub struct DiscoveryDocument {
  pub issuer: String,
  pub token_endpoint: Url,
  pub userinfo_endpoint: Option<Url>,
  pub jwks_uri: Option<Url>,
}

/// Successful refresh grant response from the token endpoint
#[derive(Deserialize, Debug, Clone)]
pub struct TokenGrant {
  pub id_token: Option<String>,
  pub access_token: String,
  pub refresh_token: Option<String>,
  pub expires_in: i64,
}

/// OAuth2 error body returned by the token endpoint
#[derive(Deserialize, Debug)]
pub(super) struct OAuthErrorResponse {
  pub error: String,
  pub error_description: Option<String>,
}

/// The token endpoint answers with a grant on success and an OAuth error body
/// on rejection, both as JSON
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(super) enum TokenEndpointResponse {
  Granted(TokenGrant),
  Rejected(OAuthErrorResponse),
}
