use crate::{constants::HTTP_TIMEOUT_SECS, error::*, oidc::TokenHttpClient};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// `TokenHttpClient` backed by reqwest with a bounded per-request timeout
#[derive(Default)]
pub struct ReqwestTokenHttpClient {
  inner: Client,
}

impl ReqwestTokenHttpClient {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl TokenHttpClient for ReqwestTokenHttpClient {
  async fn get_json<R>(&self, url: &Url) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync,
  {
    let res = self
      .inner
      .get(url.to_owned())
      .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
      .send()
      .await?;
    if !res.status().is_success() {
      return Err(AuthError::HttpClientErrorResponse {
        code: res.status().as_u16(),
      });
    }
    let json_res = res.json::<R>().await?;
    Ok(json_res)
  }

  async fn get_json_with_bearer<R>(&self, url: &Url, bearer_token: &str) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync,
  {
    let authorization_header = format!("Bearer {bearer_token}");

    let res = self
      .inner
      .get(url.to_owned())
      .header(reqwest::header::AUTHORIZATION, authorization_header)
      .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
      .send()
      .await?;
    if !res.status().is_success() {
      return Err(AuthError::HttpClientErrorResponse {
        code: res.status().as_u16(),
      });
    }
    let json_res = res.json::<R>().await?;
    Ok(json_res)
  }

  async fn post_form<R>(&self, url: &Url, form: &[(&str, &str)]) -> AuthResult<R>
  where
    R: DeserializeOwned + Send + Sync,
  {
    let res = self
      .inner
      .post(url.to_owned())
      .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
      .form(form)
      .send()
      .await?;
    // the token endpoint carries an OAuth error body on 400; let the caller
    // distinguish grant rejection from transport failure
    let status = res.status();
    if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
      return Err(AuthError::HttpClientErrorResponse { code: status.as_u16() });
    }
    let json_res = res.json::<R>().await?;
    Ok(json_res)
  }
}
