use crate::{claim::ClaimSet, constants::RENEWAL_SKEW_SECS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token triple plus claims for one authenticated browser session. Created at
/// sign-in completion and replaced wholesale on each successful renewal: the
/// three token fields and `expires_at` always change together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenRecord {
  /// Opaque id token, informational only, never used for authorization
  pub id_token: String,
  /// Bearer credential presented to the resource server
  pub access_token: String,
  /// Present only if offline access was granted. Sessions without it cannot
  /// self-renew and must go through the full sign-in flow again.
  pub refresh_token: Option<String>,
  /// Absolute expiry of `access_token`
  pub expires_at: DateTime<Utc>,
  pub claims: ClaimSet,
}

impl SessionTokenRecord {
  /// True iff the access token may still be presented at `now`, i.e.
  /// `now < expires_at - skew`.
  pub fn is_fresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
    now < self.expires_at - skew
  }

  /// Freshness under the default renewal skew
  pub fn is_fresh_now(&self) -> bool {
    self.is_fresh(Utc::now(), Duration::seconds(RENEWAL_SKEW_SECS))
  }

  /// Copy of this record with the refresh token dropped. Used when a refresh
  /// grant is definitively rejected: the rotated refresh token must not be
  /// presented again.
  pub fn without_refresh_token(&self) -> Self {
    Self {
      refresh_token: None,
      ..self.clone()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(expires_at: DateTime<Utc>) -> SessionTokenRecord {
    SessionTokenRecord {
      id_token: "idt".to_string(),
      access_token: "at".to_string(),
      refresh_token: Some("rt".to_string()),
      expires_at,
      claims: ClaimSet::new(),
    }
  }

  #[test]
  fn token_is_stale_within_the_renewal_skew() {
    let now = Utc::now();
    let skew = Duration::seconds(RENEWAL_SKEW_SECS);

    // plenty of lifetime left
    assert!(record(now + Duration::seconds(120)).is_fresh(now, skew));
    // expires within the skew window: treat as stale
    assert!(!record(now + Duration::seconds(30)).is_fresh(now, skew));
    // exactly at the margin is stale, not fresh
    assert!(!record(now + Duration::seconds(RENEWAL_SKEW_SECS)).is_fresh(now, skew));
    // already expired
    assert!(!record(now - Duration::seconds(10)).is_fresh(now, skew));
  }

  #[test]
  fn downgraded_record_keeps_everything_but_the_refresh_token() {
    let now = Utc::now();
    let downgraded = record(now).without_refresh_token();
    assert_eq!(downgraded.access_token, "at");
    assert_eq!(downgraded.expires_at, now);
    assert!(downgraded.refresh_token.is_none());
  }
}
