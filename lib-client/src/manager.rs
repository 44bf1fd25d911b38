use crate::{
  error::*,
  log::*,
  oidc::{OidcClient, TokenHttpClient},
  store::SessionStore,
  ClientConfig,
};
use chrono::{Duration, Utc};
use libcommon::{ClaimSet, SessionTokenRecord};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

/// One in-flight renewal exchange for a session. The flight leader holds the
/// `outcome` lock for the duration of the exchange and publishes the result
/// into the slot; callers queued behind it read the shared outcome instead of
/// driving an exchange of their own.
#[derive(Default)]
struct RenewalFlight {
  outcome: Mutex<Option<FlightOutcome>>,
}

/// Shared result of one renewal exchange. Failures are shared verbatim: a
/// waiter must not re-present a refresh token the flight may already have
/// spent.
#[derive(Debug, Clone)]
enum FlightOutcome {
  Renewed(String),
  ReauthenticationRequired,
  Failed(Arc<AuthError>),
}

impl FlightOutcome {
  fn into_result(self) -> AuthResult<String> {
    match self {
      FlightOutcome::Renewed(access_token) => Ok(access_token),
      FlightOutcome::ReauthenticationRequired => Err(AuthError::ReauthenticationRequired),
      FlightOutcome::Failed(cause) => Err(AuthError::RefreshFailed(cause)),
    }
  }
}

/// Keeps a per-session bearer token valid across requests, renewing it
/// through the refresh grant when it nears expiry. Renewal for a given
/// session is single-flight: concurrent callers on one expiring session
/// share a single exchange and all observe its outcome, success or failure
/// alike. Refresh tokens commonly rotate on use, so a second exchange with
/// the same token would be rejected by the authorization server.
pub struct TokenManager<H, S>
where
  H: TokenHttpClient,
  S: SessionStore,
{
  oidc: OidcClient<H>,
  store: Arc<S>,
  renewal_skew: Duration,
  /// Renewal exchanges currently in flight, keyed by session id. Entries are
  /// retired when their flight completes.
  renewal_flights: Mutex<HashMap<String, Arc<RenewalFlight>>>,
}

impl<H, S> TokenManager<H, S>
where
  H: TokenHttpClient,
  S: SessionStore,
{
  pub fn new(config: &ClientConfig, http_client: Arc<RwLock<H>>, store: Arc<S>) -> Self {
    Self {
      oidc: OidcClient::new(config, http_client),
      store,
      renewal_skew: Duration::seconds(config.renewal_skew_secs),
      renewal_flights: Mutex::new(HashMap::new()),
    }
  }

  /// Register the token record produced at sign-in completion
  pub async fn begin_session(&self, session_id: &str, record: SessionTokenRecord) -> AuthResult<()> {
    self.store.replace(session_id, record).await?;
    info!("session {session_id}: token record stored at sign-in");
    Ok(())
  }

  /// Destroy the session's token record
  pub async fn sign_out(&self, session_id: &str) -> AuthResult<()> {
    self.store.remove(session_id).await?;
    info!("session {session_id}: signed out");
    Ok(())
  }

  /// Return an access token currently valid for the session, renewing it
  /// through the refresh grant if it is stale. Callers receiving
  /// `ReauthenticationRequired` or `RefreshFailed` must send the end user
  /// through the full sign-in flow; neither is retried here.
  pub async fn get_valid_access_token(&self, session_id: &str) -> AuthResult<String> {
    loop {
      let record_opt = self.store.load(session_id).await?;
      let Some(record) = record_opt else {
        return Err(AuthError::SessionNotFound);
      };
      if record.is_fresh(Utc::now(), self.renewal_skew) {
        return Ok(record.access_token);
      }

      // stale: at most one exchange per session may be in flight
      let Some(outcome) = self.join_or_lead_renewal(session_id).await? else {
        // the flight we queued on ended without publishing an outcome
        // (cancelled leader); start over against the current record
        continue;
      };
      return outcome.into_result();
    }
  }

  /// Fetch the caller's claims from the userinfo endpoint, renewing the
  /// access token first if needed
  pub async fn userinfo(&self, session_id: &str) -> AuthResult<ClaimSet> {
    let access_token = self.get_valid_access_token(session_id).await?;
    let disco = self.oidc.fetch_discovery_document().await?;
    self.oidc.fetch_userinfo(&disco, &access_token).await
  }

  /// Join the session's in-flight renewal if one exists, otherwise lead a
  /// new one. Returns the flight's shared outcome, or `None` when the joined
  /// flight was abandoned before publishing one.
  async fn join_or_lead_renewal(&self, session_id: &str) -> AuthResult<Option<FlightOutcome>> {
    let mut flights = self.renewal_flights.lock().await;
    if let Some(flight) = flights.get(session_id) {
      let flight = flight.clone();
      drop(flights);
      // blocks until the leader publishes the outcome and releases the slot
      let slot = flight.outcome.lock().await;
      if slot.is_none() {
        // leader vanished without publishing; retire the dead flight so a
        // later caller can lead a fresh one
        let mut flights = self.renewal_flights.lock().await;
        if flights.get(session_id).is_some_and(|current| Arc::ptr_eq(current, &flight)) {
          flights.remove(session_id);
        }
        drop(flights);
      }
      return Ok(slot.clone());
    }

    let flight = Arc::new(RenewalFlight::default());
    // slot taken before the flight becomes visible to other callers
    let mut slot = flight.outcome.lock().await;
    flights.insert(session_id.to_string(), flight.clone());
    drop(flights);

    let outcome = self.renew(session_id).await;

    // retire the flight before waking waiters; callers arriving later renew
    // against the updated record in a flight of their own
    let mut flights = self.renewal_flights.lock().await;
    flights.remove(session_id);
    drop(flights);

    let outcome = outcome?;
    *slot = Some(outcome.clone());
    drop(slot);

    Ok(Some(outcome))
  }

  /// Drive one refresh exchange as the flight leader and publish the
  /// replacement record. The prior record stays in force unless the exchange
  /// succeeds, except that a definitive grant rejection discards the spent
  /// refresh token.
  async fn renew(&self, session_id: &str) -> AuthResult<FlightOutcome> {
    // the record may have been renewed between this caller's freshness check
    // and it becoming the flight leader
    let record_opt = self.store.load(session_id).await?;
    let Some(record) = record_opt else {
      return Err(AuthError::SessionNotFound);
    };
    if record.is_fresh(Utc::now(), self.renewal_skew) {
      debug!("session {session_id}: token already renewed by a previous flight");
      return Ok(FlightOutcome::Renewed(record.access_token));
    }

    let Some(refresh_token) = record.refresh_token.clone() else {
      debug!("session {session_id}: no refresh token, full sign-in required");
      return Ok(FlightOutcome::ReauthenticationRequired);
    };

    let disco = match self.oidc.fetch_discovery_document().await {
      Ok(disco) => disco,
      Err(e) => return Ok(FlightOutcome::Failed(Arc::new(e))),
    };

    let grant = match self.oidc.refresh_access_token(&disco, &refresh_token).await {
      Ok(grant) => grant,
      Err(rejection @ AuthError::GrantRejected { .. }) => {
        // the presented refresh token is spent; never retry it
        warn!("session {session_id}: refresh grant rejected, downgrading session to re-authentication");
        self.store.replace(session_id, record.without_refresh_token()).await?;
        return Ok(FlightOutcome::Failed(Arc::new(rejection)));
      }
      Err(e) => return Ok(FlightOutcome::Failed(Arc::new(e))),
    };

    let renewed = SessionTokenRecord {
      id_token: grant.id_token.unwrap_or(record.id_token),
      access_token: grant.access_token,
      // absent a rotated replacement, the prior refresh token remains valid
      refresh_token: grant.refresh_token.or(Some(refresh_token)),
      expires_at: Utc::now() + Duration::seconds(grant.expires_in),
      claims: record.claims,
    };
    let access_token = renewed.access_token.clone();
    self.store.replace(session_id, renewed).await?;

    info!("session {session_id}: access token renewed");

    Ok(FlightOutcome::Renewed(access_token))
  }

  #[cfg(test)]
  pub(crate) async fn in_flight_renewals(&self) -> usize {
    let flights = self.renewal_flights.lock().await;
    flights.len()
  }
}
