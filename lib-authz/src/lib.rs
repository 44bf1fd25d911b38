mod engine;
mod log;
mod policy;

pub use engine::{AuthzEngine, Decision, DenyReason, OwnershipLookupError, RequestContext, ResourceOwnership};
pub use policy::{Policy, PolicySet};

pub mod identity {
  pub use libcommon::*;
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;
  use async_trait::async_trait;
  use libcommon::{
    claim_types::{CLAIM_COUNTRY, CLAIM_ROLE, CLAIM_SUBJECT, CLAIM_SUBSCRIPTION_LEVEL},
    ClaimSet,
  };
  use std::{
    collections::HashMap,
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
  };
  use uuid::Uuid;

  const FRANK: &str = "d860efca-22d9-47fd-8249-791ba61b07c7";
  const CLAIRE: &str = "b7539694-97e7-4dfe-84da-b4256e1ff5c7";

  struct MockImageOwnership {
    owners: HashMap<Uuid, String>,
    unavailable: bool,
    lookups: AtomicUsize,
  }

  impl MockImageOwnership {
    fn with_owner(image_id: Uuid, owner_id: &str) -> Self {
      Self {
        owners: HashMap::from([(image_id, owner_id.to_string())]),
        unavailable: false,
        lookups: AtomicUsize::new(0),
      }
    }

    fn unavailable() -> Self {
      Self {
        owners: HashMap::new(),
        unavailable: true,
        lookups: AtomicUsize::new(0),
      }
    }
  }

  #[async_trait]
  impl ResourceOwnership for MockImageOwnership {
    async fn is_owner(&self, resource_id: Uuid, owner_id: &str) -> Result<bool, OwnershipLookupError> {
      self.lookups.fetch_add(1, Ordering::SeqCst);
      if self.unavailable {
        return Err(OwnershipLookupError(anyhow!("gallery repository unreachable")));
      }
      Ok(self.owners.get(&resource_id).map(|o| o == owner_id).unwrap_or(false))
    }
  }

  fn paying_user_claims(subject: &str) -> ClaimSet {
    ClaimSet::new()
      .with(CLAIM_SUBJECT, subject)
      .with(CLAIM_ROLE, "PayingUser")
      .with(CLAIM_SUBSCRIPTION_LEVEL, "PayingUser")
      .with(CLAIM_COUNTRY, "be")
  }

  fn free_user_claims(subject: &str) -> ClaimSet {
    ClaimSet::new()
      .with(CLAIM_SUBJECT, subject)
      .with(CLAIM_ROLE, "FreeUser")
      .with(CLAIM_SUBSCRIPTION_LEVEL, "FreeUser")
      .with(CLAIM_COUNTRY, "nl")
  }

  /// Policy catalogue of the gallery deployment
  fn gallery_policies() -> PolicySet {
    PolicySet::new()
      .declare("CanAddImage", Policy::authenticated())
      .declare(
        "CanOrderFrame",
        Policy::authenticated()
          .require_claim(CLAIM_COUNTRY, "be")
          .require_claim(CLAIM_SUBSCRIPTION_LEVEL, "PayingUser"),
      )
      .declare("MustOwnImage", Policy::authenticated().require_resource_ownership())
  }

  fn engine_with(ownership: MockImageOwnership) -> (AuthzEngine<MockImageOwnership>, Arc<MockImageOwnership>) {
    let ownership = Arc::new(ownership);
    (AuthzEngine::new(ownership.clone()), ownership)
  }

  #[tokio::test]
  async fn unauthenticated_caller_is_denied_whatever_else_the_policy_asks() {
    let (engine, _) = engine_with(MockImageOwnership::with_owner(Uuid::new_v4(), FRANK));
    let policies = gallery_policies();
    let ctx = RequestContext::anonymous();

    for operation in ["CanAddImage", "CanOrderFrame", "MustOwnImage"] {
      let policy = policies.get(operation).unwrap();
      let decision = engine.authorize(policy, &ctx).await;
      assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated), "{operation}");
    }
  }

  #[tokio::test]
  async fn authenticated_caller_passes_a_bare_authentication_policy() {
    let (engine, _) = engine_with(MockImageOwnership::with_owner(Uuid::new_v4(), FRANK));
    let policy = Policy::authenticated();
    let ctx = RequestContext::authenticated(free_user_claims(FRANK));

    assert!(engine.authorize(&policy, &ctx).await.is_allowed());
  }

  #[tokio::test]
  async fn role_gate_requires_an_intersecting_role_claim() {
    let (engine, ownership) = engine_with(MockImageOwnership::with_owner(Uuid::new_v4(), FRANK));
    let policy = Policy::authenticated().require_role("PayingUser");

    let free = RequestContext::authenticated(free_user_claims(FRANK));
    assert_eq!(
      engine.authorize(&policy, &free).await,
      Decision::Deny(DenyReason::InsufficientRole)
    );

    let paying = RequestContext::authenticated(paying_user_claims(CLAIRE));
    assert!(engine.authorize(&policy, &paying).await.is_allowed());

    // role checks never reach the ownership collaborator
    assert_eq!(ownership.lookups.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn claim_equalities_deny_on_the_first_mismatching_type() {
    let (engine, _) = engine_with(MockImageOwnership::with_owner(Uuid::new_v4(), FRANK));
    let policies = gallery_policies();
    let order_frame = policies.get("CanOrderFrame").unwrap();

    let decision = engine
      .authorize(order_frame, &RequestContext::authenticated(free_user_claims(FRANK)))
      .await;
    assert_eq!(decision, Decision::Deny(DenyReason::ClaimMismatch(CLAIM_COUNTRY.to_string())));

    let decision = engine
      .authorize(order_frame, &RequestContext::authenticated(paying_user_claims(CLAIRE)))
      .await;
    assert_eq!(decision, Decision::Allow);
  }

  #[tokio::test]
  async fn ownership_gate_allows_the_owner_and_denies_everyone_else() {
    let image_id = Uuid::new_v4();
    let (engine, ownership) = engine_with(MockImageOwnership::with_owner(image_id, CLAIRE));
    let policies = gallery_policies();
    let must_own = policies.get("MustOwnImage").unwrap();

    let owner_ctx = RequestContext::authenticated(paying_user_claims(CLAIRE)).with_resource_id(image_id.to_string());
    assert!(engine.authorize(must_own, &owner_ctx).await.is_allowed());
    assert_eq!(ownership.lookups.load(Ordering::SeqCst), 1);

    let other_ctx = RequestContext::authenticated(free_user_claims(FRANK)).with_resource_id(image_id.to_string());
    assert_eq!(
      engine.authorize(must_own, &other_ctx).await,
      Decision::Deny(DenyReason::NotOwner)
    );

    // an absent image is indistinguishable from a foreign-owned one
    let absent_ctx =
      RequestContext::authenticated(paying_user_claims(CLAIRE)).with_resource_id(Uuid::new_v4().to_string());
    assert_eq!(
      engine.authorize(must_own, &absent_ctx).await,
      Decision::Deny(DenyReason::NotOwner)
    );
  }

  #[tokio::test]
  async fn malformed_resource_id_is_denied_before_any_lookup() {
    let (engine, ownership) = engine_with(MockImageOwnership::with_owner(Uuid::new_v4(), CLAIRE));
    let policy = Policy::authenticated().require_resource_ownership();

    let bad_id_ctx = RequestContext::authenticated(paying_user_claims(CLAIRE)).with_resource_id("not-a-guid");
    assert_eq!(
      engine.authorize(&policy, &bad_id_ctx).await,
      Decision::Deny(DenyReason::MalformedResourceId)
    );

    let no_id_ctx = RequestContext::authenticated(paying_user_claims(CLAIRE));
    assert_eq!(
      engine.authorize(&policy, &no_id_ctx).await,
      Decision::Deny(DenyReason::MalformedResourceId)
    );

    assert_eq!(ownership.lookups.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn ownership_gate_needs_a_subject_claim() {
    let image_id = Uuid::new_v4();
    let (engine, _) = engine_with(MockImageOwnership::with_owner(image_id, CLAIRE));
    let policy = Policy::authenticated().require_resource_ownership();

    let claims = ClaimSet::new().with(CLAIM_ROLE, "PayingUser");
    let ctx = RequestContext::authenticated(claims).with_resource_id(image_id.to_string());
    assert_eq!(
      engine.authorize(&policy, &ctx).await,
      Decision::Deny(DenyReason::Unauthenticated)
    );
  }

  #[tokio::test]
  async fn unreachable_ownership_collaborator_fails_closed() {
    let (engine, _) = engine_with(MockImageOwnership::unavailable());
    let policy = Policy::authenticated().require_resource_ownership();
    let ctx = RequestContext::authenticated(paying_user_claims(CLAIRE)).with_resource_id(Uuid::new_v4().to_string());

    assert_eq!(
      engine.authorize(&policy, &ctx).await,
      Decision::Deny(DenyReason::LookupUnavailable)
    );
  }

  #[test]
  fn policy_set_resolves_declared_operations_only() {
    let policies = gallery_policies();
    assert!(policies.get("MustOwnImage").is_some());
    assert!(policies.get("CanDeleteAnything").is_none());
  }
}
