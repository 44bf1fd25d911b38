use crate::{log::*, policy::Policy};
use async_trait::async_trait;
use libcommon::ClaimSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Answers whether the candidate owner id owns the resource. Backed by
/// persistence outside this crate and queried fresh for every decision, so
/// ownership changes are never served from a stale cache.
#[async_trait]
pub trait ResourceOwnership {
  async fn is_owner(&self, resource_id: Uuid, owner_id: &str) -> Result<bool, OwnershipLookupError>;
}

/// The ownership collaborator could not be reached
#[derive(Debug, Error)]
#[error("ownership lookup unavailable: {0}")]
pub struct OwnershipLookupError(#[from] pub anyhow::Error);

/// Outcome of one authorization decision. A deny is final for the request;
/// mapping each reason to an HTTP response is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny(DenyReason),
}

impl Decision {
  pub fn is_allowed(&self) -> bool {
    matches!(self, Decision::Allow)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
  Unauthenticated,
  InsufficientRole,
  ClaimMismatch(String),
  MalformedResourceId,
  NotOwner,
  LookupUnavailable,
}

/// What the engine sees of an inbound request: the claims come out of the
/// bearer token validation layer upstream, the resource id out of the
/// request's addressing (e.g. a path parameter), still unparsed.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
  pub authenticated: bool,
  pub claims: ClaimSet,
  pub resource_id: Option<String>,
}

impl RequestContext {
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn authenticated(claims: ClaimSet) -> Self {
    Self {
      authenticated: true,
      claims,
      resource_id: None,
    }
  }

  pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
    self.resource_id = Some(resource_id.into());
    self
  }
}

/// Evaluates a policy against a request context, cheapest check first.
/// Stateless apart from the ownership collaborator; safe to share across
/// concurrent requests. Issues at most one ownership lookup per decision.
pub struct AuthzEngine<R>
where
  R: ResourceOwnership,
{
  ownership: Arc<R>,
}

impl<R> AuthzEngine<R>
where
  R: ResourceOwnership,
{
  pub fn new(ownership: Arc<R>) -> Self {
    Self { ownership }
  }

  pub async fn authorize(&self, policy: &Policy, ctx: &RequestContext) -> Decision {
    if policy.requires_authentication && !ctx.authenticated {
      return Decision::Deny(DenyReason::Unauthenticated);
    }

    if !policy.required_roles.is_empty() {
      let role_held = ctx.claims.roles().any(|role| policy.required_roles.iter().any(|r| r == role));
      if !role_held {
        debug!("caller holds none of the required roles");
        return Decision::Deny(DenyReason::InsufficientRole);
      }
    }

    for (claim_type, expected) in &policy.required_claims {
      if !ctx.claims.has(claim_type, expected) {
        debug!("required claim missing or mismatched: {claim_type}");
        return Decision::Deny(DenyReason::ClaimMismatch(claim_type.clone()));
      }
    }

    if policy.requires_resource_ownership {
      let Some(raw_id) = ctx.resource_id.as_deref() else {
        return Decision::Deny(DenyReason::MalformedResourceId);
      };
      let Ok(resource_id) = Uuid::parse_str(raw_id) else {
        return Decision::Deny(DenyReason::MalformedResourceId);
      };
      let Some(subject) = ctx.claims.subject() else {
        return Decision::Deny(DenyReason::Unauthenticated);
      };

      match self.ownership.is_owner(resource_id, subject).await {
        Ok(true) => {}
        // absent resources and resources owned by someone else are
        // deliberately indistinguishable: no existence leak
        Ok(false) => return Decision::Deny(DenyReason::NotOwner),
        Err(e) => {
          // fail closed
          warn!("ownership lookup failed, denying: {e}");
          return Decision::Deny(DenyReason::LookupUnavailable);
        }
      }
    }

    Decision::Allow
  }
}
