use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statically declared requirements gating one protected operation. Policies
/// combine coarse checks (authentication, roles, claim equalities) with an
/// optional per-resource ownership check evaluated against persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
  pub requires_authentication: bool,
  /// Caller must hold at least one of these roles (empty: no role check)
  pub required_roles: Vec<String>,
  /// Caller must hold each claim type with exactly this value
  pub required_claims: Vec<(String, String)>,
  pub requires_resource_ownership: bool,
}

impl Policy {
  /// Policy requiring an authenticated caller and nothing else
  pub fn authenticated() -> Self {
    Self {
      requires_authentication: true,
      ..Default::default()
    }
  }

  pub fn require_role(mut self, role: impl Into<String>) -> Self {
    self.required_roles.push(role.into());
    self
  }

  pub fn require_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
    self.required_claims.push((claim_type.into(), value.into()));
    self
  }

  pub fn require_resource_ownership(mut self) -> Self {
    self.requires_resource_ownership = true;
    self
  }
}

/// Named policies, one per protected operation. Static configuration data,
/// not user-editable at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySet {
  policies: HashMap<String, Policy>,
}

impl PolicySet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(mut self, operation: impl Into<String>, policy: Policy) -> Self {
    self.policies.insert(operation.into(), policy);
    self
  }

  pub fn get(&self, operation: &str) -> Option<&Policy> {
    self.policies.get(operation)
  }
}
