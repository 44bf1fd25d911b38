use crate::constants::{CLAIM_ROLE, CLAIM_SUBJECT};
use serde::{Deserialize, Serialize};

/// Single identity claim asserted by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
  #[serde(rename = "type")]
  pub claim_type: String,
  pub value: String,
}

impl Claim {
  pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      claim_type: claim_type.into(),
      value: value.into(),
    }
  }
}

/// Ordered set of claims for one authenticated caller. Order is preserved as
/// given at sign-in, duplicates of the same claim type are allowed (e.g.
/// multiple role claims).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
  claims: Vec<Claim>,
}

impl ClaimSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, claim: Claim) {
    self.claims.push(claim);
  }

  pub fn with(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
    self.push(Claim::new(claim_type, value));
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = &Claim> {
    self.claims.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.claims.is_empty()
  }

  /// First value of the given claim type, if any
  pub fn get(&self, claim_type: &str) -> Option<&str> {
    self
      .claims
      .iter()
      .find(|c| c.claim_type == claim_type)
      .map(|c| c.value.as_str())
  }

  /// True iff a claim of the given type carries exactly the given value
  pub fn has(&self, claim_type: &str, value: &str) -> bool {
    self.claims.iter().any(|c| c.claim_type == claim_type && c.value == value)
  }

  /// Subject id (`sub` claim) of the caller
  pub fn subject(&self) -> Option<&str> {
    self.get(CLAIM_SUBJECT)
  }

  /// All role claim values, in claim order
  pub fn roles(&self) -> impl Iterator<Item = &str> {
    self
      .claims
      .iter()
      .filter(|c| c.claim_type == CLAIM_ROLE)
      .map(|c| c.value.as_str())
  }
}

impl FromIterator<Claim> for ClaimSet {
  fn from_iter<T: IntoIterator<Item = Claim>>(iter: T) -> Self {
    Self {
      claims: iter.into_iter().collect(),
    }
  }
}
