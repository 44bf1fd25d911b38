mod claim;
mod constants;
mod session;

pub mod claim_types {
  pub use crate::constants::{
    CLAIM_ADDRESS, CLAIM_COUNTRY, CLAIM_FAMILY_NAME, CLAIM_GIVEN_NAME, CLAIM_ROLE, CLAIM_SUBJECT,
    CLAIM_SUBSCRIPTION_LEVEL,
  };
}

pub use claim::{Claim, ClaimSet};
pub use constants::RENEWAL_SKEW_SECS;
pub use session::SessionTokenRecord;
