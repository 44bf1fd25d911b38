/// Safety margin subtracted from the access token expiry when deciding whether
/// the token may still be presented to the resource server. A token that would
/// expire mid-flight is treated as already stale.
pub const RENEWAL_SKEW_SECS: i64 = 60;

// Claim types asserted by the identity provider
pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_ROLE: &str = "role";
pub const CLAIM_SUBSCRIPTION_LEVEL: &str = "subscriptionlevel";
pub const CLAIM_COUNTRY: &str = "country";
pub const CLAIM_GIVEN_NAME: &str = "given_name";
pub const CLAIM_FAMILY_NAME: &str = "family_name";
pub const CLAIM_ADDRESS: &str = "address";
