/// Well-known path segments of the OIDC discovery document
pub const DISCOVERY_PATH_SEGMENTS: [&str; 2] = [".well-known", "openid-configuration"];

/// Grant type presented to the token endpoint on renewal
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

#[cfg(feature = "reqwest")]
/// Bound on each discovery/token endpoint round trip. A timed-out exchange is
/// treated the same as a transport failure.
pub const HTTP_TIMEOUT_SECS: u64 = 10;
