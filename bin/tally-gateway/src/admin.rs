//! Shared-secret guard for destructive admin operations.

use tally_common::{Error, Result};

/// Check a presented admin token against the configured secret.
///
/// A missing configured secret denies everything and is reported
/// distinctly from a wrong token so operators can tell a deployment
/// gap from a bad caller.
pub fn authorize(configured: Option<&str>, presented: Option<&str>) -> Result<()> {
    let Some(secret) = configured else {
        return Err(Error::AdminSecretMissing);
    };
    match presented {
        Some(token) if constant_time_eq(secret, token) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hello!"));
    }

    #[test]
    fn test_authorize_matches_exactly() {
        assert!(authorize(Some("s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(
            authorize(Some("s3cret"), Some("S3CRET")),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            authorize(Some("s3cret"), None),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_missing_secret_is_distinguished() {
        assert!(matches!(
            authorize(None, Some("anything")),
            Err(Error::AdminSecretMissing)
        ));
        assert!(matches!(authorize(None, None), Err(Error::AdminSecretMissing)));
    }
}
