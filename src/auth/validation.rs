//! Validation rules for RPCN credentials.
//!
//! Rules are checked in a fixed order and the first violation wins:
//! host, then presence of NPID and password, then the NPID format.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::credentials::Credentials;

/// Minimum NPID length in characters.
pub const NPID_MIN_LEN: usize = 3;

/// Maximum NPID length in characters.
pub const NPID_MAX_LEN: usize = 16;

/// Allowed NPID alphabet: ASCII alphanumerics, `-` and `_`.
static NPID_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]*$").expect("Invalid NPID regex pattern"));

/// A violated credential rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The host field is empty.
    #[error("missing host")]
    MissingHost,

    /// The NPID or the password is empty.
    #[error("missing username or password")]
    MissingCredentials,

    /// The NPID is too short, too long or contains a forbidden character.
    #[error("invalid NPID format")]
    InvalidUsernameFormat,
}

impl ValidationError {
    /// Short title for a blocking message box.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingHost => "Missing host",
            ValidationError::MissingCredentials => "Wrong input",
            ValidationError::InvalidUsernameFormat => "Invalid character",
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MissingHost => "You need to enter a host for rpcn!",
            ValidationError::MissingCredentials => "You need to enter a username and a password!",
            ValidationError::InvalidUsernameFormat => {
                "NPID must be between 3 and 16 characters and can only contain '-', '_' or alphanumeric characters."
            }
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingHost => "VALIDATION_MISSING_HOST",
            ValidationError::MissingCredentials => "VALIDATION_MISSING_CREDENTIALS",
            ValidationError::InvalidUsernameFormat => "VALIDATION_INVALID_NPID",
        }
    }
}

/// Check an NPID against the length and charset rules.
///
/// The length is measured in characters, so a multi-byte character counts
/// once (it is rejected by the charset rule anyway).
pub fn is_valid_npid(npid: &str) -> bool {
    let len = npid.chars().count();
    (NPID_MIN_LEN..=NPID_MAX_LEN).contains(&len) && NPID_CHARSET.is_match(npid)
}

/// Validate a candidate set of credentials.
///
/// Returns the first violated rule. Never touches storage or the network.
pub fn validate(candidate: &Credentials) -> Result<(), ValidationError> {
    if candidate.host.is_empty() {
        return Err(ValidationError::MissingHost);
    }

    if candidate.npid.is_empty() || candidate.password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }

    if !is_valid_npid(&candidate.npid) {
        return Err(ValidationError::InvalidUsernameFormat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(host: &str, npid: &str, password: &str) -> Credentials {
        Credentials::new(host, npid, password)
    }

    #[test]
    fn test_valid_credentials() {
        assert_eq!(validate(&creds("rpcn.example.org", "Player_1", "secret123")), Ok(()));
    }

    #[test]
    fn test_empty_host_wins_over_everything() {
        assert_eq!(validate(&creds("", "", "")), Err(ValidationError::MissingHost));
        assert_eq!(
            validate(&creds("", "ab", "pw")),
            Err(ValidationError::MissingHost)
        );
        assert_eq!(
            validate(&creds("", "Player_1", "secret")),
            Err(ValidationError::MissingHost)
        );
    }

    #[test]
    fn test_missing_npid_or_password() {
        assert_eq!(
            validate(&creds("host", "", "secret")),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate(&creds("host", "Player_1", "")),
            Err(ValidationError::MissingCredentials)
        );
        // Presence is checked before format
        assert_eq!(
            validate(&creds("host", "a$", "")),
            Err(ValidationError::MissingCredentials)
        );
    }

    #[test]
    fn test_npid_length_bounds() {
        for len in [1usize, 2, 17, 18, 40] {
            let npid = "a".repeat(len);
            assert_eq!(
                validate(&creds("host", &npid, "pw")),
                Err(ValidationError::InvalidUsernameFormat),
                "length {} should be rejected",
                len
            );
        }
        for len in NPID_MIN_LEN..=NPID_MAX_LEN {
            let npid = "a".repeat(len);
            assert_eq!(validate(&creds("host", &npid, "pw")), Ok(()), "length {}", len);
        }
    }

    #[test]
    fn test_npid_charset() {
        assert!(is_valid_npid("ab_-9"));
        assert!(is_valid_npid("ABC"));
        assert!(!is_valid_npid("ab$"));
        assert!(!is_valid_npid("ab c"));
        assert!(!is_valid_npid("ab.c"));
        assert!(!is_valid_npid("abé"));
        assert!(!is_valid_npid("abc\n"));
    }

    #[test]
    fn test_short_npid_rejected() {
        assert_eq!(
            validate(&creds("host", "ab", "pw")),
            Err(ValidationError::InvalidUsernameFormat)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::MissingHost.title(), "Missing host");
        assert_eq!(
            ValidationError::MissingCredentials.user_message(),
            "You need to enter a username and a password!"
        );
        assert!(ValidationError::InvalidUsernameFormat
            .user_message()
            .starts_with("NPID must be between 3 and 16"));
    }
}
