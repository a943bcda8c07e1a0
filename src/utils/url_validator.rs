//! Original URL validation.
//!
//! URLs are validated but never rewritten: the short code is a digest of the
//! submitted string and redirects must return it unchanged.

use url::Url;

/// Reasons an original URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedScheme,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is a well-formed absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns [`UrlValidationError::InvalidFormat`] for relative or malformed
/// input or input containing control characters,
/// [`UrlValidationError::UnsupportedScheme`] for `javascript:`,
/// `data:`, `ftp:` and friends, and [`UrlValidationError::MissingHost`] when
/// no host is present.
pub fn validate_url(input: &str) -> Result<(), UrlValidationError> {
    if input.trim() != input {
        return Err(UrlValidationError::InvalidFormat(
            "leading or trailing whitespace".to_string(),
        ));
    }

    // The parser silently drops tabs and newlines; the stored string would not.
    if input.chars().any(char::is_control) {
        return Err(UrlValidationError::InvalidFormat(
            "control characters are not allowed".to_string(),
        ));
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedScheme),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("https://api.example.com:8443/v1?q=rust#top").is_ok());
        assert!(validate_url("http://192.168.1.1:8080/api").is_ok());
    }

    #[test]
    fn test_rejects_relative_and_garbage() {
        assert!(matches!(
            validate_url("example.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url("/just/a/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url("not a valid url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url(""),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_surrounding_whitespace() {
        assert!(matches!(
            validate_url(" https://example.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_embedded_control_characters() {
        for input in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://exam\rple.com/",
            "https://example.com/\u{7f}",
        ] {
            assert!(
                matches!(validate_url(input), Err(UrlValidationError::InvalidFormat(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_other_schemes() {
        for input in [
            "ftp://example.com/file.txt",
            "file:///etc/passwd",
            "javascript:alert('xss')",
            "data:text/plain,Hello",
            "mailto:test@example.com",
        ] {
            assert_eq!(
                validate_url(input),
                Err(UrlValidationError::UnsupportedScheme),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_missing_host() {
        assert!(validate_url("http://").is_err());
    }
}
