use thiserror::Error;
use url::Url;

/// Reasons an item link is refused before handing it to the system browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// The item carries no link at all.
    #[error("Item has no link")]
    Missing,
    /// The link could not be parsed.
    #[error("Invalid link: {0}")]
    Invalid(#[from] url::ParseError),
    /// The link uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The link has no host to open.
    #[error("Link has no host")]
    NoHost,
}

/// Validates an item link for `open::that`.
///
/// Feed content is untrusted, so anything other than an absolute http(s)
/// URL with a host is refused. Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use cragfeed::util::validate_link_for_open;
///
/// let url = validate_link_for_open("https://www.mountainproject.com/route/1/x").unwrap();
/// assert_eq!(url.host_str(), Some("www.mountainproject.com"));
///
/// assert!(validate_link_for_open("file:///etc/passwd").is_err());
/// assert!(validate_link_for_open("").is_err());
/// ```
pub fn validate_link_for_open(link: &str) -> Result<Url, LinkError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(LinkError::Missing);
    }

    let url = Url::parse(link)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(LinkError::NoHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_links_accepted() {
        assert!(validate_link_for_open("https://www.mountainproject.com/route/1/x").is_ok());
        assert!(validate_link_for_open("http://example.com").is_ok());
        assert!(validate_link_for_open("  https://example.com/a  ").is_ok());
    }

    #[test]
    fn test_empty_link_missing() {
        assert_eq!(validate_link_for_open("   "), Err(LinkError::Missing));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert_eq!(
            validate_link_for_open("javascript:alert(1)"),
            Err(LinkError::UnsupportedScheme("javascript".to_string()))
        );
        assert!(matches!(
            validate_link_for_open("file:///etc/passwd"),
            Err(LinkError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_relative_link_invalid() {
        assert!(matches!(
            validate_link_for_open("/route/1/x"),
            Err(LinkError::Invalid(_))
        ));
    }
}
