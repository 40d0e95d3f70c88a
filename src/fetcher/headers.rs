use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    USER_AGENT,
};

use super::FetchError;

/// Build the fixed header set sent with every upstream request
///
/// The booking team asks automated clients to identify themselves, so the
/// User-Agent embeds the operator's contact email and script identifier.
///
/// # Arguments
///
/// * `email` - Operator contact email address
/// * `script_id` - Operator-chosen identifier for this deployment
pub fn build_identity_headers(email: &str, script_id: &str) -> Result<HeaderMap, FetchError> {
    let user_agent = format!(
        "Mozilla/5.0 TerminwatchBot/{} (appointment availability watcher; {email}; {script_id})",
        env!("CARGO_PKG_VERSION")
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&user_agent)
            .map_err(|_| FetchError::InvalidIdentity(user_agent.clone()))?,
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-gb"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_embeds_identity() {
        let headers = build_identity_headers("me@example.com", "my-watcher").unwrap();

        let user_agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(user_agent.contains("me@example.com"));
        assert!(user_agent.contains("my-watcher"));
        assert!(user_agent.starts_with("Mozilla/5.0 TerminwatchBot/"));
    }

    #[test]
    fn test_fixed_header_set_is_complete() {
        let headers = build_identity_headers("me@example.com", "").unwrap();

        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
        assert!(headers.contains_key(ACCEPT_ENCODING));
        assert!(headers.contains_key(CONNECTION));
        assert!(headers.contains_key("upgrade-insecure-requests"));
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "en-gb");
    }

    #[test]
    fn test_unencodable_identity_is_rejected() {
        let result = build_identity_headers("me@example.com\n", "x");
        assert!(matches!(result, Err(FetchError::InvalidIdentity(_))));
    }
}
