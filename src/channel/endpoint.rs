use url::Url;

use super::error::ChannelError;

/// Build the WebSocket address for a feed path.
///
/// `base` may carry a trailing slash and `path` a leading one; exactly one
/// separator ends up between them. The credential is appended as `apiKey`
/// only when present and non-empty.
pub fn feed_url(base: &str, path: &str, credential: Option<&str>) -> Result<Url, ChannelError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|source| ChannelError::InvalidEndpoint {
        url: joined.clone(),
        source,
    })?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    }

    if let Some(key) = credential.filter(|k| !k.is_empty()) {
        url.query_pairs_mut().append_pair("apiKey", key);
    }
    Ok(url)
}

/// Strip the credential from a URL before it goes into a log line.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_joins_with_single_slash() {
        let url = feed_url("ws://localhost:8080/", "/tennis/grandstand", None).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/tennis/grandstand");

        let url = feed_url("ws://localhost:8080", "tennis/stadium", None).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/tennis/stadium");
    }

    #[test]
    fn test_feed_url_appends_credential() {
        let url = feed_url("wss://scores.example.com", "/tennis/centre", Some("k3y")).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://scores.example.com/tennis/centre?apiKey=k3y"
        );
    }

    #[test]
    fn test_feed_url_omits_empty_credential() {
        let url = feed_url("ws://localhost:8080", "/tennis/centre", Some("")).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_feed_url_encodes_credential() {
        let url = feed_url("ws://localhost:8080", "/t", Some("a b&c")).unwrap();
        assert_eq!(url.query(), Some("apiKey=a+b%26c"));
    }

    #[test]
    fn test_feed_url_rejects_bad_input() {
        assert!(matches!(
            feed_url("http://localhost:8080", "/t", None),
            Err(ChannelError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            feed_url("not a url", "/t", None),
            Err(ChannelError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_redacted_drops_query() {
        let url = feed_url("ws://localhost:8080", "/t", Some("secret")).unwrap();
        assert_eq!(redacted(&url), "ws://localhost:8080/t");
    }
}
