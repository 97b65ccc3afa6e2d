use reqwest::Url;

use crate::{
    error::{Result, TrackerError},
    session::SessionId,
};

/// URL layout of the collector service.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn parse(endpoint: &str) -> Result<Self> {
        let invalid = || TrackerError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
        };

        let base = Url::parse(endpoint).map_err(|_| invalid())?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid());
        }
        Ok(Self { base })
    }

    /// `<base>/events/new?sid=<sid>&event=<json>`
    pub fn report(&self, sid: &SessionId, event_json: &str) -> Result<Url> {
        let mut url = self.join(&["events", "new"])?;
        url.query_pairs_mut()
            .clear()
            .append_pair("sid", sid.as_str())
            .append_pair("event", event_json);
        Ok(url)
    }

    /// `<base>/events/<sid>`
    pub fn replay(&self, sid: &SessionId) -> Result<Url> {
        let mut url = self.join(&["events", sid.as_str()])?;
        url.set_query(None);
        Ok(url)
    }

    fn join(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TrackerError::InvalidEndpoint {
                endpoint: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn report_url_carries_sid_and_event_json() {
        let endpoints = Endpoints::parse("http://localhost:8080").unwrap();
        let json = r#"{"type":"click","clientX":1,"clientY":2,"timeStamp":3.0}"#;
        let url = endpoints.report(&SessionId::new("R"), json).unwrap();

        assert_eq!(url.path(), "/events/new");
        assert_eq!(
            query(&url),
            vec![
                ("sid".to_string(), "R".to_string()),
                ("event".to_string(), json.to_string()),
            ]
        );
    }

    #[test]
    fn replay_url_keeps_base_path_prefix() {
        let endpoints = Endpoints::parse("https://collector.test/api/").unwrap();
        let url = endpoints.replay(&SessionId::new("abc")).unwrap();
        assert_eq!(url.as_str(), "https://collector.test/api/events/abc");
    }

    #[test]
    fn replay_url_encodes_session_as_one_segment() {
        let endpoints = Endpoints::parse("http://localhost:8080").unwrap();
        let url = endpoints.replay(&SessionId::new("a/b c")).unwrap();
        assert_eq!(url.path(), "/events/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(Endpoints::parse("mailto:someone@example.com").is_err());
        assert!(Endpoints::parse("ftp://example.com").is_err());
        assert!(Endpoints::parse("not a url").is_err());
    }
}
