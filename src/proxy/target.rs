//! Request target resolution.
//!
//! # Responsibilities
//! - Turn absolute-form or origin-form targets into one normalized target
//! - Derive the cache key
//! - Build the outbound origin request
//!
//! # Design Decisions
//! - Absolute-form targets win over the `Host` header
//! - Origin-form targets are assumed to be `http`
//! - Scheme, host and port are normalized through `url::Url`, so both forms
//!   of the same resource yield identical keys
//! - Path and query bytes are kept exactly as the client sent them

use url::Url;

use crate::cache::CacheKey;
use crate::http::request::{encode_latin1, ParsedRequest};
use crate::http::response::Rejection;

/// A resolved origin resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Path (never empty) plus `?query` when a non-empty query is present.
    pub path_and_query: String,
}

impl Target {
    /// Resolve the target of a parsed client request.
    ///
    /// Only the scheme and authority go through `Url`; the path and query
    /// are taken from the request text as sent.
    pub fn resolve(request: &ParsedRequest) -> Result<Self, Rejection> {
        let target = request.target.as_str();
        let (origin, raw_path) = match absolute_scheme(target) {
            Some(scheme) => {
                let rest = &target[scheme.len() + 3..];
                let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
                let (authority, raw_path) = rest.split_at(end);
                if authority.is_empty() {
                    return Err(Rejection::BadRequest);
                }
                (format!("{scheme}://{authority}/"), raw_path)
            }
            None => {
                let host = request.header("host").ok_or(Rejection::BadRequest)?;
                if host.is_empty() || host.contains(['/', '?', '#']) || !target.starts_with('/') {
                    return Err(Rejection::BadRequest);
                }
                (format!("http://{host}/"), target)
            }
        };

        let url = Url::parse(&origin).map_err(|_| Rejection::BadRequest)?;
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or(Rejection::BadRequest)?;
        let port = url.port_or_known_default().ok_or(Rejection::BadRequest)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
            path_and_query: normalize_path_and_query(raw_path),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.scheme, &self.host, self.port, &self.path_and_query)
    }

    /// Wire bytes of the GET sent to the origin.
    pub fn origin_request(&self, user_agent: &str, if_modified_since: Option<&str>) -> Vec<u8> {
        let mut head = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nUser-Agent: {}\r\n",
            self.path_and_query, self.host, user_agent
        );
        if let Some(validator) = if_modified_since {
            head.push_str("If-Modified-Since: ");
            head.push_str(validator);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        encode_latin1(&head)
    }
}

/// The lowercase scheme of an absolute-form target.
fn absolute_scheme(target: &str) -> Option<&'static str> {
    ["http", "https"].into_iter().find(|scheme| {
        target
            .get(..scheme.len() + 3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&format!("{scheme}://")))
    })
}

/// Drop any fragment and an empty query, and give an empty path `/`.
fn normalize_path_and_query(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let mut path_and_query = match without_fragment.split_once('?') {
        Some((path, "")) => path.to_string(),
        _ => without_fragment.to_string(),
    };
    if !path_and_query.starts_with('/') {
        path_and_query.insert(0, '/');
    }
    path_and_query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::parse_request_head;

    fn resolve(raw: &str) -> Result<Target, Rejection> {
        Target::resolve(&parse_request_head(raw.as_bytes()).unwrap())
    }

    #[test]
    fn absolute_form_defaults_port() {
        let target = resolve("GET http://example.test/a.txt HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(target.cache_key().as_str(), "http://example.test:80/a.txt");

        let target = resolve("GET https://example.test/ HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(target.port, 443);
        assert_eq!(target.cache_key().as_str(), "https://example.test:443/");
    }

    #[test]
    fn origin_form_uses_host_header() {
        let target = resolve("GET /a.txt?x=1 HTTP/1.1\r\nHost: example.test:8080\r\n\r\n").unwrap();
        assert_eq!(target.host, "example.test");
        assert_eq!(target.port, 8080);
        assert_eq!(target.cache_key().as_str(), "http://example.test:8080/a.txt?x=1");
    }

    #[test]
    fn both_forms_share_a_key() {
        let absolute = resolve("GET http://Example.Test:80/a.txt HTTP/1.1\r\nAccept: */*\r\n\r\n").unwrap();
        let origin = resolve("GET /a.txt HTTP/1.0\r\nAccept: */*\r\nHost: example.test\r\n\r\n").unwrap();
        let reordered = resolve("GET /a.txt HTTP/1.1\r\nHost: example.test\r\nAccept: */*\r\n\r\n").unwrap();

        assert_eq!(absolute.cache_key(), origin.cache_key());
        assert_eq!(origin.cache_key(), reordered.cache_key());
    }

    #[test]
    fn empty_path_and_query_are_normalized() {
        let target = resolve("GET http://example.test HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(target.path_and_query, "/");

        let target = resolve("GET http://example.test/p? HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(target.path_and_query, "/p");
    }

    #[test]
    fn scheme_prefix_is_case_insensitive() {
        let target = resolve("GET HTTP://example.test/x HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(target.scheme, "http");
    }

    #[test]
    fn origin_form_without_host_is_rejected() {
        assert_eq!(resolve("GET /a.txt HTTP/1.1\r\n\r\n"), Err(Rejection::BadRequest));
        assert_eq!(resolve("GET /a.txt HTTP/1.1\r\nHost:\r\n\r\n"), Err(Rejection::BadRequest));
        assert_eq!(resolve("GET * HTTP/1.1\r\nHost: a\r\n\r\n"), Err(Rejection::BadRequest));
        assert_eq!(resolve("GET http:// HTTP/1.1\r\n\r\n"), Err(Rejection::BadRequest));
    }

    #[test]
    fn path_and_query_are_forwarded_as_sent() {
        let cases: [(&[u8], &str); 5] = [
            (b"GET http://example.test/a/../b HTTP/1.1\r\n\r\n", "/a/../b"),
            (b"GET http://example.test/x?q='v' HTTP/1.1\r\n\r\n", "/x?q='v'"),
            (b"GET http://example.test/{a} HTTP/1.1\r\n\r\n", "/{a}"),
            (b"GET /caf\xe9 HTTP/1.1\r\nHost: example.test\r\n\r\n", "/caf\u{e9}"),
            (b"GET http://example.test?x=1#frag HTTP/1.1\r\n\r\n", "/?x=1"),
        ];
        for (raw, expected) in cases {
            let target = Target::resolve(&parse_request_head(raw).unwrap()).unwrap();
            assert_eq!(target.path_and_query, expected);
        }
    }

    #[test]
    fn latin1_octets_reach_the_origin_unchanged() {
        let request = parse_request_head(b"GET http://example.test/caf\xe9?n=%41 HTTP/1.1\r\n\r\n").unwrap();
        let target = Target::resolve(&request).unwrap();

        let wire = target.origin_request("ua/1", None);
        assert!(wire.starts_with(b"GET /caf\xe9?n=%41 HTTP/1.1\r\n"));
    }

    #[test]
    fn host_header_with_path_characters_is_rejected() {
        assert_eq!(
            resolve("GET /a HTTP/1.1\r\nHost: example.test/evil\r\n\r\n"),
            Err(Rejection::BadRequest)
        );
    }

    #[test]
    fn origin_request_is_conditional_only_with_validator() {
        let target = resolve("GET http://example.test/a.txt HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(
            target.origin_request("ua/1", None),
            b"GET /a.txt HTTP/1.1\r\nHost: example.test\r\nConnection: close\r\nUser-Agent: ua/1\r\n\r\n".to_vec()
        );
        assert_eq!(
            target.origin_request("ua/1", Some("Wed, 01 Jan 2020 00:00:00 GMT")),
            b"GET /a.txt HTTP/1.1\r\nHost: example.test\r\nConnection: close\r\nUser-Agent: ua/1\r\nIf-Modified-Since: Wed, 01 Jan 2020 00:00:00 GMT\r\n\r\n".to_vec()
        );
    }
}
