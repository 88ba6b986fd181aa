//! Request metadata for spam classification

use axum::http::{HeaderMap, header};
use confbook_core::messaging::RequestContext;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client address as reported by the proxy in front of us
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, FORWARDED_FOR)
        .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_value(headers, REAL_IP))
}

/// Build the classification context of a submission
pub fn request_context(headers: &HeaderMap, permalink: String) -> RequestContext {
    RequestContext {
        user_ip: client_ip(headers),
        user_agent: header_value(headers, header::USER_AGENT),
        referrer: header_value(headers, header::REFERER),
        permalink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_first_forwarded_address_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert(REAL_IP, HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(header::REFERER, HeaderValue::from_static("http://localhost/en/"));

        let context = request_context(&headers, "http://localhost/en/conference/paris-2023".into());
        assert_eq!(context.user_ip, None);
        assert_eq!(context.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(context.referrer.as_deref(), Some("http://localhost/en/"));
        assert_eq!(context.permalink, "http://localhost/en/conference/paris-2023");
    }
}
