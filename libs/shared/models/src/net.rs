use axum::http::HeaderMap;

/// Client IP derivation, trusting proxy headers in a fixed precedence:
/// `cf-connecting-ip`, then `x-real-ip`, then the first `x-forwarded-for`
/// entry, falling back to `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()) {
        return ip.trim().to_string();
    }
    if let Some(ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return ip.trim().to_string();
    }
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    "unknown".to_string()
}

/// Session identifier from `Authorization: Bearer <id>` or the `session`
/// cookie, in that order.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    let cookies = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    for cookie in cookies.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix("session=") {
            return Some(value.to_string());
        }
    }
    None
}

/// CSRF token from `x-csrf-token` or `csrf-token`.
pub fn csrf_token(headers: &HeaderMap) -> Option<String> {
    for name in ["x-csrf-token", "csrf-token"] {
        if let Some(token) = headers.get(name).and_then(|v| v.to_str().ok()) {
            return Some(token.to_string());
        }
    }
    None
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ip_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.1.1.1, 2.2.2.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("3.3.3.3"));
        assert_eq!(client_ip(&headers), "3.3.3.3");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("4.4.4.4"));
        assert_eq!(client_ip(&headers), "4.4.4.4");

        headers.remove("cf-connecting-ip");
        headers.remove("x-real-ip");
        assert_eq!(client_ip(&headers), "1.1.1.1");

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers), "unknown");
    }

    #[test]
    fn session_sources() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; session=abc123"));
        assert_eq!(session_id(&headers).as_deref(), Some("abc123"));

        headers.insert("authorization", HeaderValue::from_static("Bearer def456"));
        assert_eq!(session_id(&headers).as_deref(), Some("def456"));
    }
}
