use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::info;

/// Parse a header string in format "Name: Value" and add it to the HeaderMap
pub fn parse_and_add_header(headers: &mut HeaderMap, header_str: &str) {
    let Some((name, value)) = header_str.split_once(':') else {
        tracing::warn!(
            "Invalid header format: '{}'. Expected 'Name: Value'",
            header_str
        );
        return;
    };

    let (name, value) = (name.trim(), value.trim());

    let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
        tracing::warn!("Invalid header name: '{}'", name);
        return;
    };

    let Ok(header_value) = HeaderValue::from_str(value) else {
        tracing::warn!("Invalid header value: '{}'", value);
        return;
    };

    info!("Adding header: {}: {}", name, value);
    headers.insert(header_name, header_value);
}

/// Merge header strings into `headers`, later entries win
pub fn merge_headers(headers: &mut HeaderMap, header_strings: &[String]) {
    for header_str in header_strings {
        parse_and_add_header(headers, header_str);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_headers() {
        let mut headers = HeaderMap::new();
        merge_headers(
            &mut headers,
            &[
                "X-Session: abc".to_string(),
                "missing-colon".to_string(),
                "Authorization: Bearer t0k3n".to_string(),
            ],
        );

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-session").unwrap(), "abc");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer t0k3n");
    }
}
