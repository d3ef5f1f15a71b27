use rmcp::ErrorData as McpError;
use serde_json::Value;
use url::Url;

pub fn validate_http_url(raw: &str) -> Result<Url, McpError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("url must not be empty", None));
    }
    let parsed = Url::parse(trimmed).map_err(|err| {
        McpError::invalid_params("invalid url", Some(Value::String(err.to_string())))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(McpError::invalid_params(
            "only http and https urls are allowed",
            Some(Value::String(format!("scheme: {scheme}"))),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_http_url("http://example.com/a.png").is_ok());
        assert!(validate_http_url(" https://example.com/a.pdf ").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(validate_http_url("").is_err());
        assert!(validate_http_url("ftp://example.com/a").is_err());
        assert!(validate_http_url("not a url").is_err());
    }
}
