//! Authentication headers for the JIRA API.
//!
//! Cloud instances use Basic Auth (email + API token); Server/Data Center
//! instances accept a personal access token as a Bearer credential.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Authentication credentials for JIRA.
#[derive(Clone)]
pub struct Auth {
    /// The identity the credential belongs to, for logging.
    principal: String,
    /// The complete `Authorization` header value.
    auth_header: String,
}

impl Auth {
    /// Create Basic Auth credentials from email and API token.
    ///
    /// The token is immediately encoded and the raw token is not stored.
    pub fn basic(email: &str, token: &str) -> Self {
        Self {
            principal: email.to_string(),
            auth_header: build_basic_header(email, token),
        }
    }

    /// Create Bearer credentials from a personal access token.
    pub fn bearer(token: &str) -> Self {
        Self {
            principal: "<personal access token>".to_string(),
            auth_header: format!("Bearer {}", token),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Get the principal (email or token marker).
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

/// Encode "email:token" in Base64 and prepend "Basic ".
fn build_basic_header(email: &str, token: &str) -> String {
    let credentials = format!("{}:{}", email, token);
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_basic_header() {
        let header = build_basic_header("user@example.com", "api_token_here");
        assert!(header.starts_with("Basic "));

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = BASE64.decode(encoded).unwrap();
        let decoded_str = String::from_utf8(decoded).unwrap();
        assert_eq!(decoded_str, "user@example.com:api_token_here");
    }

    #[test]
    fn test_bearer_header() {
        let auth = Auth::bearer("pat-123");
        assert_eq!(auth.header_value(), "Bearer pat-123");
    }

    #[test]
    fn test_auth_does_not_expose_token() {
        let auth = Auth::basic("user@example.com", "secret_token");
        let debug_output = format!("{:?}", auth);

        assert!(debug_output.contains("user@example.com"));
        assert!(!debug_output.contains("secret_token"));
        assert!(!debug_output.contains(auth.header_value()));
    }
}
