//! Connection settings for a Supabase project.

use std::time::Duration;

/// Default HTTP request timeout
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Where the project lives and how to authenticate
#[derive(Clone)]
pub struct SupabaseConfig {
    url: String,
    anon_key: String,
    access_token: Option<String>,
    http_timeout: Duration,
}

impl SupabaseConfig {
    /// Project URL (for example `https://abc.supabase.co`) and public key
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Authenticate as a signed-in user instead of anonymously
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Override the HTTP request timeout
    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Project base URL, without trailing slash
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Public API key
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// HTTP request timeout
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Token for `Authorization: Bearer`; the anon key when signed out
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    /// PostgREST endpoint for a table
    #[must_use]
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    /// Realtime websocket endpoint
    #[must_use]
    pub fn realtime_url(&self) -> String {
        let base = if let Some(host) = self.url.strip_prefix("https://") {
            format!("wss://{host}")
        } else if let Some(host) = self.url.strip_prefix("http://") {
            format!("ws://{host}")
        } else {
            self.url.clone()
        };
        format!(
            "{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            urlencoding::encode(&self.anon_key)
        )
    }
}

// Keys never reach logs
impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let config = SupabaseConfig::new("https://abc.supabase.co/", "anon");
        assert_eq!(config.bearer(), "anon");
        assert_eq!(config.with_access_token("jwt").bearer(), "jwt");
    }

    #[test]
    fn test_urls() {
        let config = SupabaseConfig::new("https://abc.supabase.co/", "a+b");
        assert_eq!(config.rest_url("bookings"), "https://abc.supabase.co/rest/v1/bookings");
        assert_eq!(
            config.realtime_url(),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=a%2Bb&vsn=1.0.0"
        );

        let local = SupabaseConfig::new("http://127.0.0.1:54321", "key");
        assert!(local.realtime_url().starts_with("ws://127.0.0.1:54321/realtime/v1/websocket"));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = SupabaseConfig::new("https://abc.supabase.co", "secret-anon")
            .with_access_token("secret-jwt");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }
}
