//! Upstream endpoint configuration.

use std::time::Duration;

/// Browser user agent sent to the quote providers; some of them reject
/// requests without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Endpoints and deadlines for the four upstream sources.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// CFETS central parity history (onshore primary).
    pub onshore_primary_url: String,
    /// Sina USD/CNY quote feed (onshore fallback).
    pub onshore_fallback_url: String,
    /// Sina USD/CNH quote feed (offshore primary).
    pub offshore_primary_url: String,
    /// Juhe exchange list (offshore fallback).
    pub offshore_fallback_url: String,
    /// Deadline for both onshore legs.
    pub onshore_timeout: Duration,
    /// Deadline for the offshore primary feed.
    pub offshore_primary_timeout: Duration,
    /// Deadline for the offshore fallback.
    pub offshore_fallback_timeout: Duration,
    /// User agent header for every upstream request.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            onshore_primary_url: "https://www.chinamoney.com.cn/ags/ms/cm-u-bk-ccpr/CcprHisNew"
                .to_string(),
            onshore_fallback_url: "https://hq.sinajs.cn/list=fx_susdcny".to_string(),
            offshore_primary_url: "https://hq.sinajs.cn/list=fx_susdcnh".to_string(),
            offshore_fallback_url: "http://web.juhe.cn:8080/finance/exchange/fx".to_string(),
            onshore_timeout: Duration::from_secs(10),
            offshore_primary_timeout: Duration::from_secs(5),
            offshore_fallback_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Point every source at the same base URL. Used to aim the service at a
    /// local stand-in for the real providers.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            onshore_primary_url: format!("{base}/ccpr"),
            onshore_fallback_url: format!("{base}/sina/fx_susdcny"),
            offshore_primary_url: format!("{base}/sina/fx_susdcnh"),
            offshore_fallback_url: format!("{base}/juhe"),
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        let urls = [
            ("onshore primary", &self.onshore_primary_url),
            ("onshore fallback", &self.onshore_fallback_url),
            ("offshore primary", &self.offshore_primary_url),
            ("offshore fallback", &self.offshore_fallback_url),
        ];

        for (name, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{name} URL must be http(s): {url:?}"));
            }
        }

        let timeouts = [
            self.onshore_timeout,
            self.offshore_primary_timeout,
            self.offshore_fallback_timeout,
        ];
        if timeouts.iter().any(Duration::is_zero) {
            return Err("Upstream timeouts cannot be zero".to_string());
        }

        Ok(())
    }
}
