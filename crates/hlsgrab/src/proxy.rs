use reqwest::Proxy;

use crate::DownloadError;

/// Proxy configuration types
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProxyType {
    /// HTTP proxy
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy
    Socks5,
    /// All protocols proxy (use this for general-purpose proxies)
    All,
}

/// Proxy authentication type
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Transport-level proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy server URL (e.g., "http://proxy.example.com:8080")
    pub url: String,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

/// Build a reqwest Proxy object from our proxy configuration
pub fn build_proxy_from_config(config: &ProxyConfig) -> Result<Proxy, DownloadError> {
    let proxy_url = &config.url;
    let invalid = |kind: &str, e: reqwest::Error| {
        DownloadError::ProxyError(format!("Invalid {kind} proxy URL {proxy_url}: {e}"))
    };

    let mut proxy = match config.proxy_type {
        ProxyType::Http => Proxy::http(proxy_url).map_err(|e| invalid("HTTP", e))?,
        ProxyType::Https => Proxy::https(proxy_url).map_err(|e| invalid("HTTPS", e))?,
        ProxyType::Socks5 => {
            let url = if proxy_url.starts_with("socks5://") {
                proxy_url.to_string()
            } else {
                format!("socks5://{proxy_url}")
            };
            Proxy::all(&url).map_err(|e| invalid("SOCKS5", e))?
        }
        ProxyType::All => Proxy::all(proxy_url).map_err(|e| invalid("catch-all", e))?,
    };

    if let Some(auth) = &config.auth {
        proxy = proxy.basic_auth(&auth.username, &auth.password);
    }

    Ok(proxy)
}

/// A relay ("URL prefix") proxy.
///
/// Outgoing URLs are rewritten to `{base}{percent-encoded original URL}`,
/// which is how CORS-style relays expect to receive their target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRewrite {
    base: String,
}

impl UrlRewrite {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn apply(&self, original: &str) -> String {
        format!("{}{}", self.base, urlencoding::encode(original))
    }
}

/// Relay proxy toggle and base URL for one resource class.
///
/// Both fields are optional so that a user-provided setting can be layered
/// over a system-provided default, see [`RelaySetting::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySetting {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
}

impl RelaySetting {
    pub fn enabled_with(base_url: impl Into<String>) -> Self {
        Self {
            enabled: Some(true),
            base_url: Some(base_url.into()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            base_url: None,
        }
    }

    /// Resolves the effective rewrite for this class.
    ///
    /// Explicit user values win over the system default field by field; an
    /// absent user value falls back to the default. Enabled without any
    /// usable base URL resolves to no rewrite.
    pub fn resolve(user: &RelaySetting, system_default: &RelaySetting) -> Option<UrlRewrite> {
        let enabled = user.enabled.or(system_default.enabled).unwrap_or(false);
        if !enabled {
            return None;
        }

        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        non_empty(&user.base_url)
            .or_else(|| non_empty(&system_default.base_url))
            .map(UrlRewrite::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_percent_encodes_original() {
        let rewrite = UrlRewrite::new("https://relay.example/?url=");
        assert_eq!(
            rewrite.apply("http://cdn/p/a.ts?x=1&y=2"),
            "https://relay.example/?url=http%3A%2F%2Fcdn%2Fp%2Fa.ts%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_user_setting_overrides_default() {
        let system = RelaySetting::enabled_with("https://system/");
        let user = RelaySetting::enabled_with("https://user/");
        assert_eq!(
            RelaySetting::resolve(&user, &system),
            Some(UrlRewrite::new("https://user/"))
        );

        let user_disabled = RelaySetting::disabled();
        assert_eq!(RelaySetting::resolve(&user_disabled, &system), None);
    }

    #[test]
    fn test_missing_user_setting_falls_back() {
        let system = RelaySetting::enabled_with("https://system/");
        assert_eq!(
            RelaySetting::resolve(&RelaySetting::default(), &system),
            Some(UrlRewrite::new("https://system/"))
        );

        // enabled by the user, base url only provided by the system
        let user = RelaySetting {
            enabled: Some(true),
            base_url: None,
        };
        let system_url_only = RelaySetting {
            enabled: Some(false),
            base_url: Some("https://system/".into()),
        };
        assert_eq!(
            RelaySetting::resolve(&user, &system_url_only),
            Some(UrlRewrite::new("https://system/"))
        );
    }

    #[test]
    fn test_enabled_without_base_is_noop() {
        let user = RelaySetting {
            enabled: Some(true),
            base_url: Some("   ".into()),
        };
        assert_eq!(RelaySetting::resolve(&user, &RelaySetting::default()), None);
    }

    #[test]
    fn test_socks5_scheme_is_added() {
        let config = ProxyConfig {
            url: "127.0.0.1:1080".to_string(),
            proxy_type: ProxyType::Socks5,
            auth: None,
        };
        assert!(build_proxy_from_config(&config).is_ok());
    }
}
