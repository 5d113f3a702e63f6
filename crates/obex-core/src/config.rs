use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Site root used to resolve relative links in the listing.
pub const DEFAULT_BASE_URL: &str = "http://obex.parallax.com";

/// Listing page with every project on it; the site needs these query
/// parameters to return them all at once.
pub const LISTING_PAGE_URL: &str =
    "http://obex.parallax.com/projects/?field_category_tid=All&items_per_page=All";

/// How a record's payload is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// GET the derived download URL and save the body as one file.
    #[default]
    Direct,
    /// GET the detail page and save every file in its attachment table.
    Attachments,
}

/// HTTP client parameters (optional `[http]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole request, body included.
    pub timeout_secs: u64,
    pub max_redirections: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 120,
            max_redirections: 10,
            user_agent: concat!("obex-dl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/obex-dl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObexConfig {
    /// Base URL for relative detail links.
    pub base_url: String,
    /// Path segment appended to a detail URL to form its download URL.
    pub download_endpoint: String,
    /// Listing page fetched when no saved copy is used.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default)]
    pub mode: DownloadMode,
    /// Unpack zip payloads after download.
    #[serde(default)]
    pub extract_archives: bool,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_listing_url() -> String {
    LISTING_PAGE_URL.to_string()
}

impl Default for ObexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            download_endpoint: "download".to_string(),
            listing_url: default_listing_url(),
            mode: DownloadMode::Direct,
            extract_archives: false,
            http: HttpConfig::default(),
        }
    }
}

impl ObexConfig {
    /// Parsed `base_url`; rejects values that cannot serve as a join base.
    pub fn base(&self) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("base_url {:?} cannot be used to resolve links", self.base_url);
        }
        Ok(base)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("obex-dl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ObexConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ObexConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load an explicit config file. Missing files are an error here.
pub fn load_from_path(path: &Path) -> Result<ObexConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ObexConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.base()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ObexConfig::default();
        assert_eq!(cfg.base_url, "http://obex.parallax.com");
        assert_eq!(cfg.download_endpoint, "download");
        assert_eq!(cfg.mode, DownloadMode::Direct);
        assert!(!cfg.extract_archives);
        assert_eq!(cfg.http.connect_timeout_secs, 15);
        assert!(cfg.http.user_agent.starts_with("obex-dl/"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ObexConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ObexConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_url, cfg.base_url);
        assert_eq!(parsed.http.timeout_secs, cfg.http.timeout_secs);
        assert_eq!(parsed.mode, cfg.mode);
    }

    #[test]
    fn config_toml_minimal_uses_defaults() {
        let toml = r#"
            base_url = "https://mirror.example.org/obex/"
            download_endpoint = "get"
        "#;
        let cfg: ObexConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.download_endpoint, "get");
        assert_eq!(cfg.mode, DownloadMode::Direct);
        assert_eq!(cfg.listing_url, LISTING_PAGE_URL);
        assert_eq!(cfg.http.max_redirections, 10);
    }

    #[test]
    fn config_toml_mode_and_http() {
        let toml = r#"
            base_url = "http://obex.parallax.com"
            download_endpoint = "download"
            mode = "attachments"
            extract_archives = true

            [http]
            connect_timeout_secs = 5
            timeout_secs = 30
            max_redirections = 3
            user_agent = "test-agent"
        "#;
        let cfg: ObexConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.mode, DownloadMode::Attachments);
        assert!(cfg.extract_archives);
        assert_eq!(cfg.http.timeout_secs, 30);
        assert_eq!(cfg.http.user_agent, "test-agent");
    }

    #[test]
    fn partial_http_section_fills_defaults() {
        let toml = r#"
            base_url = "http://obex.parallax.com"
            download_endpoint = "download"

            [http]
            timeout_secs = 600
        "#;
        let cfg: ObexConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.http.timeout_secs, 600);
        assert_eq!(cfg.http.connect_timeout_secs, 15);
    }

    #[test]
    fn load_from_path_rejects_bad_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"mailto:someone@example.com\"\ndownload_endpoint = \"download\"\n",
        )
        .unwrap();
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn load_from_path_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.toml")).is_err());
    }
}
