use crate::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub portal: PortalConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Rows requested per search page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Successful rows between forced session re-initializations
    #[serde(rename = "session-reset-rows", default = "default_session_reset_rows")]
    pub session_reset_rows: u32,

    /// Challenge fetch/recognize attempts before giving up on a captcha
    #[serde(rename = "captcha-attempts", default = "default_captcha_attempts")]
    pub captcha_attempts: u32,

    /// Token refresh cycles before a request is declared expired
    #[serde(rename = "refresh-attempts", default = "default_refresh_attempts")]
    pub refresh_attempts: u32,

    /// First date ever crawled when the tracker has no record for a court
    #[serde(rename = "epoch-start", default = "default_epoch_start")]
    pub epoch_start: NaiveDate,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Portal location configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the judgment portal
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Output location configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory PDF and metadata artifacts are written under
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,

    /// Path of the persisted progress mapping
    #[serde(rename = "progress-path")]
    pub progress_path: PathBuf,

    /// Path of the court code -> display name lookup (JSON)
    #[serde(rename = "court-codes-path")]
    pub court_codes_path: PathBuf,

    /// Scratch directory for in-flight captcha images
    #[serde(rename = "captcha-tmp-dir", default = "default_captcha_tmp_dir")]
    pub captcha_tmp_dir: PathBuf,
}

/// Object-store upload configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UploadConfig {
    /// Whether artifacts are pushed to the object store after local persistence
    #[serde(default)]
    pub enabled: bool,

    /// Key prefix segment, e.g. "highcourt"
    #[serde(default = "default_upload_prefix")]
    pub prefix: String,
}

/// Text-recognition engine configuration
///
/// The engine is invoked as `<command> <image-path> <args...>`; each
/// non-empty stdout line is one candidate reading.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_command")]
    pub command: String,
    #[serde(default = "default_ocr_args")]
    pub args: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
            args: default_ocr_args(),
        }
    }
}

/// Resolved endpoint set for one portal
///
/// All endpoints hang off the configured base URL; the paths and query
/// strings are fixed by the portal's request protocol.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Portal root, used to resolve relative output-file paths
    pub root: Url,
    /// Search page base; also the page fetched to establish a session
    pub search_home: Url,
    /// Paginated search API
    pub search: Url,
    /// Challenge image for the current session
    pub captcha_image: Url,
    /// Token issuance in exchange for a solved challenge
    pub token: Url,
    /// PDF-link resolution (may respond with an embedded challenge)
    pub pdf_link: Url,
    /// PDF-link resolution carrying a solved challenge answer
    pub pdf_link_solved: Url,
}

impl PortalConfig {
    /// Derives the full endpoint set from the base URL
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let root = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        // A parsed bare-host URL renders with a trailing slash; normalize so
        // the joined endpoint paths come out clean.
        let base = root.as_str().trim_end_matches('/').to_string();
        let parse = |s: String| {
            Url::parse(&s).map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))
        };
        Ok(Endpoints {
            search_home: parse(format!("{}/pdfsearch/", base))?,
            search: parse(format!("{}/pdfsearch/?p=pdf_search/home/", base))?,
            captcha_image: parse(format!(
                "{}/pdfsearch/vendor/securimage/securimage_show.php",
                base
            ))?,
            token: parse(format!("{}/pdfsearch/?p=pdf_search/checkCaptcha", base))?,
            pdf_link: parse(format!("{}/pdfsearch/?p=pdf_search/openpdfcaptcha", base))?,
            pdf_link_solved: parse(format!("{}/pdfsearch/?p=pdf_search/openpdf", base))?,
            root,
        })
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            session_reset_rows: default_session_reset_rows(),
            captcha_attempts: default_captcha_attempts(),
            refresh_attempts: default_refresh_attempts(),
            epoch_start: default_epoch_start(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_page_size() -> u32 {
    1000
}

fn default_session_reset_rows() -> u32 {
    25
}

fn default_captcha_attempts() -> u32 {
    5
}

fn default_refresh_attempts() -> u32 {
    3
}

fn default_epoch_start() -> NaiveDate {
    // The portal publishes judgments from 2008 onwards.
    NaiveDate::from_ymd_opt(2008, 1, 1).unwrap()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_captcha_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("ecourts-captcha-tmp")
}

fn default_upload_prefix() -> String {
    "highcourt".to_string()
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_args() -> Vec<String> {
    vec!["stdout".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_base_url() {
        let portal = PortalConfig {
            base_url: "https://judgments.example.gov.in".to_string(),
        };
        let eps = portal.endpoints().unwrap();

        assert_eq!(
            eps.search.as_str(),
            "https://judgments.example.gov.in/pdfsearch/?p=pdf_search/home/"
        );
        assert_eq!(
            eps.captcha_image.as_str(),
            "https://judgments.example.gov.in/pdfsearch/vendor/securimage/securimage_show.php"
        );
        assert_eq!(
            eps.token.as_str(),
            "https://judgments.example.gov.in/pdfsearch/?p=pdf_search/checkCaptcha"
        );
    }

    #[test]
    fn test_endpoints_trailing_slash() {
        let portal = PortalConfig {
            base_url: "https://judgments.example.gov.in/".to_string(),
        };
        let eps = portal.endpoints().unwrap();
        assert_eq!(
            eps.search_home.as_str(),
            "https://judgments.example.gov.in/pdfsearch/"
        );
    }

    #[test]
    fn test_endpoints_invalid_base() {
        let portal = PortalConfig {
            base_url: "not a url".to_string(),
        };
        assert!(portal.endpoints().is_err());
    }

    #[test]
    fn test_crawl_defaults() {
        let crawl = CrawlConfig::default();
        assert_eq!(crawl.page_size, 1000);
        assert_eq!(crawl.session_reset_rows, 25);
        assert_eq!(crawl.captcha_attempts, 5);
        assert_eq!(crawl.epoch_start, NaiveDate::from_ymd_opt(2008, 1, 1).unwrap());
    }
}
