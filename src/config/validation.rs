use crate::config::types::{Config, CrawlConfig, OcrConfig, OutputConfig, UploadConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_upload_config(&config.upload)?;
    validate_ocr_config(&config.ocr)?;

    // Endpoint derivation doubles as base-url validation
    config.portal.endpoints()?;

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 10_000 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 10000, got {}",
            config.page_size
        )));
    }

    if config.session_reset_rows < 1 {
        return Err(ConfigError::Validation(format!(
            "session-reset-rows must be >= 1, got {}",
            config.session_reset_rows
        )));
    }

    if config.captcha_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "captcha-attempts must be >= 1, got {}",
            config.captcha_attempts
        )));
    }

    if config.refresh_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "refresh-attempts must be >= 1, got {}",
            config.refresh_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.progress_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "progress-path cannot be empty".to_string(),
        ));
    }

    if config.court_codes_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "court-codes-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates upload configuration
fn validate_upload_config(config: &UploadConfig) -> Result<(), ConfigError> {
    if config.enabled && config.prefix.is_empty() {
        return Err(ConfigError::Validation(
            "upload prefix cannot be empty when upload is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates OCR engine configuration
fn validate_ocr_config(config: &OcrConfig) -> Result<(), ConfigError> {
    if config.command.is_empty() {
        return Err(ConfigError::Validation(
            "ocr command cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::PortalConfig;
    use std::path::PathBuf;

    fn base_config() -> Config {
        Config {
            crawl: CrawlConfig::default(),
            portal: PortalConfig {
                base_url: "https://judgments.example.gov.in".to_string(),
            },
            output: OutputConfig {
                data_dir: PathBuf::from("./data"),
                progress_path: PathBuf::from("./track.json"),
                court_codes_path: PathBuf::from("./court-codes.json"),
                captcha_tmp_dir: PathBuf::from("/tmp/captcha"),
            },
            upload: UploadConfig::default(),
            ocr: OcrConfig::default(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = base_config();
        config.crawl.page_size = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_reset_rows() {
        let mut config = base_config();
        config.crawl.session_reset_rows = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = base_config();
        config.portal.base_url = "::not a url::".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_upload_prefix() {
        let mut config = base_config();
        config.upload.enabled = true;
        config.upload.prefix = String::new();
        assert!(validate(&config).is_err());
    }
}
