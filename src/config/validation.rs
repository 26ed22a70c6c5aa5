use crate::config::types::{
    BrowserConfig, Config, CrawlConfig, MarkupConfig, OutputConfig, PrintConfig, SiteConfig,
    VerifyConfig,
};
use crate::url::parse_canonical;
use crate::{ConfigError, ConfigResult, UrlError};
use scraper::Selector;

/// Upper bound on verification retries per artifact
const MAX_RETRY_ATTEMPTS: u32 = 5;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_browser_config(&config.browser)?;
    validate_crawl_config(&config.crawl)?;
    validate_verify_config(&config.verify)?;
    validate_markup_config(&config.markup)?;
    validate_print_config(&config.print)?;
    Ok(())
}

/// Validates the start URL
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    parse_canonical(&config.start_url).map_err(|e| match e {
        UrlError::Parse(message) => ConfigError::InvalidUrl(format!(
            "Invalid start-url '{}': {}",
            config.start_url, message
        )),
        UrlError::InvalidScheme(_) => ConfigError::Validation(format!(
            "start-url '{}' must use http or https",
            config.start_url
        )),
    })?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.hierarchy_log.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "hierarchy-log cannot be empty".to_string(),
        ));
    }

    if config.debug_tree.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "debug-tree cannot be empty".to_string(),
        ));
    }

    if let Some(merged) = &config.merged_file {
        if merged.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "merged-file cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates browser timeouts
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.expansion_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "expansion-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be > 0".to_string(),
        ));
    }

    if config.poll_interval_ms > config.expansion_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms ({}) cannot exceed expansion-timeout-ms ({})",
            config.poll_interval_ms, config.expansion_timeout_ms
        )));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(
            "window dimensions must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if !config.indent_tolerance_px.is_finite() || config.indent_tolerance_px < 0.0 {
        return Err(ConfigError::Validation(format!(
            "indent-tolerance-px must be a non-negative number, got {}",
            config.indent_tolerance_px
        )));
    }

    Ok(())
}

fn validate_verify_config(config: &VerifyConfig) -> Result<(), ConfigError> {
    if config.retry_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be between 0 and {}, got {}",
            MAX_RETRY_ATTEMPTS, config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates the markup vocabulary
fn validate_markup_config(config: &MarkupConfig) -> Result<(), ConfigError> {
    Selector::parse(&config.root).map_err(|e| {
        ConfigError::InvalidSelector(format!("markup root '{}': {:?}", config.root, e))
    })?;

    for (key, value) in [
        ("section-class", &config.section_class),
        ("title-class", &config.title_class),
        ("content-class", &config.content_class),
        ("active-class", &config.active_class),
        ("collapsed-icon-class", &config.collapsed_icon_class),
    ] {
        validate_name(key, value)?;
    }

    validate_name("collapsed-attribute", &config.collapsed_attribute)?;
    validate_name("deferred-attribute", &config.deferred_attribute)?;

    Ok(())
}

/// Class and attribute names must be single, non-empty tokens
fn validate_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{} must be a single name, got '{}'",
            key, value
        )));
    }

    Ok(())
}

fn validate_print_config(config: &PrintConfig) -> Result<(), ConfigError> {
    if !config.margin_cm.is_finite() || config.margin_cm < 0.0 {
        return Err(ConfigError::Validation(format!(
            "margin-cm must be a non-negative number, got {}",
            config.margin_cm
        )));
    }

    if config.content_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "content-selectors needs at least one selector".to_string(),
        ));
    }

    Ok(())
}
