use crate::config::types::{
    Config, CrawlOptions, OutputConfig, PolitenessConfig, RetryConfig, ScrapeOptions,
    UserAgentConfig,
};
use crate::governor::MAX_CRAWL_DELAY;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_options(&config.crawler)?;
    validate_scrape_options(&config.scrape)?;
    validate_politeness(&config.politeness)?;
    validate_retry(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Compiles URL filter patterns, rejecting the first one that is not a valid regex
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
        })
        .collect()
}

/// Validates crawl options
///
/// An empty start URL is accepted here because the CLI can run single fetches
/// without ever starting a crawl.
pub(crate) fn validate_crawl_options(options: &CrawlOptions) -> Result<(), ConfigError> {
    if !options.start_url.is_empty() {
        let url = Url::parse(&options.start_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", options.start_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "start_url '{}' must use HTTP or HTTPS",
                options.start_url
            )));
        }
    }

    if options.max_pages == 0 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if options.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "crawler timeout_ms must be > 0".to_string(),
        ));
    }

    compile_patterns(&options.skip_patterns)?;
    compile_patterns(&options.include_patterns)?;

    Ok(())
}

fn validate_scrape_options(options: &ScrapeOptions) -> Result<(), ConfigError> {
    if options.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "scrape timeout_ms must be > 0".to_string(),
        ));
    }

    if options.follow_pagination && options.max_pages == 0 {
        return Err(ConfigError::Validation(
            "scrape max_pages must be >= 1 when follow_pagination is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Rejects rates whose request spacing would exceed `MAX_CRAWL_DELAY`,
/// and default crawl delays that are not finite or exceed it
fn validate_politeness(config: &PolitenessConfig) -> Result<(), ConfigError> {
    let max_delay = MAX_CRAWL_DELAY.as_secs_f64();
    let rate = config.requests_per_second;
    if !rate.is_finite() || rate < 1.0 / max_delay {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be a finite number >= {:.6} (one request per {}s), got {}",
            1.0 / max_delay,
            max_delay,
            rate
        )));
    }

    if config.burst_size == 0 {
        return Err(ConfigError::Validation(
            "burst_size must be >= 1".to_string(),
        ));
    }

    let delay = config.default_crawl_delay_secs;
    if !delay.is_finite() || !(0.0..=max_delay).contains(&delay) {
        return Err(ConfigError::Validation(format!(
            "default_crawl_delay_secs must be between 0 and {}, got {}",
            max_delay, delay
        )));
    }

    Ok(())
}

fn validate_retry(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_delay_ms > 30_000 {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms is capped at 30000, got {}",
            config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Basic email validation: exactly one `@`, text on both sides, a dot in the domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        )))
    }
}
