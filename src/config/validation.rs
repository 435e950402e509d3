use crate::config::CrawlConfig;
use crate::ConfigError;

/// Validates and normalizes a crawl configuration in place
///
/// Out-of-range pacing knobs are clamped rather than rejected, matching how
/// the crawl loop expects them: a zero wave size or a zero rate would stall
/// the run forever.
pub fn validate(config: &mut CrawlConfig) -> Result<(), ConfigError> {
    if config.seed_url.trim().is_empty() {
        return Err(ConfigError::InvalidSeed("seed URL is empty".to_string()));
    }

    if config.max_pages == 0 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.concurrency == 0 {
        config.concurrency = 1;
    }

    if !config.rate_rps.is_finite() || config.rate_rps < 0.1 {
        config.rate_rps = 0.1;
    }

    Ok(())
}
