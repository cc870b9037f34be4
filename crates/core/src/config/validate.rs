use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - A subreddit and an allowed URL prefix are set
/// - Target dimensions, if any, are non-zero and even (yuv420p output)
/// - Ratio tolerance and max duration are positive
/// - The daily upload cap is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.reddit.subreddit.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "reddit.subreddit cannot be empty".to_string(),
        ));
    }

    if config.reddit.allowed_url_prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "reddit.allowed_url_prefix cannot be empty".to_string(),
        ));
    }

    if let Some(dimensions) = config.video.dimensions {
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "video.dimensions must be non-zero, got {}",
                dimensions
            )));
        }
        if dimensions.width % 2 != 0 || dimensions.height % 2 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "video.dimensions must be even for yuv420p output, got {}",
                dimensions
            )));
        }
    }

    if config.video.ratio_tolerance <= 0.0 {
        return Err(ConfigError::ValidationError(
            "video.ratio_tolerance must be positive".to_string(),
        ));
    }

    if config.video.max_duration_secs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "video.max_duration_secs must be positive".to_string(),
        ));
    }

    if config.pipeline.daily_upload_cap == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.daily_upload_cap cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, Resolution};

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[reddit]
subreddit = "funny"
client_id = "id"
client_secret = "secret"
username = "user"
password = "pass"
user_agent = "ua"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_empty_subreddit_fails() {
        let mut config = valid_config();
        config.reddit.subreddit = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_dimension_fails() {
        let mut config = valid_config();
        config.video.dimensions = Some(Resolution::new(1080, 0));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_odd_dimension_fails() {
        let mut config = valid_config();
        config.video.dimensions = Some(Resolution::new(1081, 1920));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("even"));

        config.video.dimensions = Some(Resolution::new(1080, 1919));
        assert!(validate_config(&config).is_err());

        config.video.dimensions = Some(Resolution::new(1080, 1920));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_cap_fails() {
        let mut config = valid_config();
        config.pipeline.daily_upload_cap = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_non_positive_tolerance_fails() {
        let mut config = valid_config();
        config.video.ratio_tolerance = 0.0;
        assert!(validate_config(&config).is_err());
    }
}
