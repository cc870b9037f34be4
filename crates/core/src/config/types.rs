use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Verbose logging (same effect as the debug start mode).
    #[serde(default)]
    pub debug: bool,
    pub reddit: RedditConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub folders: FoldersConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Target frame size of a rendered clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for [u32; 2] {
    fn from(r: Resolution) -> Self {
        [r.width, r.height]
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Reddit source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedditConfig {
    /// Subreddit to read from. Several can be combined with '+', e.g. "funny+cars".
    pub subreddit: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    /// Maximum number of posts pulled from the listing (default: 99).
    #[serde(default = "default_listing_limit")]
    pub listing_limit: u32,
    /// Listing time window (hour, day, week, month, year, all).
    #[serde(default = "default_time_filter")]
    pub time_filter: String,
    /// Only posts whose URL starts with this prefix are candidates.
    #[serde(default = "default_allowed_url_prefix")]
    pub allowed_url_prefix: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_listing_limit() -> u32 {
    99
}

fn default_time_filter() -> String {
    "week".to_string()
}

fn default_allowed_url_prefix() -> String {
    "https://v.redd.it".to_string()
}

fn default_auth_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_api_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Dedup record location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("database.txt")
}

/// YouTube publishing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category id (23 = Comedy).
    #[serde(default = "default_category")]
    pub category: u32,
    /// public, private or unlisted
    #[serde(default = "default_privacy")]
    pub privacy: Privacy,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_client_secrets_file")]
    pub client_secrets_file: PathBuf,
    /// Stored OAuth credentials, created on first run.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            category: default_category(),
            privacy: default_privacy(),
            description: default_description(),
            client_secrets_file: default_client_secrets_file(),
            credentials_file: default_credentials_file(),
            upload_url: default_upload_url(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }
}

fn default_category() -> u32 {
    23
}

fn default_privacy() -> Privacy {
    Privacy::Public
}

fn default_description() -> String {
    [
        "#shorts, #funny, #reddit, #redditfunny, #redditvideos, #funnyvideos,",
        "#shortsreddit, #shortsfunny, #shortsredditfunny, #shortsredditvideos,",
        "#shortsfunnyvideos, #redditfunnyvideos, #redditshorts, #redditshortsfunny,",
        "#redditshortsvideos, #redditfunnyshorts, #redditfunnyshortsvideos,",
        "#redditvideosshorts, #funnyshorts, #funnyshortsvideos, #funnyvideosshorts,",
        "#shortsfunnyvideos, #shortsredditfunnyvideos, #shortsredditvideosfunny,",
        "#shortsvideosfunny, #shortsvideos",
    ]
    .join(" ")
}

fn default_client_secrets_file() -> PathBuf {
    PathBuf::from("client_secrets.json")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("upload-oauth2.json")
}

fn default_upload_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_upload_timeout() -> u32 {
    600
}

/// Video rendering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    /// Target frame size; absent means upload the original clip as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Resolution>,
    /// Blur the background of clips that don't fit the target ratio.
    #[serde(default)]
    pub blur: bool,
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f64,
    /// Background intensity relative to the original (0.0-1.0).
    #[serde(default = "default_background_brightness")]
    pub background_brightness: f64,
    /// Relative distance from the target ratio still treated as a fit.
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: f64,
    /// Clips this long or longer are not Shorts.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// Timeout for a single render in seconds.
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            dimensions: None,
            blur: false,
            blur_sigma: default_blur_sigma(),
            background_brightness: default_background_brightness(),
            ratio_tolerance: default_ratio_tolerance(),
            max_duration_secs: default_max_duration(),
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_render_timeout(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

fn default_blur_sigma() -> f64 {
    25.0
}

fn default_background_brightness() -> f64 {
    0.1
}

fn default_ratio_tolerance() -> f64 {
    0.05
}

fn default_max_duration() -> f64 {
    60.0
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_render_timeout() -> u64 {
    900 // 15 minutes
}

fn default_log_level() -> String {
    "warning".to_string()
}

/// Working directory layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoldersConfig {
    #[serde(default = "default_base")]
    pub base: PathBuf,
    #[serde(default = "default_download")]
    pub download: String,
    #[serde(default = "default_render")]
    pub render: String,
    #[serde(default = "default_final")]
    pub final_output: String,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            download: default_download(),
            render: default_render(),
            final_output: default_final(),
        }
    }
}

fn default_base() -> PathBuf {
    PathBuf::from("output")
}

fn default_download() -> String {
    "reddit_download".to_string()
}

fn default_render() -> String {
    "render_download".to_string()
}

fn default_final() -> String {
    "final_output".to_string()
}

/// Pacing and quota configuration for a run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Successful publishes allowed per run.
    #[serde(default = "default_daily_cap")]
    pub daily_upload_cap: u32,
    #[serde(default = "default_inter_item_delay")]
    pub inter_item_delay_secs: u64,
    /// Wait after the publishing service refused an upload.
    #[serde(default = "default_api_cooldown")]
    pub api_cooldown_secs: u64,
    /// Wait once the daily cap is reached.
    #[serde(default = "default_quota_cooldown")]
    pub quota_cooldown_secs: u64,
    #[serde(default = "default_render_input_name")]
    pub render_input_name: String,
    #[serde(default = "default_render_output_name")]
    pub render_output_name: String,
    #[serde(default = "default_final_output_name")]
    pub final_output_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            daily_upload_cap: default_daily_cap(),
            inter_item_delay_secs: default_inter_item_delay(),
            api_cooldown_secs: default_api_cooldown(),
            quota_cooldown_secs: default_quota_cooldown(),
            render_input_name: default_render_input_name(),
            render_output_name: default_render_output_name(),
            final_output_name: default_final_output_name(),
        }
    }
}

fn default_daily_cap() -> u32 {
    6
}

fn default_inter_item_delay() -> u64 {
    10
}

fn default_api_cooldown() -> u64 {
    86_400 // 24 hours
}

fn default_quota_cooldown() -> u64 {
    3_600 // 1 hour
}

fn default_render_input_name() -> String {
    "render_input.mp4".to_string()
}

fn default_render_output_name() -> String {
    "render_output.mp4".to_string()
}

fn default_final_output_name() -> String {
    "FINAL_VIDEO.mp4".to_string()
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub debug: bool,
    pub reddit: SanitizedRedditConfig,
    pub database: DatabaseConfig,
    pub youtube: SanitizedYouTubeConfig,
    pub video: VideoConfig,
    pub folders: FoldersConfig,
    pub pipeline: PipelineConfig,
}

/// Sanitized Reddit config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRedditConfig {
    pub subreddit: String,
    pub user_agent: String,
    pub client_id_configured: bool,
    pub client_secret_configured: bool,
    pub username: String,
    pub password_configured: bool,
    pub listing_limit: u32,
    pub time_filter: String,
    pub allowed_url_prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYouTubeConfig {
    pub tags: Vec<String>,
    pub category: u32,
    pub privacy: String,
    pub client_secrets_file: PathBuf,
    pub credentials_file: PathBuf,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            debug: config.debug,
            reddit: SanitizedRedditConfig {
                subreddit: config.reddit.subreddit.clone(),
                user_agent: config.reddit.user_agent.clone(),
                client_id_configured: !config.reddit.client_id.is_empty(),
                client_secret_configured: !config.reddit.client_secret.is_empty(),
                username: config.reddit.username.clone(),
                password_configured: !config.reddit.password.is_empty(),
                listing_limit: config.reddit.listing_limit,
                time_filter: config.reddit.time_filter.clone(),
                allowed_url_prefix: config.reddit.allowed_url_prefix.clone(),
            },
            database: config.database.clone(),
            youtube: SanitizedYouTubeConfig {
                tags: config.youtube.tags.clone(),
                category: config.youtube.category,
                privacy: config.youtube.privacy.as_str().to_string(),
                client_secrets_file: config.youtube.client_secrets_file.clone(),
                credentials_file: config.youtube.credentials_file.clone(),
            },
            video: config.video.clone(),
            folders: config.folders.clone(),
            pipeline: config.pipeline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[reddit]
subreddit = "funny"
client_id = "id"
client_secret = "secret"
username = "user"
password = "pass"
user_agent = "shortsmith/0.1"

[youtube]
tags = ["funny", "shorts", "lol"]
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert!(!config.debug);
        assert_eq!(config.reddit.subreddit, "funny");
        assert_eq!(config.reddit.listing_limit, 99);
        assert_eq!(config.reddit.time_filter, "week");
        assert_eq!(config.reddit.allowed_url_prefix, "https://v.redd.it");
        assert_eq!(config.youtube.category, 23);
        assert_eq!(config.youtube.privacy, Privacy::Public);
        assert_eq!(config.database.path.to_str().unwrap(), "database.txt");
        assert!(config.video.dimensions.is_none());
        assert!(!config.video.blur);
        assert_eq!(config.pipeline.daily_upload_cap, 6);
        assert_eq!(config.pipeline.inter_item_delay_secs, 10);
        assert_eq!(config.folders.download, "reddit_download");
    }

    #[test]
    fn test_deserialize_dimensions() {
        let toml = format!(
            "{}\n[video]\ndimensions = [1080, 1920]\nblur = true\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.video.dimensions, Some(Resolution::new(1080, 1920)));
        assert!(config.video.blur);
        assert_eq!(config.video.blur_sigma, 25.0);
    }

    #[test]
    fn test_deserialize_missing_reddit_fails() {
        let toml = r#"
[youtube]
tags = []
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_privacy_parsing() {
        let toml = format!("{}privacy = \"unlisted\"\n", MINIMAL);
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.youtube.privacy, Privacy::Unlisted);
        assert_eq!(config.youtube.privacy.as_str(), "unlisted");
    }

    #[test]
    fn test_resolution_ratio() {
        let r = Resolution::new(1080, 1920);
        assert!((r.aspect_ratio() - 0.5625).abs() < 1e-9);
        assert_eq!(r.to_string(), "1080x1920");
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.reddit.client_secret_configured);
        assert!(sanitized.reddit.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("\"secret\""));
        assert!(!json.contains("\"pass\""));
    }
}
