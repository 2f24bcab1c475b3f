use crate::i18n::Language;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // CMS
    pub cms_api_url: String,
    pub cms_dataset: String,
    pub cms_token: Option<String>,
    pub cms_timeout_secs: u64,

    // Language preference
    pub default_language: Language,
    pub preference_file: String,

    // Transition overlay
    pub transition_delay_ms: u64,

    // Geo guard
    pub geo_protected_prefix: String,
    pub geo_allowed_country: String,
    pub geo_redirect_to: String,
    pub geo_country_header: String,

    // Calendar export
    pub calendar_timezone: Option<String>,

    // Cache revalidation webhook (disabled when unset)
    pub revalidate_secret: Option<String>,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_language = match std::env::var("DEFAULT_LANGUAGE") {
            Ok(code) => Language::from_code(&code).context("DEFAULT_LANGUAGE is not supported")?,
            Err(_) => Language::default_language(),
        };

        Ok(Self {
            // CMS
            cms_api_url: std::env::var("CMS_API_URL").context("CMS_API_URL not set")?,
            cms_dataset: std::env::var("CMS_DATASET")
                .unwrap_or_else(|_| "production".to_string()),
            cms_token: std::env::var("CMS_TOKEN").ok().filter(|v| !v.is_empty()),
            cms_timeout_secs: std::env::var("CMS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Language preference
            default_language,
            preference_file: std::env::var("PREFERENCE_FILE")
                .unwrap_or_else(|_| "data/preference.json".to_string()),

            // Transition overlay
            transition_delay_ms: std::env::var("TRANSITION_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),

            // Geo guard
            geo_protected_prefix: std::env::var("GEO_PROTECTED_PREFIX")
                .unwrap_or_else(|_| "/investors".to_string()),
            geo_allowed_country: std::env::var("GEO_ALLOWED_COUNTRY")
                .unwrap_or_else(|_| "VN".to_string()),
            geo_redirect_to: std::env::var("GEO_REDIRECT_TO")
                .unwrap_or_else(|_| "/404".to_string()),
            geo_country_header: std::env::var("GEO_COUNTRY_HEADER")
                .unwrap_or_else(|_| "x-vercel-ip-country".to_string()),

            // Calendar export
            calendar_timezone: std::env::var("CALENDAR_TIMEZONE").ok().filter(|v| !v.is_empty()),

            revalidate_secret: std::env::var("REVALIDATE_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    pub fn transition_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.transition_delay_ms)
    }
}
