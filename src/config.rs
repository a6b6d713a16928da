use serde::Deserialize;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";
pub const DEFAULT_TTS_LANGUAGE_CODE: &str = "en-IN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub tts_api_key: String,
    pub tts_base_url: String,
    pub tts_language_code: String,
    pub tts_voice: Option<String>, // Provider default voice when unset
    pub upstream_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable required"))
            .and_then(|key| {
                if key.trim().is_empty() {
                    anyhow::bail!("GEMINI_API_KEY cannot be empty");
                }
                Ok(key)
            })?;

        let config = Self {
            port: parse_port(optional_var("PORT").as_deref())?,
            tts_api_key: optional_var("TTS_API_KEY").unwrap_or_else(|| gemini_api_key.clone()),
            gemini_api_key,
            gemini_model: optional_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: base_url_var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)?,
            tts_base_url: base_url_var("TTS_BASE_URL", DEFAULT_TTS_BASE_URL)?,
            tts_language_code: optional_var("TTS_LANGUAGE_CODE")
                .unwrap_or_else(|| DEFAULT_TTS_LANGUAGE_CODE.to_string()),
            tts_voice: optional_var("TTS_VOICE"),
            upstream_timeout_secs: positive_var("UPSTREAM_TIMEOUT_SECS", 30)?,
            max_upload_bytes: positive_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            static_dir: optional_var("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Gemini Base URL: {}", config.gemini_base_url);
        tracing::debug!("Gemini Model: {}", config.gemini_model);
        tracing::debug!("TTS Base URL: {}", config.tts_base_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Reads a variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_port(raw: Option<&str>) -> anyhow::Result<u16> {
    let port: u16 = raw
        .unwrap_or("8001")
        .parse()
        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;
    if port == 0 {
        anyhow::bail!("PORT must be a valid number between 1-65535");
    }
    Ok(port)
}

fn base_url_var(name: &str, default: &str) -> anyhow::Result<String> {
    let raw = optional_var(name).unwrap_or_else(|| default.to_string());
    validate_base_url(name, &raw)
}

fn validate_base_url(name: &str, raw: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn positive_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = optional_var(name) else {
        return Ok(default);
    };
    let value: T = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a positive number", name))?;
    if value <= T::default() {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_strips_trailing_slash() {
        let url = validate_base_url("X", "https://example.com/").unwrap();
        assert_eq!(url, "https://example.com");
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None).unwrap(), 8001);
        assert_eq!(parse_port(Some("3000")).unwrap(), 3000);
        assert!(parse_port(Some("0")).is_err());
        assert!(parse_port(Some("65536")).is_err());
        assert!(parse_port(Some("http")).is_err());
    }

    #[test]
    fn test_validate_base_url_rejects_other_schemes() {
        assert!(validate_base_url("X", "ftp://example.com").is_err());
        assert!(validate_base_url("X", "not a url").is_err());
    }
}
