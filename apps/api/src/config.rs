use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every knob has a default so the service starts against a local model
/// server with no `.env` at all.
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation endpoint (Ollama-compatible `/api/generate`).
    pub llm_url: String,
    pub llm_model: String,
    /// Per-attempt request timeout in seconds.
    pub api_timeout_secs: u64,
    /// Total attempts per logical generation call.
    pub retry_count: u32,
    /// Fixed delay between attempts in seconds (not exponential).
    pub retry_delay_secs: u64,
    /// Directory where analysis reports are written.
    pub output_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_url: env_or("LLM_URL", "http://127.0.0.1:11434/api/generate"),
            llm_model: env_or("LLM_MODEL", "mistral:latest"),
            api_timeout_secs: env_parse("API_TIMEOUT", 45)?,
            retry_count: env_parse("LLM_RETRY_COUNT", 3)?,
            retry_delay_secs: env_parse("LLM_RETRY_DELAY", 2)?,
            output_dir: env_or("OUTPUT_DIR", "output"),
            port: env_parse("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_used_when_env_unset() {
        // Key chosen to not collide with anything a dev shell would export.
        let v: u64 = env_parse("SIEVE_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("SIEVE_TEST_BAD_NUMBER", "not-a-number");
        let result: Result<u64> = env_parse("SIEVE_TEST_BAD_NUMBER", 1);
        assert!(result.is_err());
        std::env::remove_var("SIEVE_TEST_BAD_NUMBER");
    }
}
