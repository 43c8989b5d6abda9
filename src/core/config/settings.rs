use std::time::Duration;

use super::parsing::{
    env_optional, env_or_default, parse_base_url, parse_bool, parse_environment,
    parse_positive_u64,
};
use super::types::{
    ApiSettings, ConfigError, HttpSettings, RuntimeSettings, Settings, TelemetrySettings,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: &str = "45";
const DEFAULT_CONNECT_TIMEOUT_SECONDS: &str = "20";

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("EDUMON_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("EDUMON_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let base_url = parse_base_url(env_or_default("EDUMON_API_BASE_URL", DEFAULT_BASE_URL))?;
        let bearer_token = env_optional("EDUMON_API_TOKEN");
        let author_id = env_optional("EDUMON_AUTHOR_ID");

        let request_timeout_seconds = parse_positive_u64(
            "EDUMON_REQUEST_TIMEOUT_SECONDS",
            env_or_default("EDUMON_REQUEST_TIMEOUT_SECONDS", DEFAULT_REQUEST_TIMEOUT_SECONDS),
        )?;
        let connect_timeout_seconds = parse_positive_u64(
            "EDUMON_CONNECT_TIMEOUT_SECONDS",
            env_or_default("EDUMON_CONNECT_TIMEOUT_SECONDS", DEFAULT_CONNECT_TIMEOUT_SECONDS),
        )?;

        let log_level = env_or_default("EDUMON_LOG_LEVEL", "info");
        let json = env_optional("EDUMON_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { base_url, bearer_token, author_id },
            http: HttpSettings { request_timeout_seconds, connect_timeout_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub fn http(&self) -> &HttpSettings {
        &self.http
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.connect_timeout_seconds > self.http.request_timeout_seconds {
            return Err(ConfigError::InvalidValue {
                field: "EDUMON_CONNECT_TIMEOUT_SECONDS",
                value: self.http.connect_timeout_seconds.to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.api.bearer_token.is_none() {
            return Err(ConfigError::MissingSecret("EDUMON_API_TOKEN"));
        }

        if !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }

        Ok(())
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}
