use crate::adapters::gemini::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use crate::adapters::pagespeed::{
    DEFAULT_PAGESPEED_ENDPOINT, DEFAULT_PROBE_STRATEGY, DEFAULT_PROBE_TIMEOUT_MS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{AuditError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PROBE_STRATEGIES: [&str; 2] = ["mobile", "desktop"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub probe: ProbeConfig,
    pub research: ResearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub endpoint: String,
    pub strategy: String,
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PAGESPEED_ENDPOINT.to_string(),
            strategy: DEFAULT_PROBE_STRATEGY.to_string(),
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            timeout_seconds: None,
        }
    }
}

impl AuditConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AuditError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AuditError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AuditError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("probe.endpoint", &self.probe.endpoint)?;
        validation::validate_one_of("probe.strategy", &self.probe.strategy, &PROBE_STRATEGIES)?;
        validation::validate_positive_number("probe.timeout_ms", self.probe.timeout_ms, 1)?;

        validation::validate_url("research.endpoint", &self.research.endpoint)?;
        validation::validate_non_empty_string("research.model", &self.research.model)?;
        if let Some(seconds) = self.research.timeout_seconds {
            validation::validate_positive_number("research.timeout_seconds", seconds, 1)?;
        }

        Ok(())
    }

    /// API key, ignoring blanks and `${VAR}` placeholders left unresolved.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.research
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !(key.starts_with("${") && key.ends_with('}')))
    }
}

impl ConfigProvider for AuditConfig {
    fn probe_endpoint(&self) -> &str {
        &self.probe.endpoint
    }

    fn probe_strategy(&self) -> &str {
        &self.probe.strategy
    }

    fn probe_timeout_ms(&self) -> u64 {
        self.probe.timeout_ms
    }

    fn research_endpoint(&self) -> &str {
        &self.research.endpoint
    }

    fn research_model(&self) -> &str {
        &self.research.model
    }

    fn research_timeout_seconds(&self) -> Option<u64> {
        self.research.timeout_seconds
    }

    fn api_key(&self) -> Option<&str> {
        self.resolved_api_key()
    }
}

impl Validate for AuditConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AuditConfig::from_toml_str("").unwrap();

        assert_eq!(config.probe.endpoint, DEFAULT_PAGESPEED_ENDPOINT);
        assert_eq!(config.probe.strategy, "mobile");
        assert_eq!(config.probe_timeout_ms(), 4000);
        assert_eq!(config.research.model, "gemini-3-pro-preview");
        assert_eq!(config.research_timeout_seconds(), None);
        assert_eq!(config.api_key(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[probe]
endpoint = "https://probe.example.com/run"
strategy = "desktop"
timeout_ms = 2500

[research]
endpoint = "https://ai.example.com/v1beta"
model = "gemini-test"
api_key = "secret"
timeout_seconds = 30
"#;

        let config = AuditConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.probe_endpoint(), "https://probe.example.com/run");
        assert_eq!(config.probe_strategy(), "desktop");
        assert_eq!(config.probe_timeout_ms(), 2500);
        assert_eq!(config.research_model(), "gemini-test");
        assert_eq!(config.research_timeout_seconds(), Some(30));
        assert_eq!(config.api_key(), Some("secret"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SITE_AUDIT_TEST_KEY", "from-env");

        let config = AuditConfig::from_toml_str(
            r#"
[research]
api_key = "${SITE_AUDIT_TEST_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), Some("from-env"));

        std::env::remove_var("SITE_AUDIT_TEST_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_not_a_key() {
        let config = AuditConfig::from_toml_str(
            r#"
[research]
api_key = "${SITE_AUDIT_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.research.api_key.as_deref(),
            Some("${SITE_AUDIT_SURELY_UNSET_VARIABLE}")
        );
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = AuditConfig::from_toml_str("[probe]\nendpoint = \"invalid-url\"\n").unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_strategy = AuditConfig::from_toml_str("[probe]\nstrategy = \"tablet\"\n").unwrap();
        assert!(bad_strategy.validate().is_err());

        let zero_timeout = AuditConfig::from_toml_str("[probe]\ntimeout_ms = 0\n").unwrap();
        assert!(zero_timeout.validate().is_err());

        let blank_model = AuditConfig::from_toml_str("[research]\nmodel = \" \"\n").unwrap();
        assert!(blank_model.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AuditConfig::from_toml_str("[probe\n").unwrap_err();
        assert!(matches!(err, AuditError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[research]\nmodel = \"gemini-file\"\n")
            .unwrap();

        let config = AuditConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.research.model, "gemini-file");
    }
}
