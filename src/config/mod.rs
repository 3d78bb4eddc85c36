pub mod toml_config;

pub use toml_config::AuditConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Clone, Parser)]
#[command(name = "site-audit")]
#[command(about = "Fuses PageSpeed measurements and AI market research into one site audit report")]
pub struct CliConfig {
    /// Domain or URL to audit, e.g. example.com
    pub target: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Research provider API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Research model override
    #[arg(long)]
    pub model: Option<String>,

    /// Performance probe strategy override (mobile or desktop)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Performance probe time limit in milliseconds
    #[arg(long)]
    pub probe_timeout_ms: Option<u64>,

    /// Optional time limit for the research query, in seconds
    #[arg(long)]
    pub research_timeout_seconds: Option<u64>,

    /// Print the report as a single line of JSON
    #[arg(long)]
    pub compact: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Command-line flags take precedence over the file.
    pub fn apply_to(&self, config: &mut AuditConfig) {
        if let Some(api_key) = &self.api_key {
            config.research.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.research.model = model.clone();
        }
        if let Some(strategy) = &self.strategy {
            config.probe.strategy = strategy.clone();
        }
        if let Some(timeout) = self.probe_timeout_ms {
            config.probe.timeout_ms = timeout;
        }
        if let Some(timeout) = self.research_timeout_seconds {
            config.research.timeout_seconds = Some(timeout);
        }
    }

    pub fn load_config(&self) -> crate::Result<AuditConfig> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::from_file(path)?,
            None => AuditConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }
}
