use clap::{Parser, ValueEnum};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::agent::AgentSettings;
use crate::error::ChatError;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "threadchat.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "BIND_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the LangGraph server
    #[arg(long, env = "AGENT_URL")]
    pub agent_url: Option<String>,

    /// Assistant (graph) id to run turns against
    #[arg(long, env = "ASSISTANT_ID")]
    pub assistant_id: Option<String>,

    /// Agent runtime backing the chat
    #[arg(long, value_enum, env = "AGENT_RUNTIME")]
    pub runtime: Option<RuntimeKind>,
}

/// Which agent runtime serves turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Remote LangGraph server over HTTP.
    Langgraph,
    /// In-process echo runtime, for offline use.
    Scripted,
}

impl RuntimeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Langgraph => "langgraph",
            Self::Scripted => "scripted",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub runtime: RuntimeKind,
    pub base_url: String,
    pub assistant_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub search_limit: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Load configuration with precedence CLI > env > file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 8501)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("agent.runtime", RuntimeKind::Langgraph.as_str())?
            .set_default("agent.base_url", "http://127.0.0.1:2024")?
            .set_default("agent.assistant_id", "agent")?
            .set_default("agent.search_limit", 100)?;

        // An explicit file must exist; the default one is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml)),
            None => builder
                .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        // E.g. THREADCHAT_AGENT__BASE_URL=http://agents:2024
        builder = builder.add_source(
            Environment::with_prefix("THREADCHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // clap already folded its own env vars into `cli`, so these cover
        // both flags and the unprefixed env names.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.agent_url {
            builder = builder.set_override("agent.base_url", url)?;
        }
        if let Some(id) = cli.assistant_id {
            builder = builder.set_override("agent.assistant_id", id)?;
        }
        if let Some(runtime) = cli.runtime {
            builder = builder.set_override("agent.runtime", runtime.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validated connection settings for the LangGraph runtime.
    pub fn agent_settings(&self) -> Result<AgentSettings, ChatError> {
        let base_url = self.agent.base_url.trim().trim_end_matches('/');
        url::Url::parse(base_url)
            .map_err(|e| ChatError::Config(format!("invalid agent.base_url {base_url:?}: {e}")))?;

        if self.agent.assistant_id.trim().is_empty() {
            return Err(ChatError::Config("agent.assistant_id cannot be empty".into()));
        }

        Ok(AgentSettings {
            base_url: base_url.to_string(),
            assistant_id: self.agent.assistant_id.clone(),
            api_key: self
                .agent
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            search_limit: self.agent.search_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, assistant_id: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                port: 8501,
                host: "127.0.0.1".into(),
            },
            agent: AgentConfig {
                runtime: RuntimeKind::Langgraph,
                base_url: base_url.into(),
                assistant_id: assistant_id.into(),
                api_key: Some("  ".into()),
                search_limit: 25,
            },
        }
    }

    #[test]
    fn test_agent_settings_trims_base_url() {
        let settings = config("http://localhost:2024/", "agent")
            .agent_settings()
            .unwrap();
        assert_eq!(settings.base_url, "http://localhost:2024");
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.search_limit, 25);
    }

    #[test]
    fn test_agent_settings_rejects_bad_values() {
        assert!(matches!(
            config("not a url", "agent").agent_settings(),
            Err(ChatError::Config(_))
        ));
        assert!(matches!(
            config("http://localhost:2024", " ").agent_settings(),
            Err(ChatError::Config(_))
        ));
    }
}
