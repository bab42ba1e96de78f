use crate::config::toml_config::{AnalyzerProvider, GlanceConfig};
use crate::domain::model::SearchQuery;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "glance")]
#[command(about = "Identify and search industrial valves through vision and search APIs")]
#[command(version)]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, env = "GLANCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the analyzer provider (openai | simulated)
    #[arg(long, global = true)]
    pub provider: Option<AnalyzerProvider>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:3000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Identify a valve from a JPEG or PNG file
    Scan { image: PathBuf },
    /// Run label, text and logo detection on an image file
    Annotate { image: PathBuf },
    /// Search the web for valves
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long)]
        manufacturer: Option<String>,

        #[arg(long = "type")]
        valve_type: Option<String>,

        #[arg(long)]
        size: Option<String>,
    },
    /// Check that the OpenAI key is accepted
    TestConnection,
}

impl CliConfig {
    /// File + environment, then command line overrides.
    pub fn load_config(&self) -> Result<GlanceConfig> {
        let mut config = GlanceConfig::load(self.config.as_deref())?;

        if let Some(provider) = self.provider {
            config.analyzer.provider = provider;
        }
        if self.json_logs {
            config.logging.json = true;
        }
        if let Command::Serve { bind: Some(bind) } = &self.command {
            config.server.bind = bind.clone();
        }

        Ok(config)
    }
}

impl Command {
    pub fn search_query(&self) -> Option<SearchQuery> {
        match self {
            Command::Search {
                query,
                manufacturer,
                valve_type,
                size,
            } => Some(SearchQuery {
                query: Some(query.join(" ")),
                manufacturer: manufacturer.clone(),
                valve_type: valve_type.clone(),
                size: size.clone(),
            }),
            _ => None,
        }
    }
}
