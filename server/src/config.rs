use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Display name used when `APP_NAME` is unset or blank.
pub const DEFAULT_APP_NAME: &str = "MyApp";

/// Command-line surface of the gateway server.
///
/// Every setting is optional here: a flag only overrides the lower config
/// layers when it was actually given (or when its unprefixed environment
/// variable, `PORT` / `APP_NAME`, is set).
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "gateway-server",
    version,
    about = "Open data API, validated user intake and broadcast chat"
)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Application display name
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Serve the chat page and real-time endpoint
    #[arg(long, conflicts_with = "disable_chat")]
    pub enable_chat: bool,

    /// Run the plain variant: no real-time endpoint, greeting at `/`
    #[arg(long)]
    pub disable_chat: bool,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long)]
    pub json_logs: bool,

    /// Path to TOML config file
    #[arg(long, default_value = "./gateway.toml")]
    pub config: PathBuf,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,
}

/// Values the command line explicitly supplied. Absent fields are skipped so
/// they don't clobber the TOML file or `GATEWAY_*` environment.
#[derive(Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bind_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_chat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_logs: Option<bool>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        let enable_chat = if cli.disable_chat {
            Some(false)
        } else if cli.enable_chat {
            Some(true)
        } else {
            None
        };

        Self {
            port: cli.port,
            bind_address: cli.bind_address.clone(),
            app_name: cli.app_name.clone(),
            enable_chat,
            json_logs: cli.json_logs.then_some(true),
        }
    }
}

/// Resolved server configuration, built once at startup and handed to
/// [`crate::state::AppState`]. Nothing reads the environment after this.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Port to listen on (default: 3001)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Application display name (default: "MyApp")
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Chat variant on/off (default: true)
    #[serde(default = "default_enable_chat")]
    pub enable_chat: bool,

    /// JSON log output (default: false)
    #[serde(default)]
    pub json_logs: bool,
}

fn default_port() -> u16 {
    3001
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_enable_chat() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            app_name: default_app_name(),
            enable_chat: default_enable_chat(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (GATEWAY_*) < PORT/APP_NAME < CLI args
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("GATEWAY_"))
            .merge(Serialized::defaults(CliOverrides::from(cli)))
            .extract()?;

        Ok(config.normalized())
    }

    /// A blank display name is treated as unset rather than as an error.
    fn normalized(mut self) -> Self {
        let trimmed = self.app_name.trim();
        self.app_name = if trimmed.is_empty() {
            default_app_name()
        } else {
            trimmed.to_string()
        };
        self
    }

    /// `host:port` string for the TCP listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Load `KEY=value` pairs from a `.env` file in the working directory (or
/// the nearest parent that has one) into the process environment. Variables
/// that are already set are left alone. Must run before [`Cli`] is parsed so
/// `PORT`, `APP_NAME` and `GATEWAY_*` all see the file's values.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Gateway Server Configuration
# Place this file at ./gateway.toml or specify with --config <path>
# All settings can be overridden via environment variables (GATEWAY_PORT, etc.)
# or CLI flags (--port, etc.). PORT and APP_NAME are also honoured.
# Any of these variables may also be set in a .env file next to the binary's
# working directory; real environment variables take priority over it.

# Server port (default: 3001)
# port = 3001

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Display name shown in the startup banner and on the landing page
# app_name = "MyApp"

# Serve the chat page and the real-time "chat message" channel.
# Set to false for the plain variant (greeting at /, no real-time endpoint).
# enable_chat = true

# Enable structured JSON logging for Docker/production
# json_logs = false
"#
    .to_string()
}
