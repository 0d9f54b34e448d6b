//! Integration tests for the environment layers of the config: `GATEWAY_*`,
//! unprefixed `PORT` / `APP_NAME`, and values loaded from a `.env` file.
//!
//! Each test runs inside a `figment::Jail`, which serializes access to the
//! process environment and working directory and restores both afterwards.

use clap::Parser;
use figment::Jail;

use gateway_server::config::{load_dotenv, Cli, Config, DEFAULT_APP_NAME};

/// Parse an empty command line so clap reads `PORT` / `APP_NAME` from the
/// jail's environment, then resolve the layered config.
fn load_from_env() -> figment::Result<Config> {
    let cli = Cli::try_parse_from(["gateway-server"]).expect("Failed to parse CLI");
    Config::load(&cli)
}

#[test]
fn test_gateway_env_overrides_toml_file() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("gateway.toml", "port = 4000\napp_name = \"FromToml\"")?;
        jail.set_env("GATEWAY_PORT", 4500);

        let config = load_from_env()?;

        assert_eq!(config.port, 4500);
        assert_eq!(config.app_name, "FromToml");
        Ok(())
    });
}

#[test]
fn test_unprefixed_port_overrides_gateway_port() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("gateway.toml", "port = 4000")?;
        jail.set_env("GATEWAY_PORT", 4500);
        jail.set_env("PORT", 4600);
        jail.set_env("GATEWAY_APP_NAME", "FromGateway");
        jail.set_env("APP_NAME", "FromAppName");

        let config = load_from_env()?;

        assert_eq!(config.port, 4600);
        assert_eq!(config.app_name, "FromAppName");
        Ok(())
    });
}

#[test]
fn test_cli_flag_overrides_unprefixed_port() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("PORT", 4600);

        let cli = Cli::try_parse_from(["gateway-server", "--port", "4700"])
            .expect("Failed to parse CLI");
        let config = Config::load(&cli)?;

        assert_eq!(config.port, 4700);
        Ok(())
    });
}

#[test]
fn test_empty_gateway_app_name_falls_back_to_default() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("GATEWAY_APP_NAME", "");

        let config = load_from_env()?;

        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        Ok(())
    });
}

#[test]
fn test_empty_app_name_is_not_fatal() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("APP_NAME", "");

        let config = load_from_env()?;

        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        Ok(())
    });
}

#[test]
fn test_gateway_env_toggles_chat_off() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("GATEWAY_ENABLE_CHAT", false);

        let config = load_from_env()?;

        assert!(!config.enable_chat);
        Ok(())
    });
}

#[test]
fn test_dotenv_file_feeds_env_layers() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(".env", "PORT=4100\nAPP_NAME=FromDotenv\nGATEWAY_JSON_LOGS=true\n")?;

        let loaded = load_dotenv();
        assert!(loaded.is_some(), "Expected .env in the working directory to load");

        let config = load_from_env()?;

        assert_eq!(config.port, 4100);
        assert_eq!(config.app_name, "FromDotenv");
        assert!(config.json_logs);
        Ok(())
    });
}

#[test]
fn test_real_env_wins_over_dotenv_file() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(".env", "PORT=4100\nAPP_NAME=FromDotenv\n")?;
        jail.set_env("PORT", 4200);

        load_dotenv();
        let config = load_from_env()?;

        assert_eq!(config.port, 4200);
        assert_eq!(config.app_name, "FromDotenv");
        Ok(())
    });
}

#[test]
fn test_empty_environment_yields_defaults() {
    Jail::expect_with(|jail| {
        jail.clear_env();

        let config = load_from_env()?;

        assert_eq!(config, Config::default());
        Ok(())
    });
}
