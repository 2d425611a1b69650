//! melo - command-line client for the Melo music library

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use meloapi::MeloClient;
use meloconfig::{get_config, Config};
use melosession::SessionContext;
use tracing::debug;

mod commands;
mod logging;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "melo")]
#[command(about = "Command-line client for the Melo music library")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to ./.melo, then ~/.melo)
    #[arg(short, long, global = true, env = "MELO_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(dir) => Arc::new(
            Config::load_config(dir)
                .with_context(|| format!("Failed to load configuration from {}", dir))?,
        ),
        None => get_config(),
    };
    logging::init_logging(&config);

    let session = SessionContext::from_config(&config);
    let restored = session.settled().await?;
    debug!(authenticated = restored.is_authenticated, "Session restored");

    let client = MeloClient::from_config(&config, session).context("Failed to create client")?;
    if cli.command.needs_session() {
        commands::ensure_session(&client, &restored)?;
    }
    commands::run(cli.command, client, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::{MusicCommand, SettingsCommand};

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from([
            "melo", "login", "--subject", "sub-1", "--username", "alice", "--id-token", "tok",
        ])
        .unwrap();
        match cli.command {
            Command::Login {
                subject,
                username,
                id_token,
                access_token,
            } => {
                assert_eq!(subject, "sub-1");
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(id_token, "tok");
                assert_eq!(access_token, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["melo", "music", "delete", "42", "--config", "/tmp/melo"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/melo"));
        assert!(matches!(
            cli.command,
            Command::Music {
                action: MusicCommand::Delete { ref id }
            } if id == "42"
        ));
    }

    #[test]
    fn test_parse_settings_update() {
        let cli = Cli::try_parse_from(["melo", "settings", "update", "--music-id", "7"]).unwrap();
        match cli.command {
            Command::Settings {
                action:
                    SettingsCommand::Update {
                        email,
                        username,
                        music_id,
                    },
            } => {
                assert_eq!(email, None);
                assert_eq!(username, None);
                assert_eq!(music_id.as_deref(), Some("7"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_commands_needing_a_session() {
        let needs = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.needs_session();
        assert!(!needs(&["melo", "whoami"]));
        assert!(!needs(&["melo", "history"]));
        assert!(!needs(&["melo", "logout"]));
        assert!(needs(&["melo", "music", "list"]));
        assert!(needs(&["melo", "headshot", "show"]));
        assert!(needs(&["melo", "settings", "show"]));
    }
}
