use anyhow::{bail, Result};
use clap::Subcommand;
use meloapi::{Fetched, MeloClient, UserSettings};
use meloconfig::Config;
use melosession::{AuthState, Identity};
use meloview::{HistoryView, MusicView, SettingsView};
use std::path::PathBuf;
use tracing::warn;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store an identity issued by the identity provider
    Login {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        username: Option<String>,
        /// Sent as the bearer token
        #[arg(long, env = "MELO_ID_TOKEN")]
        id_token: String,
        #[arg(long)]
        access_token: Option<String>,
    },
    /// Forget the stored identity
    Logout,
    /// Show the stored identity
    Whoami,
    /// Manage the music library
    Music {
        #[command(subcommand)]
        action: MusicCommand,
    },
    /// List processed uploads, newest first
    History,
    /// Show or change account settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Show or replace the profile picture
    Headshot {
        #[command(subcommand)]
        action: HeadshotCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum MusicCommand {
    List,
    Get { id: String },
    /// Upload a file; its name gives the title and extension
    Upload { path: PathBuf },
    Delete { id: String },
    /// Mark a track as preferred
    Prefer { id: String },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    /// Change the given fields, keeping the others
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        music_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HeadshotCommand {
    Show,
    Upload { path: PathBuf },
}

impl Command {
    /// Whether the command talks to authenticated endpoints
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Logout | Command::Whoami | Command::History
        )
    }
}

/// Fail unless `state` already holds every credential the gated calls need
///
/// A CLI run cannot wait for a login that only another invocation can make.
pub fn ensure_session(client: &MeloClient, state: &AuthState) -> Result<()> {
    if !state.is_authenticated {
        bail!("Not logged in, run `melo login` first");
    }
    if let Some(missing) = client.missing_requirement(state) {
        bail!(
            "The stored session has no {} (identity key: {}), run `melo login` again",
            missing,
            client.users().identity_key()
        );
    }
    Ok(())
}

/// Fresh value or an error carrying the failure reason
fn fresh<T>(fetched: Fetched<T>, what: &str) -> Result<T> {
    match fetched {
        Fetched::Fresh(value) => Ok(value),
        Fetched::Fallback { reason, .. } => bail!("{} failed: {}", what, reason),
    }
}

pub async fn run(command: Command, client: MeloClient, config: &Config) -> Result<()> {
    let session = client.session().clone();
    match command {
        Command::Login {
            subject,
            username,
            id_token,
            access_token,
        } => {
            let mut identity = Identity::new(subject).with_id_token(id_token);
            if let Some(username) = username {
                identity = identity.with_username(username);
            }
            if let Some(token) = access_token {
                identity = identity.with_access_token(token);
            }
            session.login(identity).await;
            println!("Logged in");
            if let Err(e) = ensure_session(&client, &session.current()) {
                warn!("{}", e);
            }
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match session.current().identity {
            Some(identity) => {
                println!("subject:  {}", identity.subject);
                println!("username: {}", identity.username.as_deref().unwrap_or("-"));
            }
            None => println!("Not logged in"),
        },
        Command::Music { action } => run_music(action, client, config).await?,
        Command::History => {
            let state = HistoryView::from_config(client, config).load().await;
            if !state.is_fresh {
                warn!("History could not be fetched");
            }
            for row in state.rows {
                println!(
                    "{:>3}. {}  {}  {}  {}",
                    row.index,
                    row.entry.storage_key,
                    row.entry.last_modified,
                    row.username.as_deref().unwrap_or("-"),
                    row.entry.presigned_url.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Settings { action } => {
            let view = SettingsView::new(client);
            match action {
                SettingsCommand::Show => {
                    let settings = fresh(view.load_settings().await, "Loading settings")?;
                    print_settings(&settings);
                }
                SettingsCommand::Update {
                    email,
                    username,
                    music_id,
                } => {
                    let current = fresh(view.load_settings().await, "Loading settings")?;
                    let updated = UserSettings {
                        email: email.unwrap_or(current.email),
                        username: username.unwrap_or(current.username),
                        preferred_music_id: music_id.unwrap_or(current.preferred_music_id),
                    };
                    let saved = fresh(view.submit_settings(&updated).await, "Saving settings")?;
                    print_settings(&saved);
                }
            }
        }
        Command::Headshot { action } => {
            let view = SettingsView::new(client);
            let headshot = match action {
                HeadshotCommand::Show => fresh(view.load_headshot().await, "Loading headshot")?,
                HeadshotCommand::Upload { path } => {
                    fresh(view.submit_headshot_file(&path).await?, "Uploading headshot")?
                }
            };
            println!("{}", headshot.image_url);
        }
    }
    Ok(())
}

async fn run_music(action: MusicCommand, client: MeloClient, config: &Config) -> Result<()> {
    let view = MusicView::from_config(client.clone(), config)?;
    match action {
        MusicCommand::List => {
            // preferred marker comes from the user's settings
            let (tracks, _) = tokio::join!(view.load(), client.users().settings());
            let tracks = fresh(tracks, "Listing music")?;
            let preferred = client.users().cached_settings().preferred_music_id;
            for music in tracks {
                let marker = if !preferred.is_empty() && music.id == preferred { "*" } else { " " };
                println!(
                    "{} {}  {}  {}",
                    marker,
                    music.id,
                    music.title,
                    music.presigned_url.as_deref().unwrap_or("-"),
                );
            }
        }
        MusicCommand::Get { id } => {
            let music = fresh(client.music().get(&id).await, "Fetching music")?;
            println!("id:    {}", music.id);
            println!("title: {}", music.title);
            println!("key:   {}", music.storage_key);
            println!("url:   {}", music.presigned_url.as_deref().unwrap_or("-"));
        }
        MusicCommand::Upload { path } => {
            let music = fresh(view.upload_file(&path).await?, "Uploading music")?;
            println!("Uploaded {} as {}", music.title, music.id);
        }
        MusicCommand::Delete { id } => {
            let music = fresh(view.delete(&id).await, "Deleting music")?;
            println!("Deleted {} ({})", music.title, music.id);
        }
        MusicCommand::Prefer { id } => {
            // load first so the update keeps the other fields
            fresh(client.users().settings().await, "Loading settings")?;
            let settings = fresh(view.set_preferred(&id).await, "Setting preferred music")?;
            println!("Preferred music: {}", settings.preferred_music_id);
        }
    }
    Ok(())
}

fn print_settings(settings: &UserSettings) {
    let preferred = match settings.preferred_music_id.as_str() {
        "" => "-",
        id => id,
    };
    println!("{:<17}{}", "email:", settings.email);
    println!("{:<17}{}", "username:", settings.username);
    println!("{:<17}{}", "preferred music:", preferred);
}
