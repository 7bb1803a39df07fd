//! CLI commands

use anyhow::{Context, Result, bail};
use cadence_core::{Role, SessionManager};
use cadence_http::ApiClient;
use cadence_http::types::{
    LoginRequest, NewPlaylist, NewTrack, PageRequest, Paginated, PlaylistUpdate, RegisterRequest,
    Track, TrackMode, TrackUpdate, UploadFile, UserProfile,
};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "CADENCE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "CADENCE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Key that grants the admin role
        #[arg(long)]
        role_key: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Renew the access token now
    Refresh,

    /// Browse and manage tracks
    Tracks {
        #[command(subcommand)]
        command: TrackCommands,
    },

    /// Browse and manage playlists
    Playlists {
        #[command(subcommand)]
        command: PlaylistCommands,
    },

    /// Manage users and favorites
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Args, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,

    #[arg(long, default_value_t = 12, allow_negative_numbers = true)]
    limit: i64,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        Self::new(args.page, args.limit)
    }
}

#[derive(Subcommand)]
pub enum TrackCommands {
    /// List tracks
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Search title, artist and album
    Search {
        query: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one track
    Get { id: String },

    /// Upload an audio file (artist or admin)
    Upload {
        file: PathBuf,

        #[arg(long)]
        artist: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        album: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        /// Playlist to add the track to (repeatable)
        #[arg(long = "playlist")]
        playlists: Vec<String>,
    },

    /// Edit track metadata (artist or admin)
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        artist: Option<String>,

        #[arg(long)]
        album: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        year: Option<i32>,
    },

    /// Delete a track (artist or admin)
    Delete { id: String },

    /// Print the streaming URL of a track
    Url { id: String },
}

#[derive(Subcommand)]
pub enum PlaylistCommands {
    /// List playlists
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only playlists you own
        #[arg(long)]
        mine: bool,
    },

    /// Show one playlist
    Get { id: String },

    /// List the tracks of a playlist in order
    Tracks { id: String },

    /// Create a playlist
    Create {
        title: String,

        /// Cover image
        #[arg(long)]
        cover: Option<PathBuf>,

        /// Track to include (repeatable)
        #[arg(long = "track")]
        tracks: Vec<String>,
    },

    /// Edit a playlist you own
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        cover: Option<PathBuf>,

        /// Track to add (repeatable)
        #[arg(long = "track")]
        tracks: Vec<String>,

        /// Replace the track list instead of appending to it
        #[arg(long)]
        overwrite: bool,
    },

    /// Delete a playlist you own
    Delete { id: String },

    /// Print the M3U URL of a playlist
    Url { id: String },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users (admin)
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one user (admin)
    Get { id: String },

    /// Delete a user (admin)
    Delete { id: String },

    /// Add a track to favorites
    Favorite {
        track_id: String,

        /// Whose favorites; defaults to the signed-in user
        #[arg(long)]
        user: Option<String>,
    },

    /// Remove a track from favorites
    Unfavorite {
        track_id: String,

        #[arg(long)]
        user: Option<String>,
    },
}

impl Commands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let response = client.login(&LoginRequest { email, password }).await?;
                println!(
                    "Signed in as {} <{}> ({})",
                    response.user.name, response.user.email, response.user.role
                );
                Ok(())
            }
            Self::Register {
                name,
                email,
                password,
                role_key,
            } => {
                let response = client
                    .register(&RegisterRequest {
                        name,
                        email,
                        password,
                        role_key,
                    })
                    .await?;
                println!(
                    "Registered and signed in as {} ({})",
                    response.user.name, response.user.role
                );
                Ok(())
            }
            Self::Logout => {
                client.logout().await?;
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => match client.session().current().await? {
                Some(session) => print_json(&session.user),
                None => {
                    println!("Not signed in");
                    Ok(())
                }
            },
            Self::Refresh => {
                let session = client.refresh().await?;
                info!(user_id = %session.user.id, "Access token renewed");
                println!("Session renewed for {}", session.user.email);
                Ok(())
            }
            Self::Tracks { command } => command.execute(client).await,
            Self::Playlists { command } => command.execute(client).await,
            Self::Users { command } => command.execute(client).await,
        }
    }
}

impl TrackCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List { page } => {
                let tracks = client.list_tracks(page.into()).await?;
                print_tracks(&tracks);
                Ok(())
            }
            Self::Search { query, page } => {
                let tracks = client.search_tracks(&query, page.into()).await?;
                print_tracks(&tracks);
                Ok(())
            }
            Self::Get { id } => print_json(&client.get_track(&id).await?),
            Self::Upload {
                file,
                artist,
                title,
                album,
                genre,
                year,
                playlists,
            } => {
                require_role(client.session(), &[Role::Artist, Role::Admin]).await?;
                let file = UploadFile::from_path(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let track = client
                    .upload_track(NewTrack {
                        title,
                        artist,
                        album,
                        genre,
                        release_year: year,
                        file,
                        playlist_ids: playlists,
                    })
                    .await?;
                println!("Uploaded track {}", track.id);
                Ok(())
            }
            Self::Update {
                id,
                title,
                artist,
                album,
                genre,
                year,
            } => {
                require_role(client.session(), &[Role::Artist, Role::Admin]).await?;
                // Title and artist are mandatory in an update; keep the current ones
                let current = client.get_track(&id).await?;
                let update = TrackUpdate {
                    title: title.unwrap_or(current.title),
                    artist: artist.unwrap_or(current.artist),
                    album: album.or(Some(current.album)),
                    genre: genre.or(Some(current.genre)),
                    release_year: year.or(Some(current.release_year)),
                };
                print_json(&client.update_track(&id, &update).await?)
            }
            Self::Delete { id } => {
                require_role(client.session(), &[Role::Artist, Role::Admin]).await?;
                client.delete_track(&id).await?;
                println!("Deleted track {id}");
                Ok(())
            }
            Self::Url { id } => {
                println!("{}", client.track_stream_url(&id)?);
                Ok(())
            }
        }
    }
}

impl PlaylistCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List { page, mine } => {
                if mine {
                    require_login(client.session()).await?;
                }
                let playlists = client.list_playlists(page.into(), mine).await?;
                for playlist in &playlists.data {
                    println!(
                        "{}  {} ({} tracks)",
                        playlist.id,
                        playlist.title,
                        playlist.track_ids.len()
                    );
                }
                print_page_footer(&playlists);
                Ok(())
            }
            Self::Get { id } => print_json(&client.get_playlist(&id).await?),
            Self::Tracks { id } => {
                let playlist = client.get_playlist(&id).await?;
                let tracks = client.playlist_tracks(&playlist).await?;
                println!("{}", playlist.title);
                for (position, track) in tracks.iter().enumerate() {
                    println!("{:>3}. {}", position + 1, track_line(track));
                }
                Ok(())
            }
            Self::Create {
                title,
                cover,
                tracks,
            } => {
                require_login(client.session()).await?;
                let playlist = client
                    .create_playlist(NewPlaylist {
                        title,
                        album_cover: read_cover(cover).await?,
                        track_ids: tracks,
                    })
                    .await?;
                println!("Created playlist {}", playlist.id);
                Ok(())
            }
            Self::Update {
                id,
                title,
                cover,
                tracks,
                overwrite,
            } => {
                require_login(client.session()).await?;
                let update = PlaylistUpdate {
                    title,
                    album_cover: read_cover(cover).await?,
                    track_ids: tracks,
                    mode: if overwrite {
                        TrackMode::Overwrite
                    } else {
                        TrackMode::Append
                    },
                };
                print_json(&client.update_playlist(&id, update).await?)
            }
            Self::Delete { id } => {
                require_login(client.session()).await?;
                client.delete_playlist(&id).await?;
                println!("Deleted playlist {id}");
                Ok(())
            }
            Self::Url { id } => {
                println!("{}", client.playlist_stream_url(&id)?);
                Ok(())
            }
        }
    }
}

impl UserCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List { page } => {
                require_role(client.session(), &[Role::Admin]).await?;
                let users = client.list_users(page.into()).await?;
                for user in &users.data {
                    println!("{}", user_line(user));
                }
                print_page_footer(&users);
                Ok(())
            }
            Self::Get { id } => {
                require_role(client.session(), &[Role::Admin]).await?;
                print_json(&client.get_user(&id).await?)
            }
            Self::Delete { id } => {
                require_role(client.session(), &[Role::Admin]).await?;
                client.delete_user(&id).await?;
                println!("Deleted user {id}");
                Ok(())
            }
            Self::Favorite { track_id, user } => {
                let user_id = user_or_self(client.session(), user).await?;
                client.add_favorite(&user_id, &track_id).await?;
                println!("Added {track_id} to favorites");
                Ok(())
            }
            Self::Unfavorite { track_id, user } => {
                let user_id = user_or_self(client.session(), user).await?;
                client.remove_favorite(&user_id, &track_id).await?;
                println!("Removed {track_id} from favorites");
                Ok(())
            }
        }
    }
}

async fn require_login(session: &SessionManager) -> Result<()> {
    if !session.is_logged_in().await? {
        bail!("Not signed in, run `cadence login` first");
    }
    Ok(())
}

/// Refuse locally when the cached role cannot run the command.
///
/// The server still enforces permissions.
async fn require_role(session: &SessionManager, roles: &[Role]) -> Result<()> {
    require_login(session).await?;
    if !session.has_role(roles).await? {
        let allowed: Vec<_> = roles.iter().map(|role| role.as_str()).collect();
        bail!("This command requires one of the roles: {}", allowed.join(", "));
    }
    Ok(())
}

async fn user_or_self(session: &SessionManager, user: Option<String>) -> Result<String> {
    if let Some(user) = user {
        return Ok(user);
    }
    session
        .current()
        .await?
        .map(|session| session.user.id)
        .context("Not signed in, run `cadence login` first")
}

async fn read_cover(path: Option<PathBuf>) -> Result<Option<UploadFile>> {
    match path {
        Some(path) => Ok(Some(
            UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        )),
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tracks(tracks: &Paginated<Track>) {
    for track in &tracks.data {
        println!("{}  {}", track.id, track_line(track));
    }
    print_page_footer(tracks);
}

fn print_page_footer<T>(page: &Paginated<T>) {
    match page.total_count {
        Some(total) => println!("-- page {} ({} per page, {total} total)", page.page, page.limit),
        None => println!("-- page {} ({} per page)", page.page, page.limit),
    }
}

fn track_line(track: &Track) -> String {
    let minutes = track.duration / 60;
    let seconds = track.duration % 60;
    format!("{} - {} [{minutes}:{seconds:02}]", track.artist, track.title)
}

fn user_line(user: &UserProfile) -> String {
    format!("{}  {} <{}> ({})", user.id, user.username, user.email, user.role)
}
