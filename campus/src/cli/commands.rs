//! CLI command execution.
//!
//! Every command restores the stored session first, then runs against the
//! social API with whatever credential that produced.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::api::{ApiClient, ApiError, ProgressFn};
use crate::config::Config;
use crate::feed::{Feed, MutationState};
use crate::gallery::{self, Catalog, PexelsClient, SearchClient};
use crate::models::{Credentials, Photo, PostDraft, PostId, ProfileUpdate, Registration, UserId};
use crate::prompt::StdinPrompt;
use crate::saved::SavedSet;
use crate::server::{self, ServeOptions, ServerState};
use crate::session::{LogoutOutcome, SessionManager};
use crate::store::{Change, Preferences};

use super::args::{Cli, Commands, GalleryArgs, PostFields, ProfileAction, ThemeMode};
use super::render::{self, PostView};

/// Loaded configuration, storage and session for one invocation.
struct App {
    prefs: Preferences,
    sessions: SessionManager,
    prompt: StdinPrompt,
    changes: broadcast::Receiver<Change>,
}

impl App {
    async fn open(config: &Config, prompt: StdinPrompt) -> Result<Self> {
        let prefs = open_prefs(config)?;
        let changes = prefs.subscribe();
        let api = ApiClient::new(&config.api_url, config.timeout())
            .context("Failed to create HTTP client")?;

        let mut sessions = SessionManager::new(prefs.clone(), api);
        sessions.restore().await;

        Ok(Self {
            prefs,
            sessions,
            prompt,
            changes,
        })
    }

    /// Log what this invocation wrote to client storage.
    fn log_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            match change.value {
                Some(_) => debug!(key = %change.key, "Stored value updated"),
                None => debug!(key = %change.key, "Stored value removed"),
            }
        }
    }

    fn api(&self) -> ApiClient {
        self.sessions.api()
    }

    fn viewer(&self) -> Option<UserId> {
        self.sessions.session().user_id
    }

    fn require_login(&self, message: &str) -> Result<()> {
        if !self.sessions.session().is_authenticated() {
            bail!("{message}");
        }
        Ok(())
    }

    /// Fetch one post into a feed of its own so it can be mutated.
    async fn single_post(&self, id: &PostId) -> Result<Feed> {
        let post = self.api().get_post(id).await.map_err(user_error)?;
        Ok(Feed::new(vec![post]))
    }

    fn print_feed(&self, feed: &Feed) {
        if feed.posts().is_empty() {
            println!("No posts available yet.");
            return;
        }

        let saved = SavedSet::load(&self.prefs);
        let api = self.api();
        for post in feed.posts() {
            let view = PostView {
                viewer: self.viewer(),
                saved: saved.contains(&post.id),
                comments: feed.comments(&post.id),
            };
            println!("{}", render::rule());
            print!("{}", render::post(&api, post, &view));
        }
    }
}

fn open_prefs(config: &Config) -> Result<Preferences> {
    let path = config
        .storage_path()
        .context("Failed to locate client storage")?;
    Ok(Preferences::open(&path))
}

/// Log how each change made through `feed` ended. The first refused change
/// becomes the command's error.
fn settle(feed: &Feed) -> Result<()> {
    let log = feed.mutations();
    for mutation in log.entries() {
        let elapsed_ms = (Utc::now() - mutation.started_at).num_milliseconds();
        match &mutation.state {
            MutationState::Confirmed => debug!(
                kind = %mutation.kind,
                post = %mutation.post_id,
                elapsed_ms,
                "Change confirmed"
            ),
            MutationState::Failed(reason) => warn!(
                kind = %mutation.kind,
                post = %mutation.post_id,
                elapsed_ms,
                %reason,
                "Change rolled back"
            ),
            MutationState::Pending => warn!(
                kind = %mutation.kind,
                post = %mutation.post_id,
                "Change still pending"
            ),
        }
    }

    match log.failed().next() {
        Some(mutation) => bail!("{}", render::failed_change(mutation)),
        None => Ok(()),
    }
}

/// Turn an API error into its display message.
fn user_error(e: ApiError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

/// Execute a CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    let prompt = StdinPrompt::new(cli.yes);

    // Commands that never talk to the social API.
    match cli.command {
        Some(Commands::Serve { port, assets, open }) => {
            return serve(&config, port, assets, open).await;
        }
        Some(Commands::Gallery(args)) => return browse_gallery(&config, &args).await,
        Some(Commands::Theme { mode }) => return set_theme(&config, mode),
        _ => {}
    }

    let mut app = App::open(&config, prompt).await?;

    let result = match cli.command {
        None | Some(Commands::Feed { author: None }) => show_feed(&app).await,
        Some(Commands::Feed {
            author: Some(author),
        }) => show_author_feed(&app, author).await,
        Some(Commands::Login { email, password }) => {
            login(&mut app, Credentials { email, password }).await
        }
        Some(Commands::Register {
            username,
            email,
            password,
        }) => {
            register(
                &app,
                Registration {
                    username,
                    email,
                    password,
                },
            )
            .await
        }
        Some(Commands::Logout) => logout(&mut app).await,
        Some(Commands::Whoami) => {
            println!("{}", render::session(app.sessions.session()));
            Ok(())
        }
        Some(Commands::Profile { action }) => match action {
            None | Some(ProfileAction::Show) => show_profile(&app).await,
            Some(ProfileAction::Update {
                username,
                bio,
                avatar,
            }) => update_profile(&mut app, username, bio, avatar).await,
        },
        Some(Commands::User { id }) => show_user(&app, id).await,
        Some(Commands::Show { id }) => show_post(&app, &id).await,
        Some(Commands::Create(fields)) => create_post(&app, fields).await,
        Some(Commands::Edit { id, fields }) => edit_post(&app, &id, fields).await,
        Some(Commands::Delete { id }) => delete_post(&app, &id).await,
        Some(Commands::Like { id }) => toggle_like(&app, &id).await,
        Some(Commands::Comment { id, text }) => comment(&app, &id, &text.join(" ")).await,
        Some(Commands::Save { id }) => save(&app, id),
        Some(Commands::Unsave { id }) => unsave(&app, &id),
        Some(Commands::Saved) => list_saved(&app).await,
        Some(Commands::Serve { .. } | Commands::Gallery(_) | Commands::Theme { .. }) => Ok(()),
    };
    app.log_changes();
    result
}

// === Account ===

async fn login(app: &mut App, credentials: Credentials) -> Result<()> {
    app.sessions.login(&credentials).await?;
    app.sessions.refresh_profile().await;
    println!("Login successful!");
    println!("{}", render::session(app.sessions.session()));
    Ok(())
}

async fn register(app: &App, registration: Registration) -> Result<()> {
    app.sessions.register(&registration).await?;
    println!("Registration successful! Please wait for admin approval.");
    Ok(())
}

async fn logout(app: &mut App) -> Result<()> {
    match app.sessions.logout(&app.prompt)? {
        LogoutOutcome::LoggedOut => {
            println!("Logged out.");
            show_feed(app).await
        }
        LogoutOutcome::Declined => Ok(()),
    }
}

async fn show_profile(app: &App) -> Result<()> {
    app.require_login("You must be logged in to view your profile.")?;
    let api = app.api();
    let profile = api.current_user().await.map_err(|e| {
        error!(error = %e, "Failed to load profile");
        anyhow::anyhow!("Failed to load profile. Please try again.")
    })?;
    print!("{}", render::profile(&api, &profile));
    Ok(())
}

async fn update_profile(
    app: &mut App,
    username: Option<String>,
    bio: Option<String>,
    avatar: Option<std::path::PathBuf>,
) -> Result<()> {
    app.require_login("You must be logged in to view your profile.")?;

    let current = app.api().current_user().await.map_err(|e| {
        error!(error = %e, "Failed to load profile");
        anyhow::anyhow!("Failed to load profile. Please try again.")
    })?;
    let update = ProfileUpdate {
        username: username.unwrap_or(current.username),
        bio: bio.or(current.bio).unwrap_or_default(),
        avatar,
    };

    match app.sessions.update_profile(&update).await {
        Ok(profile) => {
            println!("Profile updated successfully.");
            print!("{}", render::profile(&app.api(), &profile));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Profile update failed");
            bail!("Failed to update profile.");
        }
    }
}

async fn show_user(app: &App, id: UserId) -> Result<()> {
    let api = app.api();
    let user = api.public_user(id).await.map_err(|e| {
        error!(user = id, error = %e, "Failed to load user");
        anyhow::anyhow!("User not found or failed to load profile.")
    })?;
    print!("{}", render::profile(&api, &user));

    match Feed::load_by_author(&api, id).await {
        Ok(feed) => app.print_feed(&feed),
        Err(e) => error!(user = id, error = %e, "Failed to load user's posts"),
    }
    Ok(())
}

// === Posts ===

async fn show_feed(app: &App) -> Result<()> {
    let feed = Feed::load(&app.api()).await.map_err(user_error)?;
    app.print_feed(&feed);
    Ok(())
}

async fn show_author_feed(app: &App, author: UserId) -> Result<()> {
    let feed = Feed::load_by_author(&app.api(), author)
        .await
        .map_err(user_error)?;
    app.print_feed(&feed);
    Ok(())
}

async fn show_post(app: &App, id: &PostId) -> Result<()> {
    let mut feed = app.single_post(id).await?;
    feed.load_comments(&app.api()).await;
    app.print_feed(&feed);
    Ok(())
}

async fn create_post(app: &App, fields: PostFields) -> Result<()> {
    let draft = draft_from(fields);
    let progress: Option<ProgressFn> = draft.image.as_ref().map(|_| {
        Arc::new(|percent: u8| {
            print!("\rUploading... {percent}%");
            let _ = std::io::stdout().flush();
            if percent == 100 {
                println!();
            }
        }) as ProgressFn
    });

    let mut feed = Feed::default();
    let post = feed
        .create(&app.api(), &draft, progress)
        .await
        .map_err(|e| match e {
            ApiError::NotAuthenticated(msg) | ApiError::Validation(msg) => anyhow::anyhow!(msg),
            _ => anyhow::anyhow!("Failed to create post."),
        })?;

    println!("Post created!");
    print!(
        "{}",
        render::post(
            &app.api(),
            post,
            &PostView {
                viewer: app.viewer(),
                saved: false,
                comments: &[],
            }
        )
    );
    Ok(())
}

async fn edit_post(app: &App, id: &PostId, fields: PostFields) -> Result<()> {
    let mut feed = app.single_post(id).await?;
    let draft = draft_from(fields);
    let result = feed.edit(&app.api(), id, &draft).await;
    settle(&feed)?;
    result.map_err(|e| anyhow::anyhow!("Update failed: {}", e.user_message()))?;
    println!("Post updated.");
    app.print_feed(&feed);
    Ok(())
}

async fn delete_post(app: &App, id: &PostId) -> Result<()> {
    let mut feed = app.single_post(id).await?;
    let result = feed.delete(&app.api(), id, &app.prompt).await;
    settle(&feed)?;
    if result.map_err(user_error)? {
        println!("Post deleted.");
    }
    Ok(())
}

async fn toggle_like(app: &App, id: &PostId) -> Result<()> {
    let mut feed = app.single_post(id).await?;
    let result = feed.toggle_like(&app.api(), id).await;
    settle(&feed)?;
    let liked = result.map_err(user_error)?;
    if let Some(post) = feed.post(id) {
        let verb = if liked { "Liked" } else { "Unliked" };
        println!("{verb} \"{}\" ({} likes)", post.title, post.likes_count);
    }
    Ok(())
}

async fn comment(app: &App, id: &PostId, text: &str) -> Result<()> {
    let mut feed = app.single_post(id).await?;
    let result = feed.add_comment(&app.api(), id, text).await;
    settle(&feed)?;
    if result.map_err(user_error)? {
        app.print_feed(&feed);
    }
    Ok(())
}

fn draft_from(fields: PostFields) -> PostDraft {
    PostDraft {
        title: fields.title,
        content: fields.content,
        image: fields.image,
    }
}

// === Saved posts ===

fn save(app: &App, id: PostId) -> Result<()> {
    app.require_login("Please log in to save posts")?;
    let mut saved = SavedSet::load(&app.prefs);
    let outcome = saved.add(id).context("Failed to save post")?;
    println!("{}", outcome.message());
    Ok(())
}

fn unsave(app: &App, id: &PostId) -> Result<()> {
    let mut saved = SavedSet::load(&app.prefs);
    if saved.remove(id).context("Failed to update saved posts")? {
        println!("Removed from saved posts.");
    } else {
        println!("Post {id} was not saved.");
    }
    Ok(())
}

async fn list_saved(app: &App) -> Result<()> {
    let saved = SavedSet::load(&app.prefs);
    if saved.is_empty() {
        println!("You have no saved posts.");
        return Ok(());
    }

    let posts = match app.api().list_posts(None).await {
        Ok(posts) => posts,
        Err(e) => {
            error!(error = %e, "Failed to fetch saved posts");
            Vec::new()
        }
    };
    let shown = saved.reconcile(&posts);
    if shown.is_empty() {
        println!("You have no saved posts.");
        return Ok(());
    }

    let api = app.api();
    for post in shown {
        let view = PostView {
            viewer: app.viewer(),
            saved: true,
            comments: &[],
        };
        println!("{}", render::rule());
        print!("{}", render::post(&api, post, &view));
    }
    Ok(())
}

// === Gallery ===

async fn browse_gallery(config: &Config, args: &GalleryArgs) -> Result<()> {
    let query = args.query.as_deref().unwrap_or_default();

    let photos: Vec<Photo> = if args.search {
        if query.trim().is_empty() {
            bail!("Enter a keyword to search images.");
        }
        SearchClient::new(&config.gallery_proxy)
            .search(query, args.per_page)
            .await
            .context("Image search failed")?
    } else {
        let path = config.gallery_path()?;
        let catalog = Catalog::open(path.as_deref()).context("Failed to load gallery")?;
        catalog
            .filter(args.category, query)
            .into_iter()
            .cloned()
            .collect()
    };

    if let Some(id) = args.open {
        let photo = photos
            .iter()
            .find(|p| p.id == id)
            .with_context(|| format!("No photo with id {id}"))?;
        gallery::open_photo(photo).context("Failed to open photo")?;
        return Ok(());
    }

    if photos.is_empty() {
        println!("No artworks found for \"{query}\"");
        return Ok(());
    }
    print!("{}", render::photos(&photos.iter().collect::<Vec<_>>()));
    Ok(())
}

fn set_theme(config: &Config, mode: Option<ThemeMode>) -> Result<()> {
    let prefs = open_prefs(config)?;
    let enabled = match mode {
        None => prefs.dark_mode(),
        Some(ThemeMode::On) => true,
        Some(ThemeMode::Off) => false,
        Some(ThemeMode::Toggle) => !prefs.dark_mode(),
    };
    if mode.is_some() {
        prefs
            .set_dark_mode(enabled)
            .context("Failed to save theme")?;
    }
    println!("Dark mode {}", if enabled { "on" } else { "off" });
    Ok(())
}

async fn serve(
    config: &Config,
    port: Option<u16>,
    assets: Option<std::path::PathBuf>,
    open: bool,
) -> Result<()> {
    let path = config.gallery_path()?;
    let catalog = match Catalog::open(path.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(error = %e, "Serving the bundled gallery instead");
            Catalog::bundled().context("Failed to load gallery")?
        }
    };
    let pexels = config.pexels_api_key.clone().map(PexelsClient::new);

    server::start_server(
        ServerState::new(catalog, pexels),
        ServeOptions {
            port: port.unwrap_or(config.proxy_port),
            assets,
            open_browser: open,
        },
    )
    .await
}
