//! Application state management for podsee.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, the loaded catalog, discussion and moderation data, and
//! background task coordination.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use podsee_core::admin::AdminGate;
use podsee_core::api::comments::has_more;
use podsee_core::api::{CommentClient, IpLocator, MapsClient, COMMENTS_PAGE_SIZE};
use podsee_core::cache::{CacheManager, GeocodeCache};
use podsee_core::catalog::{matching_note, subjects_for_centre_at_level};
use podsee_core::centre_id::generate_centre_id;
use podsee_core::content::{validate_username, MAX_COMMENT_LENGTH, MAX_USERNAME_LENGTH};
use podsee_core::geo::sort_by_distance;
use podsee_core::location::DistanceSnapshot;
use podsee_core::{
    Catalog, Centre, Comment, Config, LocationService, PlacePrediction, ServiceConfig,
    UserLocation,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for the admin password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for location search input.
const MAX_LOCATION_LENGTH: usize = 200;

/// Autocomplete is only queried once the input is this long.
const MIN_AUTOCOMPLETE_CHARS: usize = 3;

/// "View more replies" loads up to this many.
const ALL_REPLIES_LIMIT: usize = 100;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Search,
    Results,
    Discussion,
    Admin,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Search => "Search",
            Tab::Results => "Results",
            Tab::Discussion => "Discussion",
            Tab::Admin => "Admin",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Search => Tab::Results,
            Tab::Results => Tab::Discussion,
            Tab::Discussion => Tab::Admin,
            Tab::Admin => Tab::Search,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Search => Tab::Admin,
            Tab::Results => Tab::Search,
            Tab::Discussion => Tab::Results,
            Tab::Admin => Tab::Discussion,
        }
    }
}

/// Current UI focus area. On the Search tab, `List` is the level column and
/// `Detail` the subject column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    EnteringLocation,
    EnteringUsername,
    Composing,
    AdminLogin,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// What the compose box will post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeTarget {
    Comment,
    Reply { parent_id: String },
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background tasks back to the main loop.
enum TaskResult {
    /// Distances resolved so far for one location/result-set generation
    Distances {
        generation: u64,
        snapshot: DistanceSnapshot,
        done: bool,
    },
    /// Device lookup, address geocode or place details finished
    Located(Result<UserLocation, String>),
    /// Autocomplete suggestions for the location input
    Predictions {
        generation: u64,
        result: Result<Vec<PlacePrediction>, String>,
    },
    /// A page of top-level comments with their reply previews
    Comments {
        centre_id: String,
        offset: usize,
        result: Result<(Vec<Comment>, HashMap<String, Vec<Comment>>), String>,
    },
    /// Every visible reply to one comment
    Replies {
        parent_id: String,
        result: Result<Vec<Comment>, String>,
    },
    CommentPosted {
        centre_id: String,
        result: Result<Comment, String>,
    },
    AdminComments(Result<Vec<Comment>, String>),
    AdminHidden(Result<Comment, String>),
    AdminDeleted {
        comment_id: String,
        result: Result<(), String>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub catalog: Catalog,
    pub cache: CacheManager,
    comments_api: CommentClient,
    location: Option<Arc<Mutex<LocationService>>>,
    maps: Option<MapsClient>,
    /// Why location features are unavailable, when they are.
    location_unavailable: Option<String>,
    locator: IpLocator,
    pub admin: AdminGate,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub status_message: Option<String>,

    // Search tab
    pub levels: Vec<String>,
    pub subjects: Vec<String>,
    pub level_selection: usize,
    pub subject_selection: usize,
    pub selected_level: Option<String>,
    pub selected_subject: Option<String>,

    // Results tab
    pub results: Vec<Centre>,
    pub results_selection: usize,
    pub distances: HashMap<String, f64>,
    pub resolving_distances: bool,
    distance_generation: u64,
    distance_cancel: Arc<AtomicBool>,
    pub user_location: Option<UserLocation>,
    pub locating: bool,
    pub location_error: Option<String>,

    // Location input overlay
    pub location_input: String,
    pub predictions: Vec<PlacePrediction>,
    pub prediction_selection: Option<usize>,
    autocomplete_generation: u64,

    // Discussion tab
    pub discussion_centre: Option<Centre>,
    pub discussion_centre_id: Option<String>,
    pub comments: Vec<Comment>,
    pub replies: HashMap<String, Vec<Comment>>,
    pub comment_selection: usize,
    pub comments_loading: bool,
    pub comments_has_more: bool,
    pub comments_error: Option<String>,
    comments_offset: usize,

    // Compose / username overlays
    pub username: Option<String>,
    pub username_input: String,
    pub username_error: Option<String>,
    pub compose_input: String,
    pub compose_target: ComposeTarget,
    pub compose_error: Option<String>,
    pub posting: bool,
    /// Open the compose box once a username has been chosen.
    compose_after_username: Option<ComposeTarget>,

    // Admin tab
    pub admin_comments: Vec<Comment>,
    pub admin_selection: usize,
    pub admin_password_input: String,
    pub admin_error: Option<String>,
    pub admin_loading: bool,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Create a new application instance from loaded settings and data.
    pub fn new(
        config: Config,
        services: &ServiceConfig,
        catalog: Catalog,
        cache_dir: &Path,
    ) -> Result<Self> {
        let cache = CacheManager::new(cache_dir.to_path_buf())?;

        let comments_api = CommentClient::new(&services.supabase_url, &services.supabase_anon_key)
            .context("Failed to create Supabase client")?
            .with_service_key(services.supabase_service_key.clone());

        let (location, maps, location_unavailable) =
            match Self::location_service(services, cache_dir) {
                Ok(service) => {
                    let maps = service.maps().clone();
                    (Some(Arc::new(Mutex::new(service))), Some(maps), None)
                }
                Err(e) => {
                    warn!(error = %e, "Location features disabled");
                    (None, None, Some(e.to_string()))
                }
            };

        let locator = IpLocator::new(config.allow_device_location);
        let admin = AdminGate::new(services.admin_secret.clone());

        let options = catalog.filter_options();
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let mut app = Self {
            username: config.last_username.clone(),
            config,
            catalog,
            cache,
            comments_api,
            location,
            maps,
            location_unavailable,
            locator,
            admin,

            state: AppState::Normal,
            current_tab: Tab::Search,
            focus: Focus::List,
            status_message: None,

            levels: options.levels,
            subjects: Vec::new(),
            level_selection: 0,
            subject_selection: 0,
            selected_level: None,
            selected_subject: None,

            results: Vec::new(),
            results_selection: 0,
            distances: HashMap::new(),
            resolving_distances: false,
            distance_generation: 0,
            distance_cancel: Arc::new(AtomicBool::new(false)),
            user_location: None,
            locating: false,
            location_error: None,

            location_input: String::new(),
            predictions: Vec::new(),
            prediction_selection: None,
            autocomplete_generation: 0,

            discussion_centre: None,
            discussion_centre_id: None,
            comments: Vec::new(),
            replies: HashMap::new(),
            comment_selection: 0,
            comments_loading: false,
            comments_has_more: false,
            comments_error: None,
            comments_offset: 0,

            username_input: String::new(),
            username_error: None,
            compose_input: String::new(),
            compose_target: ComposeTarget::Comment,
            compose_error: None,
            posting: false,
            compose_after_username: None,

            admin_comments: Vec::new(),
            admin_selection: 0,
            admin_password_input: String::new(),
            admin_error: None,
            admin_loading: false,

            task_rx: rx,
            task_tx: tx,
        };

        app.restore_last_filters();
        Ok(app)
    }

    fn location_service(services: &ServiceConfig, cache_dir: &Path) -> Result<LocationService> {
        let key = services.google_maps_api_key()?;
        let maps = MapsClient::new(key)?;
        let cache = GeocodeCache::open(cache_dir)?;
        Ok(LocationService::new(maps, cache))
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Preselect the level and subject used last time, if still offered.
    fn restore_last_filters(&mut self) {
        let Some(level) = self.config.last_level.clone() else {
            return;
        };
        let Some(index) = self.levels.iter().position(|l| *l == level) else {
            return;
        };
        self.choose_level(index);

        if let Some(subject) = self.config.last_subject.as_deref() {
            if let Some(index) = self.subjects.iter().position(|s| s == subject) {
                self.subject_selection = index;
            }
        }
    }

    /// Select a level and refresh the subjects offered at it.
    pub fn choose_level(&mut self, index: usize) {
        let Some(level) = self.levels.get(index).cloned() else {
            return;
        };
        self.level_selection = index;
        self.subjects = self.catalog.subjects_for_level(&level);
        self.subject_selection = 0;
        self.selected_subject = None;
        self.selected_level = Some(level);
    }

    /// Filter the catalog by the chosen level and the subject at `index`.
    pub fn run_search(&mut self, index: usize) {
        let Some(level) = self.selected_level.clone() else {
            return;
        };
        let Some(subject) = self.subjects.get(index).cloned() else {
            return;
        };

        self.subject_selection = index;
        self.results = self.catalog.filter(&level, &subject);
        self.results_selection = 0;
        info!(level = %level, subject = %subject, matches = self.results.len(), "Search");

        self.status_message = Some(format!(
            "{} centre{} for {} {}",
            self.results.len(),
            if self.results.len() == 1 { "" } else { "s" },
            level,
            subject
        ));

        self.config.last_level = Some(level);
        self.config.last_subject = Some(subject.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.selected_subject = Some(subject);
        self.current_tab = Tab::Results;
        self.focus = Focus::List;
        self.refresh_distances();
    }

    // =========================================================================
    // Results and distances
    // =========================================================================

    /// Results in display order: nearest first once distances are known,
    /// alphabetical otherwise.
    pub fn sorted_results(&self) -> Vec<&Centre> {
        if self.distances.is_empty() {
            self.results.iter().collect()
        } else {
            sort_by_distance(&self.results, &self.distances)
        }
    }

    pub fn selected_centre(&self) -> Option<&Centre> {
        self.sorted_results().get(self.results_selection).copied()
    }

    /// Keep the cursor on the same centre after the order changes.
    fn reanchor_results_selection(&mut self, name: Option<String>) {
        let Some(name) = name else {
            return;
        };
        if let Some(index) = self.sorted_results().iter().position(|c| c.name == name) {
            self.results_selection = index;
        }
    }

    pub fn distance_for(&self, centre: &Centre) -> Option<f64> {
        self.distances.get(&centre.name).copied()
    }

    /// Subjects the selected centre teaches at the searched level.
    pub fn selected_centre_subjects(&self) -> Vec<String> {
        match (self.selected_centre(), self.selected_level.as_deref()) {
            (Some(centre), Some(level)) => subjects_for_centre_at_level(centre, level),
            _ => Vec::new(),
        }
    }

    pub fn selected_centre_note(&self) -> Option<&str> {
        let centre = self.selected_centre()?;
        let level = self.selected_level.as_deref()?;
        let subject = self.selected_subject.as_deref()?;
        matching_note(centre, level, subject)
    }

    /// Restore a recent location from the last run.
    pub fn restore_saved_location(&mut self) {
        match self.cache.load_saved_location() {
            Ok(Some(cached)) => {
                debug!(age = %cached.age_display(), "Restored saved location");
                self.user_location = Some(cached.data);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load saved location"),
        }
    }

    /// Start resolving distances for the current results and location.
    /// Any run already in flight is superseded.
    pub fn refresh_distances(&mut self) {
        self.distance_generation += 1;
        self.distance_cancel.store(true, Ordering::Relaxed);
        self.distance_cancel = Arc::new(AtomicBool::new(false));
        self.distances.clear();
        self.resolving_distances = false;

        let Some(origin) = self.user_location.as_ref().map(|l| l.coordinates) else {
            return;
        };
        if self.results.is_empty() {
            return;
        }
        let Some(location) = self.location.clone() else {
            return;
        };

        let generation = self.distance_generation;
        let cancel = Arc::clone(&self.distance_cancel);
        let centres = self.results.clone();
        let tx = self.task_tx.clone();
        self.resolving_distances = true;

        tokio::spawn(async move {
            let mut service = location.lock().await;
            let snapshot = service
                .resolve_distances_until(origin, &centres, &cancel, |s| {
                    if !s.is_complete() {
                        let _ = tx.try_send(TaskResult::Distances {
                            generation,
                            snapshot: s.clone(),
                            done: false,
                        });
                    }
                })
                .await;
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            let _ = tx
                .send(TaskResult::Distances {
                    generation,
                    snapshot,
                    done: true,
                })
                .await;
        });
    }

    /// Adopt a new user location and persist it for the next run.
    pub fn set_user_location(&mut self, location: UserLocation) {
        info!(source = ?location.source, "User location set");
        if let Err(e) = self.cache.save_saved_location(&location) {
            warn!(error = %e, "Failed to save location");
        }
        self.status_message = Some(format!("Sorting by distance from {}", location.label()));
        self.user_location = Some(location);
        self.location_error = None;
        self.refresh_distances();
    }

    pub fn clear_location(&mut self) {
        if let Err(e) = self.cache.clear_saved_location() {
            warn!(error = %e, "Failed to clear saved location");
        }
        self.user_location = None;
        self.location_error = None;
        self.results_selection = 0;
        self.refresh_distances();
        self.status_message = Some("Location cleared".to_string());
    }

    /// Look up the device location in the background.
    pub fn use_device_location(&mut self) {
        if self.location.is_none() {
            self.location_error = self.location_unavailable.clone();
            return;
        }

        let locator = self.locator.clone();
        let tx = self.task_tx.clone();
        self.locating = true;
        self.location_error = None;
        self.status_message = Some("Finding your location...".to_string());

        tokio::spawn(async move {
            let result = locator.locate().await.map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::Located(result)).await;
        });
    }

    // =========================================================================
    // Location input
    // =========================================================================

    pub fn start_location_input(&mut self) {
        if self.location.is_none() {
            self.location_error = self.location_unavailable.clone();
            return;
        }
        self.location_input.clear();
        self.predictions.clear();
        self.prediction_selection = None;
        self.location_error = None;
        self.state = AppState::EnteringLocation;
    }

    pub fn push_location_char(&mut self, c: char) {
        if can_add_location_char(self.location_input.chars().count(), c) {
            self.location_input.push(c);
            self.request_autocomplete();
        }
    }

    pub fn pop_location_char(&mut self) {
        if self.location_input.pop().is_some() {
            self.request_autocomplete();
        }
    }

    /// Query suggestions for the current input; older responses are dropped.
    fn request_autocomplete(&mut self) {
        self.autocomplete_generation += 1;
        self.prediction_selection = None;

        let input = self.location_input.trim().to_string();
        if input.chars().count() < MIN_AUTOCOMPLETE_CHARS {
            self.predictions.clear();
            return;
        }
        let Some(maps) = self.maps.clone() else {
            return;
        };

        let generation = self.autocomplete_generation;
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = maps.autocomplete(&input).await.map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::Predictions { generation, result }).await;
        });
    }

    pub fn next_prediction(&mut self) {
        if self.predictions.is_empty() {
            return;
        }
        self.prediction_selection = Some(match self.prediction_selection {
            Some(i) if i + 1 < self.predictions.len() => i + 1,
            Some(i) => i,
            None => 0,
        });
    }

    pub fn prev_prediction(&mut self) {
        self.prediction_selection = match self.prediction_selection {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Resolve the highlighted suggestion, or geocode the typed address.
    pub fn submit_location(&mut self) {
        let Some(maps) = self.maps.clone() else {
            self.location_error = self.location_unavailable.clone();
            return;
        };

        let place_id = self
            .prediction_selection
            .and_then(|i| self.predictions.get(i))
            .map(|p| p.place_id.clone());
        let input = self.location_input.trim().to_string();

        if place_id.is_none() && input.is_empty() {
            self.location_error = Some("Please enter a location".to_string());
            return;
        }

        let tx = self.task_tx.clone();
        self.locating = true;
        self.location_error = None;
        self.state = AppState::Normal;
        self.status_message = Some("Looking up location...".to_string());

        tokio::spawn(async move {
            let result = match place_id {
                Some(id) => maps.place_details(&id).await,
                None => maps.locate_address(&input).await,
            };
            let _ = tx
                .send(TaskResult::Located(result.map_err(|e| e.to_string())))
                .await;
        });
    }

    // =========================================================================
    // Discussion
    // =========================================================================

    /// Open the discussion for the selected result.
    pub fn open_discussion(&mut self) {
        let Some(centre) = self.selected_centre().cloned() else {
            return;
        };

        let centre_id = match generate_centre_id(&centre) {
            Ok(id) => id,
            Err(e) => {
                warn!(centre = %centre.name, "No discussion key for centre");
                self.status_message = Some(e.to_string());
                return;
            }
        };

        if self.discussion_centre_id.as_deref() != Some(centre_id.as_str()) {
            self.comments.clear();
            self.replies.clear();
            self.comment_selection = 0;
            self.comments_offset = 0;
            self.comments_has_more = false;
            self.discussion_centre_id = Some(centre_id);
            self.discussion_centre = Some(centre);
            self.load_comments(0);
        }

        self.current_tab = Tab::Discussion;
    }

    fn load_comments(&mut self, offset: usize) {
        let Some(centre_id) = self.discussion_centre_id.clone() else {
            return;
        };

        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        self.comments_loading = true;
        self.comments_error = None;

        tokio::spawn(async move {
            let result = match client.fetch_comments(&centre_id, COMMENTS_PAGE_SIZE, offset).await {
                Ok(page) => {
                    let previews = client.fetch_reply_previews(&page).await;
                    Ok((page, previews))
                }
                Err(e) => Err(e.to_string()),
            };
            let _ = tx
                .send(TaskResult::Comments {
                    centre_id,
                    offset,
                    result,
                })
                .await;
        });
    }

    pub fn reload_comments(&mut self) {
        self.comment_selection = 0;
        self.load_comments(0);
    }

    pub fn load_more_comments(&mut self) {
        if self.comments_has_more && !self.comments_loading {
            self.load_comments(self.comments_offset);
        }
    }

    pub fn selected_comment(&self) -> Option<&Comment> {
        self.comments.get(self.comment_selection)
    }

    /// Replies loaded so far for a comment.
    pub fn replies_for(&self, comment_id: &str) -> &[Comment] {
        self.replies
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Load every reply to the selected comment.
    pub fn view_all_replies(&mut self) {
        let Some(comment) = self.selected_comment() else {
            return;
        };
        if (comment.reply_count() as usize) <= self.replies_for(&comment.comment_id).len() {
            return;
        }

        let parent_id = comment.comment_id.clone();
        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client
                .fetch_replies(&parent_id, ALL_REPLIES_LIMIT, 0)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::Replies { parent_id, result }).await;
        });
    }

    /// Open the compose box, asking for a username first if needed.
    pub fn start_compose(&mut self, target: ComposeTarget) {
        if self.discussion_centre_id.is_none() {
            return;
        }
        self.compose_error = None;

        if self.username.is_none() {
            self.compose_after_username = Some(target);
            self.start_username_input();
            return;
        }

        self.compose_target = target;
        self.compose_input.clear();
        self.state = AppState::Composing;
    }

    /// Reply to the selected top-level comment.
    pub fn start_reply(&mut self) {
        let Some(parent_id) = self.selected_comment().map(|c| c.comment_id.clone()) else {
            return;
        };
        self.start_compose(ComposeTarget::Reply { parent_id });
    }

    pub fn start_username_input(&mut self) {
        self.username_input = self.username.clone().unwrap_or_default();
        self.username_error = None;
        self.state = AppState::EnteringUsername;
    }

    pub fn submit_username(&mut self) {
        match validate_username(&self.username_input) {
            Ok(name) => {
                self.config.last_username = Some(name.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.username = Some(name);
                self.username_error = None;
                self.state = AppState::Normal;

                if let Some(target) = self.compose_after_username.take() {
                    self.start_compose(target);
                }
            }
            Err(message) => self.username_error = Some(message.to_string()),
        }
    }

    pub fn cancel_username(&mut self) {
        self.compose_after_username = None;
        self.state = AppState::Normal;
    }

    /// Post the compose box contents in the background.
    pub fn submit_comment(&mut self) {
        if self.posting {
            return;
        }
        let (Some(centre_id), Some(username)) =
            (self.discussion_centre_id.clone(), self.username.clone())
        else {
            return;
        };

        let text = self.compose_input.clone();
        let parent_id = match &self.compose_target {
            ComposeTarget::Comment => None,
            ComposeTarget::Reply { parent_id } => Some(parent_id.clone()),
        };

        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        self.posting = true;
        self.compose_error = None;

        tokio::spawn(async move {
            let result = client
                .create_comment(&centre_id, &username, &text, parent_id.as_deref())
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::CommentPosted { centre_id, result }).await;
        });
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub fn start_admin_login(&mut self) {
        self.admin_password_input.clear();
        self.admin_error = None;
        self.state = AppState::AdminLogin;
    }

    pub fn submit_admin_password(&mut self) {
        match self.admin.unlock(&self.admin_password_input) {
            Ok(()) => {
                info!("Admin panel unlocked");
                self.admin_password_input.clear();
                self.admin_error = None;
                self.state = AppState::Normal;
                self.load_admin_comments();
            }
            Err(e) => {
                warn!("Admin unlock failed");
                self.admin_error = Some(e.to_string());
            }
        }
    }

    pub fn lock_admin(&mut self) {
        self.admin.lock();
        self.admin_comments.clear();
        self.admin_selection = 0;
    }

    pub fn load_admin_comments(&mut self) {
        if !self.admin.is_unlocked() {
            return;
        }
        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        self.admin_loading = true;
        self.admin_error = None;

        tokio::spawn(async move {
            let result = client.admin_fetch_all().await.map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::AdminComments(result)).await;
        });
    }

    pub fn selected_admin_comment(&self) -> Option<&Comment> {
        self.admin_comments.get(self.admin_selection)
    }

    pub fn toggle_selected_hidden(&mut self) {
        let Some(comment) = self.selected_admin_comment() else {
            return;
        };
        let comment_id = comment.comment_id.clone();
        let hidden = !comment.hidden;

        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client
                .admin_set_hidden(&comment_id, hidden)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::AdminHidden(result)).await;
        });
    }

    pub fn request_delete_selected(&mut self) {
        if self.selected_admin_comment().is_some() {
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(comment_id) = self.selected_admin_comment().map(|c| c.comment_id.clone()) else {
            return;
        };

        let client = self.comments_api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client
                .admin_delete(&comment_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::AdminDeleted { comment_id, result }).await;
        });
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Check for and process completed background tasks.
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Distances {
                generation,
                snapshot,
                done,
            } => {
                if generation != self.distance_generation {
                    debug!(generation, "Discarding stale distances");
                    return;
                }
                let selected = self.selected_centre().map(|c| c.name.clone());
                self.distances = snapshot.distances;
                self.reanchor_results_selection(selected);
                if done {
                    self.resolving_distances = false;
                    let unresolved = self.results.len().saturating_sub(self.distances.len());
                    if unresolved > 0 {
                        self.status_message = Some(format!(
                            "{} centre{} could not be located",
                            unresolved,
                            if unresolved == 1 { "" } else { "s" }
                        ));
                    }
                }
            }
            TaskResult::Located(result) => {
                self.locating = false;
                match result {
                    Ok(location) => self.set_user_location(location),
                    Err(message) => {
                        self.status_message = None;
                        self.location_error = Some(message);
                    }
                }
            }
            TaskResult::Predictions { generation, result } => {
                if generation != self.autocomplete_generation {
                    return;
                }
                match result {
                    Ok(predictions) => self.predictions = predictions,
                    Err(message) => {
                        debug!(error = %message, "Autocomplete failed");
                        self.predictions.clear();
                    }
                }
            }
            TaskResult::Comments {
                centre_id,
                offset,
                result,
            } => {
                if self.discussion_centre_id.as_deref() != Some(centre_id.as_str()) {
                    return;
                }
                self.comments_loading = false;
                match result {
                    Ok((page, previews)) => {
                        self.comments_has_more = has_more(page.len(), COMMENTS_PAGE_SIZE);
                        self.comments_offset = offset + page.len();
                        if offset == 0 {
                            self.comments = page;
                            self.replies = previews;
                        } else {
                            self.comments.extend(page);
                            self.replies.extend(previews);
                        }
                        self.comment_selection =
                            self.comment_selection.min(self.comments.len().saturating_sub(1));
                    }
                    Err(message) => self.comments_error = Some(message),
                }
            }
            TaskResult::Replies { parent_id, result } => match result {
                Ok(replies) => {
                    self.replies.insert(parent_id, replies);
                }
                Err(message) => self.comments_error = Some(message),
            },
            TaskResult::CommentPosted { centre_id, result } => {
                self.posting = false;
                match result {
                    Ok(comment) => {
                        self.compose_input.clear();
                        self.state = AppState::Normal;
                        self.status_message = Some("Comment posted".to_string());
                        if self.discussion_centre_id.as_deref() == Some(centre_id.as_str()) {
                            self.add_posted_comment(comment);
                        }
                    }
                    Err(message) => self.compose_error = Some(message),
                }
            }
            TaskResult::AdminComments(result) => {
                self.admin_loading = false;
                match result {
                    Ok(comments) => {
                        self.admin_comments = comments;
                        self.admin_selection = 0;
                    }
                    Err(message) => self.admin_error = Some(message),
                }
            }
            TaskResult::AdminHidden(result) => match result {
                Ok(updated) => {
                    let hidden = updated.hidden;
                    if let Some(existing) = self
                        .admin_comments
                        .iter_mut()
                        .find(|c| c.comment_id == updated.comment_id)
                    {
                        *existing = updated;
                    }
                    self.status_message = Some(
                        if hidden { "Comment hidden" } else { "Comment visible" }.to_string(),
                    );
                }
                Err(message) => self.admin_error = Some(message),
            },
            TaskResult::AdminDeleted { comment_id, result } => match result {
                Ok(()) => {
                    self.admin_comments.retain(|c| c.comment_id != comment_id);
                    self.admin_selection =
                        self.admin_selection.min(self.admin_comments.len().saturating_sub(1));
                    self.status_message = Some("Comment deleted".to_string());
                }
                Err(message) => self.admin_error = Some(message),
            },
        }
    }

    /// Show a freshly posted comment without refetching.
    fn add_posted_comment(&mut self, mut comment: Comment) {
        match comment.parent_comment_id.clone() {
            None => {
                comment.reply_count = Some(0);
                self.comments.push(comment);
                self.comments_offset += 1;
            }
            Some(parent_id) => {
                if let Some(parent) = self.comments.iter_mut().find(|c| c.comment_id == parent_id) {
                    parent.reply_count = Some(parent.reply_count() + 1);
                }
                self.replies.entry(parent_id).or_default().push(comment);
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Number of rows in the list that currently has focus.
    fn current_list_len(&self) -> usize {
        match (self.current_tab, self.focus) {
            (Tab::Search, Focus::List) => self.levels.len(),
            (Tab::Search, Focus::Detail) => self.subjects.len(),
            (Tab::Results, _) => self.results.len(),
            (Tab::Discussion, _) => self.comments.len(),
            (Tab::Admin, _) => self.admin_comments.len(),
        }
    }

    fn current_selection_mut(&mut self) -> &mut usize {
        match (self.current_tab, self.focus) {
            (Tab::Search, Focus::List) => &mut self.level_selection,
            (Tab::Search, Focus::Detail) => &mut self.subject_selection,
            (Tab::Results, _) => &mut self.results_selection,
            (Tab::Discussion, _) => &mut self.comment_selection,
            (Tab::Admin, _) => &mut self.admin_selection,
        }
    }

    /// Move the focused selection by `delta` rows, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_list_len();
        let selection = self.current_selection_mut();
        *selection = step_index(*selection, delta, len);
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.focus = Focus::List;
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Move an index by `delta` within `0..len`.
pub fn step_index(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize).min(max)
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Comments may be typed slightly past the limit so validation can report it.
pub fn can_add_comment_char(current_len: usize, c: char) -> bool {
    current_len <= MAX_COMMENT_LENGTH && is_valid_input_char(c)
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_location_char(current_len: usize, c: char) -> bool {
    current_len < MAX_LOCATION_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use podsee_core::models::{CentreRow, Coordinates, LocationSource, OfferingRow};

    fn centre_row(name: &str, postal: Option<&str>) -> CentreRow {
        CentreRow {
            centre_name: name.to_string(),
            postal_code: postal.map(str::to_string),
            ..Default::default()
        }
    }

    fn offering(name: &str, level: &str, subject: &str) -> OfferingRow {
        OfferingRow {
            centre_name: name.to_string(),
            level: Some(level.to_string()),
            subject: Some(subject.to_string()),
            notes: None,
        }
    }

    fn test_app(dir: &Path) -> App {
        let catalog = Catalog::from_rows(
            vec![
                centre_row("Zenith Learning", Some("449269")),
                centre_row("Apex Tuition", None),
            ],
            vec![
                offering("Zenith Learning", "P5", "Science"),
                offering("Apex Tuition", "P5", "Science"),
                offering("Apex Tuition", "S1", "Mathematics"),
            ],
        );
        let services = ServiceConfig {
            supabase_url: "http://127.0.0.1:9".to_string(),
            supabase_anon_key: "anon".to_string(),
            ..Default::default()
        };
        App::new(Config::default(), &services, catalog, dir).unwrap()
    }

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        serde_json::from_value(serde_json::json!({
            "comment_id": id,
            "centre_id": "449269",
            "username": "parent88",
            "text": "text",
            "parent_comment_id": parent,
            "created_at": "2026-03-01T09:30:00Z"
        }))
        .unwrap()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Search.next(), Tab::Results);
        assert_eq!(Tab::Results.next(), Tab::Discussion);
        assert_eq!(Tab::Discussion.next(), Tab::Admin);
        assert_eq!(Tab::Admin.next(), Tab::Search); // Wraps around
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Search.prev(), Tab::Admin); // Wraps around
        assert_eq!(Tab::Admin.prev(), Tab::Discussion);
        assert_eq!(Tab::Discussion.prev(), Tab::Results);
        assert_eq!(Tab::Results.prev(), Tab::Search);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_comment_char() {
        assert!(can_add_comment_char(499, 'a'));
        // One past the limit is allowed so the length error can show
        assert!(can_add_comment_char(500, 'a'));
        assert!(!can_add_comment_char(501, 'a'));
        assert!(!can_add_comment_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_step_index() {
        assert_eq!(step_index(0, -1, 5), 0);
        assert_eq!(step_index(2, 1, 5), 3);
        assert_eq!(step_index(4, 1, 5), 4);
        assert_eq!(step_index(3, PAGE_SCROLL_SIZE as isize, 5), 4);
        assert_eq!(step_index(3, 1, 0), 0);
    }

    // -------------------------------------------------------------------------
    // State Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_choose_level_refreshes_subjects() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        assert_eq!(app.levels, vec!["P5", "S1"]);
        app.choose_level(1);
        assert_eq!(app.selected_level.as_deref(), Some("S1"));
        assert_eq!(app.subjects, vec!["Mathematics"]);
    }

    #[test]
    fn test_results_sorted_by_distance_when_known() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.results = app.catalog.filter("P5", "Science");

        let names: Vec<&str> = app.sorted_results().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Apex Tuition", "Zenith Learning"]);

        app.distances.insert("Zenith Learning".to_string(), 1.2);
        let names: Vec<&str> = app.sorted_results().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zenith Learning", "Apex Tuition"]);
    }

    #[test]
    fn test_stale_distances_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.distance_generation = 3;

        let mut snapshot = DistanceSnapshot::default();
        snapshot.distances.insert("Apex Tuition".to_string(), 2.0);
        app.process_task_result(TaskResult::Distances {
            generation: 2,
            snapshot,
            done: true,
        });
        assert!(app.distances.is_empty());
    }

    #[test]
    fn test_selection_follows_centre_when_distances_arrive() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.results = app.catalog.filter("P5", "Science");
        app.results_selection = 1;
        assert_eq!(app.selected_centre().map(|c| c.name.as_str()), Some("Zenith Learning"));

        let mut snapshot = DistanceSnapshot {
            total: 2,
            ..Default::default()
        };
        snapshot.distances.insert("Zenith Learning".to_string(), 0.8);
        app.process_task_result(TaskResult::Distances {
            generation: app.distance_generation,
            snapshot,
            done: false,
        });

        assert_eq!(app.results_selection, 0);
        assert_eq!(app.selected_centre().map(|c| c.name.as_str()), Some("Zenith Learning"));
    }

    #[test]
    fn test_refresh_cancels_previous_distance_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        let previous = Arc::clone(&app.distance_cancel);
        app.refresh_distances();

        assert!(previous.load(Ordering::Relaxed));
        assert!(!app.distance_cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_centre_without_postal_code_has_no_discussion() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.results = app.catalog.filter("S1", "Mathematics");

        app.open_discussion();
        assert_eq!(app.current_tab, Tab::Search);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Centre must have a postal code to generate centerId")
        );
    }

    #[test]
    fn test_compose_requires_username_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.discussion_centre_id = Some("449269".to_string());

        app.start_compose(ComposeTarget::Comment);
        assert_eq!(app.state, AppState::EnteringUsername);

        app.username_input = "   ".to_string();
        app.submit_username();
        assert_eq!(app.username_error.as_deref(), Some("Please enter a username"));
        assert_eq!(app.state, AppState::EnteringUsername);
    }

    #[test]
    fn test_posted_reply_updates_parent_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.discussion_centre_id = Some("449269".to_string());
        app.comments = vec![comment("c1", None)];

        app.process_task_result(TaskResult::CommentPosted {
            centre_id: "449269".to_string(),
            result: Ok(comment("r1", Some("c1"))),
        });

        assert_eq!(app.comments[0].reply_count(), 1);
        assert_eq!(app.replies_for("c1").len(), 1);
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_full_comment_page_has_more() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.discussion_centre_id = Some("449269".to_string());

        let page: Vec<Comment> = (0..COMMENTS_PAGE_SIZE)
            .map(|i| comment(&format!("c{i}"), None))
            .collect();
        app.process_task_result(TaskResult::Comments {
            centre_id: "449269".to_string(),
            offset: 0,
            result: Ok((page, HashMap::new())),
        });
        assert!(app.comments_has_more);
        assert_eq!(app.comments.len(), COMMENTS_PAGE_SIZE);

        app.process_task_result(TaskResult::Comments {
            centre_id: "449269".to_string(),
            offset: COMMENTS_PAGE_SIZE,
            result: Ok((vec![comment("last", None)], HashMap::new())),
        });
        assert!(!app.comments_has_more);
        assert_eq!(app.comments.len(), COMMENTS_PAGE_SIZE + 1);
    }

    #[test]
    fn test_location_error_is_shown() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.locating = true;

        app.process_task_result(TaskResult::Located(Err(
            "Location permission denied".to_string()
        )));
        assert!(!app.locating);
        assert_eq!(app.location_error.as_deref(), Some("Location permission denied"));
    }

    #[test]
    fn test_location_features_need_maps_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.start_location_input();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(
            app.location_error.as_deref(),
            Some("Missing PODSEE_GOOGLE_MAPS_API_KEY. Check your .env file.")
        );
    }

    #[test]
    fn test_saved_location_restored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let location = UserLocation {
            coordinates: Coordinates::new(1.30, 103.90),
            address: Some("Marine Parade".to_string()),
            source: LocationSource::Address,
        };
        app.cache.save_saved_location(&location).unwrap();

        app.restore_saved_location();
        assert_eq!(app.user_location, Some(location));
    }
}
