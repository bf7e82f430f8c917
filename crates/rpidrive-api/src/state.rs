//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use rpidrive_auth::{BruteForceGuard, PasswordHasher, PermissionResolver, SessionManager};
use rpidrive_cache::{CacheManager, EntityCache};
use rpidrive_core::config::AppConfig;
use rpidrive_database::PgPool;
use rpidrive_database::repositories::activity::ActivityRepository;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::playlist::PlaylistRepository;
use rpidrive_database::repositories::share::ShareRepository;
use rpidrive_database::repositories::user::UserRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_service::{
    ActivityLogger, EntityLookup, FileService, JobService, PlaylistService, SystemService,
    UserService, VolumeService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Key-value store (Redis or in-memory)
    pub cache: CacheManager,

    // ── Auth ─────────────────────────────────────────────────
    /// Session cookie issuing and validation
    pub sessions: Arc<SessionManager>,
    /// Login throttling per client address
    pub guard: Arc<BruteForceGuard>,

    // ── Services ─────────────────────────────────────────────
    pub user_service: Arc<UserService>,
    pub volume_service: Arc<VolumeService>,
    pub file_service: Arc<FileService>,
    pub job_service: Arc<JobService>,
    pub playlist_service: Arc<PlaylistService>,
    pub system_service: Arc<SystemService>,
}

impl AppState {
    /// Wire repositories, auth and services over one pool and cache.
    pub fn build(config: AppConfig, db_pool: PgPool, cache: CacheManager) -> Self {
        // ── Repositories ─────────────────────────────────────
        let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
        let volume_repo = Arc::new(VolumeRepository::new(db_pool.clone()));
        let file_repo = Arc::new(FileRepository::new(db_pool.clone()));
        let share_repo = Arc::new(ShareRepository::new(db_pool.clone()));
        let job_repo = Arc::new(JobRepository::new(db_pool.clone()));
        let playlist_repo = Arc::new(PlaylistRepository::new(db_pool.clone()));
        let activity_repo = Arc::new(ActivityRepository::new(db_pool.clone()));

        // ── Auth ─────────────────────────────────────────────
        let password_hasher = Arc::new(PasswordHasher::new());
        let sessions = Arc::new(SessionManager::new(
            &config.web.secret_key,
            cache.clone(),
            config.web.session_expiry,
        ));
        let guard = Arc::new(BruteForceGuard::new(cache.clone(), &config.security));
        let resolver = Arc::new(PermissionResolver::new(Arc::clone(&volume_repo)));

        // ── Services ─────────────────────────────────────────
        let lookup = EntityLookup::new(
            Arc::clone(&user_repo),
            Arc::clone(&volume_repo),
            EntityCache::new(cache.clone()),
        );
        let activity = ActivityLogger::new(activity_repo);

        let user_service = Arc::new(UserService::new(
            Arc::clone(&user_repo),
            lookup.clone(),
            password_hasher,
            activity.clone(),
        ));
        let volume_service = Arc::new(VolumeService::new(
            Arc::clone(&volume_repo),
            Arc::clone(&file_repo),
            Arc::clone(&resolver),
            lookup.clone(),
            activity,
        ));
        let file_service = Arc::new(FileService::new(
            Arc::clone(&file_repo),
            share_repo,
            Arc::clone(&job_repo),
            Arc::clone(&resolver),
            lookup,
            config.web.temp_dir.clone(),
            config.web.public_link_expiry,
        ));
        let job_service = Arc::new(JobService::new(job_repo, Arc::clone(&resolver)));
        let playlist_service = Arc::new(PlaylistService::new(playlist_repo, file_repo, resolver));
        let system_service = Arc::new(SystemService::new(config.web.time_zone.clone()));

        Self {
            config: Arc::new(config),
            db_pool,
            cache,
            sessions,
            guard,
            user_service,
            volume_service,
            file_service,
            job_service,
            playlist_service,
            system_service,
        }
    }
}
