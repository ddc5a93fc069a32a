use anyhow::Result;
use std::time::Duration;

use tracing::info;

use axum::{
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use super::guards::{AdminSession, UserSubject};
use super::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::session::{Session, COOKIE_ACCESS_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};
use axum::extract::State;

use crate::catalog::{
    page_from_query, ArtistService, CreateArtistRequest, CreateSongRequest, SongService,
    UpdateArtistRequest, UpdateSongRequest,
};
use crate::catalog_store::{Artist, Reaction, Song, SongWithArtists};
use crate::error::{ServiceError, ServiceResult};
use crate::user::{
    CreateUserRequest, LoginRequest, RegisterRequest, TokenPair, UpdateUserRequest, User,
    UserManager,
};

type ApiResult<T> = ServiceResult<ApiResponse<T>>;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
struct ReactBody {
    pub kind: Reaction,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ArtistListQuery {
    pub name: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SongListQuery {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artist_id: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct BulkDeleteQuery {
    pub ids: Option<String>,
}

#[derive(Serialize, Debug)]
struct BulkDeleteResult {
    pub deleted: usize,
}

/// Parses a comma separated list of positive ids, e.g. `1,2,3`.
fn parse_ids(raw: Option<&str>) -> ServiceResult<Vec<i64>> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("ids query parameter is required".to_string()))?;

    raw.split(',')
        .map(|part| match part.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ServiceError::BadRequest(format!("Invalid id {:?}", part))),
        })
        .collect()
}

fn access_token_cookie(pair: &TokenPair) -> Cookie<'static> {
    Cookie::build((COOKIE_ACCESS_TOKEN_KEY, pair.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(pair.expires_in))
        .build()
}

fn with_token_cookie(pair: TokenPair) -> Response {
    let cookie = access_token_cookie(&pair);
    (
        [(header::SET_COOKIE, cookie.to_string())],
        ApiResponse::ok(pair),
    )
        .into_response()
}

async fn home(State(state): State<ServerState>) -> ApiResponse<ServerStats> {
    ApiResponse::ok(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Auth
// =============================================================================

async fn register(
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ServiceResult<Response> {
    let pair = user_manager.register(body)?;
    Ok(with_token_cookie(pair))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ServiceResult<Response> {
    let pair = user_manager.login(&body.email, &body.password)?;
    Ok(with_token_cookie(pair))
}

async fn refresh(
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<RefreshBody>,
) -> ServiceResult<Response> {
    let pair = user_manager.refresh(&body.refresh_token)?;
    Ok(with_token_cookie(pair))
}

async fn logout() -> Response {
    let cookie = Cookie::build(Cookie::new(COOKIE_ACCESS_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
        .same_site(SameSite::Lax)
        .build();

    (
        [(header::SET_COOKIE, cookie.to_string())],
        ApiResponse::ok(()),
    )
        .into_response()
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(
    _: AdminSession,
    State(user_manager): State<GuardedUserManager>,
) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::ok(user_manager.list_users()?))
}

async fn get_user(
    UserSubject { id, .. }: UserSubject,
    State(user_manager): State<GuardedUserManager>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(user_manager.get_user(id)?))
}

async fn post_user(
    AdminSession(session): AdminSession,
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(
        user_manager.create_user(body, session.user_id())?,
    ))
}

async fn patch_user(
    UserSubject { session, id }: UserSubject,
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(
        user_manager.update_user(id, body, &session.claims)?,
    ))
}

async fn delete_user(
    AdminSession(session): AdminSession,
    State(user_manager): State<GuardedUserManager>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    user_manager.delete_user(id, session.user_id())?;
    Ok(ApiResponse::ok(()))
}

// =============================================================================
// Artists
// =============================================================================

async fn list_artists(
    State(artists): State<GuardedArtistService>,
    ApiQuery(query): ApiQuery<ArtistListQuery>,
) -> ApiResult<Vec<Artist>> {
    let page = page_from_query(query.page, query.page_size)?;
    Ok(ApiResponse::paged(artists.list(query.name.as_deref(), page)?))
}

async fn get_artist(
    State(artists): State<GuardedArtistService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Artist> {
    Ok(ApiResponse::ok(artists.get(id)?))
}

async fn get_artist_by_slug(
    State(artists): State<GuardedArtistService>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Artist> {
    Ok(ApiResponse::ok(artists.get_by_slug(&slug)?))
}

async fn post_artist(
    AdminSession(session): AdminSession,
    State(artists): State<GuardedArtistService>,
    ApiJson(body): ApiJson<CreateArtistRequest>,
) -> ApiResult<Artist> {
    Ok(ApiResponse::ok(artists.create(body, session.user_id())?))
}

async fn patch_artist(
    AdminSession(session): AdminSession,
    State(artists): State<GuardedArtistService>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateArtistRequest>,
) -> ApiResult<Artist> {
    Ok(ApiResponse::ok(artists.update(id, body, session.user_id())?))
}

async fn delete_artist(
    _: AdminSession,
    State(artists): State<GuardedArtistService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    artists.delete(id)?;
    Ok(ApiResponse::ok(()))
}

async fn delete_artists(
    _: AdminSession,
    State(artists): State<GuardedArtistService>,
    ApiQuery(query): ApiQuery<BulkDeleteQuery>,
) -> ApiResult<BulkDeleteResult> {
    let ids = parse_ids(query.ids.as_deref())?;
    Ok(ApiResponse::ok(BulkDeleteResult {
        deleted: artists.delete_many(&ids)?,
    }))
}

// =============================================================================
// Songs
// =============================================================================

async fn list_songs(
    State(songs): State<GuardedSongService>,
    ApiQuery(query): ApiQuery<SongListQuery>,
) -> ApiResult<Vec<Song>> {
    let page = page_from_query(query.page, query.page_size)?;
    Ok(ApiResponse::paged(songs.list(
        query.title.as_deref(),
        query.artist.as_deref(),
        query.artist_id,
        page,
    )?))
}

async fn get_song(
    State(songs): State<GuardedSongService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<SongWithArtists> {
    Ok(ApiResponse::ok(songs.get(id)?))
}

async fn get_song_by_slug(
    State(songs): State<GuardedSongService>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<SongWithArtists> {
    Ok(ApiResponse::ok(songs.get_by_slug(&slug)?))
}

async fn post_song(
    AdminSession(session): AdminSession,
    State(songs): State<GuardedSongService>,
    ApiJson(body): ApiJson<CreateSongRequest>,
) -> ApiResult<SongWithArtists> {
    Ok(ApiResponse::ok(songs.create(body, session.user_id())?))
}

async fn patch_song(
    AdminSession(session): AdminSession,
    State(songs): State<GuardedSongService>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateSongRequest>,
) -> ApiResult<SongWithArtists> {
    Ok(ApiResponse::ok(songs.update(id, body, session.user_id())?))
}

async fn delete_song(
    _: AdminSession,
    State(songs): State<GuardedSongService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    songs.delete(id)?;
    Ok(ApiResponse::ok(()))
}

async fn delete_songs(
    _: AdminSession,
    State(songs): State<GuardedSongService>,
    ApiQuery(query): ApiQuery<BulkDeleteQuery>,
) -> ApiResult<BulkDeleteResult> {
    let ids = parse_ids(query.ids.as_deref())?;
    Ok(ApiResponse::ok(BulkDeleteResult {
        deleted: songs.delete_many(&ids)?,
    }))
}

async fn view_song(
    State(songs): State<GuardedSongService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Song> {
    Ok(ApiResponse::ok(songs.record_view(id)?))
}

async fn react_to_song(
    _session: Session,
    State(songs): State<GuardedSongService>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ReactBody>,
) -> ApiResult<Song> {
    Ok(ApiResponse::ok(songs.react(id, body.kind)?))
}

pub fn make_app(
    config: ServerConfig,
    user_manager: UserManager,
    artist_service: ArtistService,
    song_service: SongService,
) -> Router {
    let state = ServerState::new(config, user_manager, artist_service, song_service);

    let auth_routes: Router<ServerState> = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", get(logout));

    let user_routes: Router<ServerState> = Router::new()
        .route("/", get(list_users).post(post_user))
        .route("/{id}", get(get_user).patch(patch_user).delete(delete_user));

    let artist_routes: Router<ServerState> = Router::new()
        .route(
            "/",
            get(list_artists).post(post_artist).delete(delete_artists),
        )
        .route("/slug/{slug}", get(get_artist_by_slug))
        .route(
            "/{id}",
            get(get_artist).patch(patch_artist).delete(delete_artist),
        );

    let song_routes: Router<ServerState> = Router::new()
        .route("/", get(list_songs).post(post_song).delete(delete_songs))
        .route("/slug/{slug}", get(get_song_by_slug))
        .route("/{id}", get(get_song).patch(patch_song).delete(delete_song))
        .route("/{id}/view", post(view_song))
        .route("/{id}/react", post(react_to_song));

    Router::new()
        .route("/", get(home))
        .merge(auth_routes)
        .nest("/api/user", user_routes)
        .nest("/api/artist", artist_routes)
        .nest("/api/song", song_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

pub async fn run_server(
    config: ServerConfig,
    user_manager: UserManager,
    artist_service: ArtistService,
    song_service: SongService,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_manager, artist_service, song_service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
