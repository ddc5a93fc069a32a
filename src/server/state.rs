use axum::extract::FromRef;

use crate::catalog::{ArtistService, SongService};
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedArtistService = Arc<ArtistService>;
pub type GuardedSongService = Arc<SongService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub artist_service: GuardedArtistService,
    pub song_service: GuardedSongService,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        user_manager: UserManager,
        artist_service: ArtistService,
        song_service: SongService,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(user_manager),
            artist_service: Arc::new(artist_service),
            song_service: Arc::new(song_service),
        }
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedArtistService {
    fn from_ref(input: &ServerState) -> Self {
        input.artist_service.clone()
    }
}

impl FromRef<ServerState> for GuardedSongService {
    fn from_ref(input: &ServerState) -> Self {
        input.song_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
