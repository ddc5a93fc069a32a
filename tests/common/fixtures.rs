//! Test fixture creation for the user and catalog databases
//!
//! Fixtures go through the services, so ids are assigned in insertion order
//! and match the ones in `constants`.

use super::constants::*;
use anyhow::Result;
use songbook_server::catalog::{ArtistService, CreateArtistRequest, CreateSongRequest, SongService};
use songbook_server::catalog_store::{ArtistRole, DesiredAssociation};
use songbook_server::config::AdminConfig;
use songbook_server::user::{RegisterRequest, UserManager};

/// Creates the admin (id 1) and the regular test user (id 2).
pub fn create_test_users(user_manager: &UserManager) -> Result<()> {
    user_manager.ensure_admin(&AdminConfig {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASS.to_string(),
        name: Some(ADMIN_NAME.to_string()),
    })?;
    user_manager.register(RegisterRequest {
        name: TEST_USER_NAME.to_string(),
        email: TEST_USER_EMAIL.to_string(),
        password: TEST_PASS.to_string(),
        image_url: None,
    })?;
    Ok(())
}

fn credit(artist_id: i64, role: ArtistRole) -> DesiredAssociation {
    DesiredAssociation {
        id: None,
        artist_id,
        role,
    }
}

fn song(title: &str, artist_id: i64, artists: Vec<DesiredAssociation>) -> CreateSongRequest {
    CreateSongRequest {
        title: title.to_string(),
        description: None,
        lyric: None,
        image_url: None,
        release_at: None,
        artist_id: Some(artist_id),
        artists,
    }
}

/// Creates 3 artists and 3 songs with their credits.
pub fn create_test_catalog(artists: &ArtistService, songs: &SongService) -> Result<()> {
    for name in [ARTIST_1_NAME, ARTIST_2_NAME, ARTIST_3_NAME] {
        artists.create(
            CreateArtistRequest {
                name: name.to_string(),
                image_url: None,
                bio: None,
            },
            ADMIN_ID,
        )?;
    }

    songs.create(
        song(
            SONG_1_TITLE,
            ARTIST_1_ID,
            vec![credit(ARTIST_1_ID, ArtistRole::SingerComposer)],
        ),
        ADMIN_ID,
    )?;
    songs.create(
        song(
            SONG_2_TITLE,
            ARTIST_2_ID,
            vec![
                credit(ARTIST_2_ID, ArtistRole::Singer),
                credit(ARTIST_3_ID, ArtistRole::Composer),
            ],
        ),
        ADMIN_ID,
    )?;
    songs.create(
        song(
            SONG_3_TITLE,
            ARTIST_2_ID,
            vec![credit(ARTIST_2_ID, ArtistRole::Singer)],
        ),
        ADMIN_ID,
    )?;
    Ok(())
}
