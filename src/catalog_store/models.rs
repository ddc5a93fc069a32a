use serde::{Deserialize, Serialize};

/// Contribution of an artist to a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistRole {
    Singer,
    Composer,
    SingerComposer,
    Producer,
    Band,
}

impl ArtistRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtistRole::Singer => "singer",
            ArtistRole::Composer => "composer",
            ArtistRole::SingerComposer => "singer_composer",
            ArtistRole::Producer => "producer",
            ArtistRole::Band => "band",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "singer" => Some(ArtistRole::Singer),
            "composer" => Some(ArtistRole::Composer),
            "singer_composer" => Some(ArtistRole::SingerComposer),
            "producer" => Some(ArtistRole::Producer),
            "band" => Some(ArtistRole::Band),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub normalized_title: String,
    pub slug: String,
    pub description: Option<String>,
    pub lyric: Option<String>,
    pub image_url: Option<String>,
    /// Unix seconds.
    pub release_at: Option<i64>,
    /// Primary artist.
    pub artist_id: Option<i64>,
    pub view_count: i64,
    pub fire_count: i64,
    pub snow_count: i64,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongArtist {
    pub id: i64,
    pub song_id: i64,
    pub artist_id: i64,
    pub role: ArtistRole,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongWithArtists {
    #[serde(flatten)]
    pub song: Song,
    pub artists: Vec<SongArtist>,
}

/// One entry of the credit list a caller wants a song to end up with.
/// Entries without `id` are new, entries with `id` refer to an existing
/// association of the song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredAssociation {
    pub id: Option<i64>,
    pub artist_id: i64,
    pub role: ArtistRole,
}

/// What a song update does to the song's credits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CreditsUpdate {
    #[default]
    Keep,
    /// Make the stored credits match this list, see [`plan_reconciliation`].
    ///
    /// [`plan_reconciliation`]: super::reconcile::plan_reconciliation
    Reconcile(Vec<DesiredAssociation>),
}

/// Credit of a song that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtistCredit {
    pub artist_id: i64,
    pub role: ArtistRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSongArtist {
    pub song_id: i64,
    pub artist_id: i64,
    pub role: ArtistRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongArtistUpdate {
    pub id: i64,
    pub artist_id: i64,
    pub role: ArtistRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtist {
    pub name: String,
    pub normalized_name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
}

/// Partial update, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistUpdate {
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub normalized_title: String,
    pub slug: String,
    pub description: Option<String>,
    pub lyric: Option<String>,
    pub image_url: Option<String>,
    pub release_at: Option<i64>,
    pub artist_id: Option<i64>,
}

/// Partial update, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub normalized_title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub lyric: Option<String>,
    pub image_url: Option<String>,
    pub release_at: Option<i64>,
    pub artist_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    /// Normalized substring of the title.
    pub title: Option<String>,
    /// Normalized substring of the name of any credited or primary artist.
    pub artist: Option<String>,
    pub artist_id: Option<i64>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Fire,
    Snow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongCounter {
    View,
    Reaction(Reaction),
}

impl SongCounter {
    pub fn column(&self) -> &'static str {
        match self {
            SongCounter::View => "view_count",
            SongCounter::Reaction(Reaction::Fire) => "fire_count",
            SongCounter::Reaction(Reaction::Snow) => "snow_count",
        }
    }
}
