mod artist_service;
pub mod pagination;
mod slug;
mod song_service;

pub use artist_service::{ArtistService, CreateArtistRequest, UpdateArtistRequest};
pub use pagination::{page_from_query, PageMeta, Paginated};
pub use song_service::{CreateSongRequest, SongService, UpdateSongRequest};
