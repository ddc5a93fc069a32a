use super::pagination::{PageMeta, Paginated};
use super::slug::unique_slug;
use crate::catalog_store::normalize::normalize_for_search;
use crate::catalog_store::{Artist, ArtistUpdate, CatalogStore, NewArtist, Page};
use crate::error::{ServiceError, ServiceResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const SLUG_FALLBACK: &str = "artist";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtistRequest {
    pub name: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArtistRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
}

pub(super) fn required_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// A name or title filter taken from a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SearchTerm {
    /// No filter given, or only whitespace.
    Any,
    Normalized(String),
    /// Text with nothing searchable in it, such as "!!!". Matches nothing.
    Unmatchable,
}

impl SearchTerm {
    pub(super) fn parse(query: Option<&str>) -> Self {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return SearchTerm::Any;
        };
        match normalize_for_search(query) {
            term if term.is_empty() => SearchTerm::Unmatchable,
            term => SearchTerm::Normalized(term),
        }
    }

    /// Store filter value, `None` for `Any`.
    pub(super) fn into_filter(self) -> Option<String> {
        match self {
            SearchTerm::Normalized(term) => Some(term),
            SearchTerm::Any | SearchTerm::Unmatchable => None,
        }
    }
}

#[derive(Clone)]
pub struct ArtistService {
    store: Arc<dyn CatalogStore>,
}

impl ArtistService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn list(&self, name: Option<&str>, page: Option<Page>) -> ServiceResult<Paginated<Artist>> {
        let name = SearchTerm::parse(name);
        if name == SearchTerm::Unmatchable {
            return Ok(Paginated::empty(page));
        }
        let (items, total_count) = self.store.list_artists(name.into_filter(), page)?;
        Ok(Paginated {
            items,
            meta: PageMeta::new(page, total_count),
        })
    }

    pub fn get(&self, id: i64) -> ServiceResult<Artist> {
        self.store
            .get_artist(id)?
            .ok_or_else(|| ServiceError::not_found("Artist"))
    }

    pub fn get_by_slug(&self, slug: &str) -> ServiceResult<Artist> {
        self.store
            .get_artist_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found("Artist"))
    }

    pub fn create(&self, request: CreateArtistRequest, user_id: i64) -> ServiceResult<Artist> {
        let name = required_text(&request.name, "name")?;
        let slug = unique_slug(&name, SLUG_FALLBACK, |s| {
            self.store.artist_slug_taken(s, None)
        })?;

        let artist = self.store.insert_artist(
            &NewArtist {
                normalized_name: normalize_for_search(&name),
                name,
                slug,
                image_url: request.image_url,
                bio: request.bio,
            },
            Some(user_id),
        )?;
        info!("User {} created artist {} ({})", user_id, artist.id, artist.slug);
        Ok(artist)
    }

    /// Renaming regenerates the normalized name and the slug.
    pub fn update(
        &self,
        id: i64,
        request: UpdateArtistRequest,
        user_id: i64,
    ) -> ServiceResult<Artist> {
        let mut update = ArtistUpdate {
            image_url: request.image_url,
            bio: request.bio,
            ..Default::default()
        };
        if let Some(name) = request.name {
            let name = required_text(&name, "name")?;
            update.slug = Some(unique_slug(&name, SLUG_FALLBACK, |s| {
                self.store.artist_slug_taken(s, Some(id))
            })?);
            update.normalized_name = Some(normalize_for_search(&name));
            update.name = Some(name);
        }

        self.store
            .update_artist(id, &update, Some(user_id))?
            .ok_or_else(|| ServiceError::not_found("Artist"))
    }

    /// Deletes the artist and every credit referencing it.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.store.delete_artist(id)? {
            return Err(ServiceError::not_found("Artist"));
        }
        info!("Deleted artist {}", id);
        Ok(())
    }

    pub fn delete_many(&self, ids: &[i64]) -> ServiceResult<usize> {
        let deleted = self.store.delete_artists(ids)?;
        info!("Deleted {} of {} artists", deleted, ids.len());
        Ok(deleted)
    }
}
