//! Song credit reconciliation.
//!
//! Turns the credit list a caller wants for a song, together with the
//! associations currently stored, into the inserts, deletes and updates that
//! make the stored set match. The plan is computed here without touching
//! storage and applied by the store in one transaction.

use super::models::{DesiredAssociation, NewSongArtist, SongArtist, SongArtistUpdate};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("association {0} is listed more than once")]
    DuplicateAssociationId(i64),
    #[error("association {0} does not belong to this song")]
    UnknownAssociationId(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_insert: Vec<NewSongArtist>,
    pub to_update: Vec<SongArtistUpdate>,
    pub to_delete_ids: Vec<i64>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete_ids.is_empty()
    }
}

/// Computes the plan for `song_id`.
///
/// Entries without id are inserted. Existing associations whose id is not
/// listed are deleted, so an empty `desired` list removes every credit.
/// Listed ids are updated in place with the given artist and role.
///
/// A listed id that is not among `existing`, or an id listed twice, rejects
/// the whole request.
pub fn plan_reconciliation(
    song_id: i64,
    desired: &[DesiredAssociation],
    existing: &[SongArtist],
) -> Result<ReconciliationPlan, ReconcileError> {
    let existing_ids: HashSet<i64> = existing.iter().map(|a| a.id).collect();

    let mut desired_ids = HashSet::new();
    for id in desired.iter().filter_map(|d| d.id) {
        if !desired_ids.insert(id) {
            return Err(ReconcileError::DuplicateAssociationId(id));
        }
        if !existing_ids.contains(&id) {
            return Err(ReconcileError::UnknownAssociationId(id));
        }
    }

    let mut plan = ReconciliationPlan::default();
    for entry in desired {
        match entry.id {
            None => plan.to_insert.push(NewSongArtist {
                song_id,
                artist_id: entry.artist_id,
                role: entry.role,
            }),
            Some(id) => plan.to_update.push(SongArtistUpdate {
                id,
                artist_id: entry.artist_id,
                role: entry.role,
            }),
        }
    }
    plan.to_delete_ids = existing
        .iter()
        .map(|a| a.id)
        .filter(|id| !desired_ids.contains(id))
        .collect();

    Ok(plan)
}
