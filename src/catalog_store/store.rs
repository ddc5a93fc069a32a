//! SQLite implementation of [`CatalogStore`].

use super::models::{
    Artist, ArtistCredit, ArtistRole, ArtistUpdate, CreditsUpdate, NewArtist, NewSong, Page, Song,
    SongArtist, SongCounter, SongFilter, SongUpdate,
};
use super::reconcile::{plan_reconciliation, ReconciliationPlan};
use super::schema::{ARTISTS_TABLE, CATALOG_VERSIONED_SCHEMAS, SONGS_TABLE, SONG_ARTISTS_TABLE};
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::{now_unix, open_versioned_db};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::debug;

const ARTIST_COLUMNS: &str =
    "id, name, normalized_name, slug, image_url, bio, created_by, updated_by, created_at, updated_at";

const SONG_COLUMNS: &str = "id, title, normalized_title, slug, description, lyric, image_url, \
    release_at, artist_id, view_count, fire_count, snow_count, created_by, updated_by, \
    created_at, updated_at";

const SONG_ARTIST_COLUMNS: &str =
    "id, song_id, artist_id, role, created_by, updated_by, created_at, updated_at";

fn artist_from_row(row: &Row) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        normalized_name: row.get(2)?,
        slug: row.get(3)?,
        image_url: row.get(4)?,
        bio: row.get(5)?,
        created_by: row.get(6)?,
        updated_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        normalized_title: row.get(2)?,
        slug: row.get(3)?,
        description: row.get(4)?,
        lyric: row.get(5)?,
        image_url: row.get(6)?,
        release_at: row.get(7)?,
        artist_id: row.get(8)?,
        view_count: row.get(9)?,
        fire_count: row.get(10)?,
        snow_count: row.get(11)?,
        created_by: row.get(12)?,
        updated_by: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn song_artist_from_row(row: &Row) -> rusqlite::Result<SongArtist> {
    let role_str: String = row.get(3)?;
    let role = ArtistRole::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Unknown artist role {}", role_str).into(),
        )
    })?;
    Ok(SongArtist {
        id: row.get(0)?,
        song_id: row.get(1)?,
        artist_id: row.get(2)?,
        role,
        created_by: row.get(4)?,
        updated_by: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `SET` clause of a partial update. Audit columns are always present.
struct SetClause {
    assignments: Vec<&'static str>,
    values: Vec<Value>,
}

impl SetClause {
    fn stamped(updated_by: Option<i64>) -> Self {
        SetClause {
            assignments: vec!["updated_at = ?", "updated_by = ?"],
            values: vec![Value::Integer(now_unix()), updated_by.into()],
        }
    }

    fn set_opt<T: Clone + Into<Value>>(&mut self, assignment: &'static str, value: &Option<T>) {
        if let Some(value) = value {
            self.assignments.push(assignment);
            self.values.push(value.clone().into());
        }
    }

    /// Runs `UPDATE table SET ... WHERE id = ?` and returns the changed row count.
    fn execute(mut self, conn: &Connection, table: &str, id: i64) -> Result<usize> {
        self.values.push(Value::Integer(id));
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE id = ?",
                table,
                self.assignments.join(", ")
            ),
            params_from_iter(self.values),
        )?;
        Ok(changed)
    }
}

/// Runs `f` between `BEGIN IMMEDIATE` and `COMMIT`, rolling back on error.
fn in_transaction<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])?;
    match f(conn) {
        Ok(value) => {
            conn.execute("COMMIT", [])?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(e)
        }
    }
}

fn select_artist(conn: &Connection, id: i64) -> Result<Option<Artist>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                ARTIST_COLUMNS, ARTISTS_TABLE.name
            ),
            params![id],
            artist_from_row,
        )
        .optional()?)
}

fn select_song(conn: &Connection, id: i64) -> Result<Option<Song>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                SONG_COLUMNS, SONGS_TABLE.name
            ),
            params![id],
            song_from_row,
        )
        .optional()?)
}

fn select_song_artists(conn: &Connection, song_id: i64) -> Result<Vec<SongArtist>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE song_id = ?1 ORDER BY id",
        SONG_ARTIST_COLUMNS, SONG_ARTISTS_TABLE.name
    ))?;
    let credits = stmt
        .query_map(params![song_id], song_artist_from_row)?
        .collect::<Result<Vec<SongArtist>, _>>()?;
    Ok(credits)
}

fn slug_taken(conn: &Connection, table: &str, slug: &str, except_id: Option<i64>) -> Result<bool> {
    let taken: bool = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE slug = ?1 AND (?2 IS NULL OR id != ?2))",
            table
        ),
        params![slug, except_id],
        |r| r.get(0),
    )?;
    Ok(taken)
}

fn insert_credits(
    conn: &Connection,
    song_id: i64,
    credits: impl Iterator<Item = (i64, ArtistRole)>,
    user_id: Option<i64>,
    now: i64,
) -> Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} (song_id, artist_id, role, created_by, updated_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?5)",
        SONG_ARTISTS_TABLE.name
    ))?;
    let mut inserted = 0;
    for (artist_id, role) in credits {
        stmt.execute(params![song_id, artist_id, role.as_str(), user_id, now])
            .with_context(|| format!("Failed to credit artist {} on song {}", artist_id, song_id))?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Inserts, then deletes, then updates. Empty sets issue no statement.
fn apply_credits(
    conn: &Connection,
    song_id: i64,
    plan: &ReconciliationPlan,
    user_id: Option<i64>,
) -> Result<()> {
    let now = now_unix();

    if !plan.to_insert.is_empty() {
        insert_credits(
            conn,
            song_id,
            plan.to_insert.iter().map(|c| (c.artist_id, c.role)),
            user_id,
            now,
        )?;
    }

    if !plan.to_delete_ids.is_empty() {
        let mut values: Vec<Value> = vec![Value::Integer(song_id)];
        values.extend(plan.to_delete_ids.iter().map(|id| Value::Integer(*id)));
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE song_id = ? AND id IN ({})",
                SONG_ARTISTS_TABLE.name,
                placeholders(plan.to_delete_ids.len())
            ),
            params_from_iter(values),
        )?;
    }

    if !plan.to_update.is_empty() {
        let mut stmt = conn.prepare(&format!(
            "UPDATE {} SET artist_id = ?1, role = ?2, updated_by = ?3, updated_at = ?4 \
             WHERE id = ?5 AND song_id = ?6",
            SONG_ARTISTS_TABLE.name
        ))?;
        for update in &plan.to_update {
            stmt.execute(params![
                update.artist_id,
                update.role.as_str(),
                user_id,
                now,
                update.id,
                song_id
            ])?;
        }
    }

    debug!(
        "Song {} credits: {} inserted, {} deleted, {} updated",
        song_id,
        plan.to_insert.len(),
        plan.to_delete_ids.len(),
        plan.to_update.len()
    );
    Ok(())
}

fn delete_song_in(conn: &Connection, id: i64) -> Result<bool> {
    conn.execute(
        &format!("DELETE FROM {} WHERE song_id = ?1", SONG_ARTISTS_TABLE.name),
        params![id],
    )?;
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", SONGS_TABLE.name),
        params![id],
    )?;
    Ok(deleted > 0)
}

fn delete_artist_in(conn: &Connection, id: i64) -> Result<bool> {
    conn.execute(
        &format!(
            "UPDATE {} SET artist_id = NULL, updated_at = ?1 WHERE artist_id = ?2",
            SONGS_TABLE.name
        ),
        params![now_unix(), id],
    )?;
    let credits = conn.execute(
        &format!("DELETE FROM {} WHERE artist_id = ?1", SONG_ARTISTS_TABLE.name),
        params![id],
    )?;
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", ARTISTS_TABLE.name),
        params![id],
    )?;
    if deleted > 0 {
        debug!("Deleted artist {} and {} credits", id, credits);
    }
    Ok(deleted > 0)
}

fn query_page<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    conditions: &[String],
    values: Vec<Value>,
    page: Option<Page>,
    from_row: fn(&Row) -> rusqlite::Result<T>,
) -> Result<(Vec<T>, u64)> {
    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}{}", table, where_sql),
        params_from_iter(values.iter()),
        |r| r.get(0),
    )?;

    let mut sql = format!("SELECT {} FROM {}{} ORDER BY id", columns, table, where_sql);
    let mut values = values;
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::Integer(page.page_size as i64));
        values.push(Value::Integer(page.offset() as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(values), from_row)?
        .collect::<Result<Vec<T>, _>>()?;
    Ok((items, total as u64))
}

pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Artists
    // =========================================================================

    fn insert_artist(&self, artist: &NewArtist, created_by: Option<i64>) -> Result<Artist> {
        let conn = self.conn.lock().unwrap();
        let now = now_unix();
        conn.execute(
            &format!(
                "INSERT INTO {} (name, normalized_name, slug, image_url, bio, created_by, \
                 updated_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?7)",
                ARTISTS_TABLE.name
            ),
            params![
                artist.name,
                artist.normalized_name,
                artist.slug,
                artist.image_url,
                artist.bio,
                created_by,
                now
            ],
        )
        .with_context(|| format!("Failed to insert artist {}", artist.slug))?;
        let id = conn.last_insert_rowid();
        select_artist(&conn, id)?.context("Inserted artist vanished")
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        select_artist(&conn, id)
    }

    fn get_artist_by_slug(&self, slug: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE slug = ?1",
                    ARTIST_COLUMNS, ARTISTS_TABLE.name
                ),
                params![slug],
                artist_from_row,
            )
            .optional()?)
    }

    fn artist_slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        slug_taken(&conn, ARTISTS_TABLE.name, slug, except_id)
    }

    fn list_artists(
        &self,
        name_query: Option<String>,
        page: Option<Page>,
    ) -> Result<(Vec<Artist>, u64)> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec![];
        let mut values = vec![];
        if let Some(query) = name_query {
            conditions.push("normalized_name LIKE '%' || ? || '%'".to_string());
            values.push(Value::Text(query));
        }
        query_page(
            &conn,
            ARTISTS_TABLE.name,
            ARTIST_COLUMNS,
            &conditions,
            values,
            page,
            artist_from_row,
        )
    }

    fn update_artist(
        &self,
        id: i64,
        update: &ArtistUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut set = SetClause::stamped(updated_by);
        set.set_opt("name = ?", &update.name);
        set.set_opt("normalized_name = ?", &update.normalized_name);
        set.set_opt("slug = ?", &update.slug);
        set.set_opt("image_url = ?", &update.image_url);
        set.set_opt("bio = ?", &update.bio);

        let changed = set
            .execute(&conn, ARTISTS_TABLE.name, id)
            .with_context(|| format!("Failed to update artist {}", id))?;
        if changed == 0 {
            return Ok(None);
        }
        select_artist(&conn, id)
    }

    fn delete_artist(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| delete_artist_in(conn, id))
    }

    fn delete_artists(&self, ids: &[i64]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| {
            let mut deleted = 0;
            for id in ids {
                if delete_artist_in(conn, *id)? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
    }

    // =========================================================================
    // Songs
    // =========================================================================

    fn insert_song(
        &self,
        song: &NewSong,
        credits: &[ArtistCredit],
        created_by: Option<i64>,
    ) -> Result<Song> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| {
            let now = now_unix();
            conn.execute(
                &format!(
                    "INSERT INTO {} (title, normalized_title, slug, description, lyric, image_url, \
                     release_at, artist_id, created_by, updated_by, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10, ?10)",
                    SONGS_TABLE.name
                ),
                params![
                    song.title,
                    song.normalized_title,
                    song.slug,
                    song.description,
                    song.lyric,
                    song.image_url,
                    song.release_at,
                    song.artist_id,
                    created_by,
                    now
                ],
            )
            .with_context(|| format!("Failed to insert song {}", song.slug))?;
            let id = conn.last_insert_rowid();

            if !credits.is_empty() {
                insert_credits(
                    conn,
                    id,
                    credits.iter().map(|c| (c.artist_id, c.role)),
                    created_by,
                    now,
                )?;
            }
            select_song(conn, id)?.context("Inserted song vanished")
        })
    }

    fn get_song(&self, id: i64) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        select_song(&conn, id)
    }

    fn get_song_by_slug(&self, slug: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE slug = ?1",
                    SONG_COLUMNS, SONGS_TABLE.name
                ),
                params![slug],
                song_from_row,
            )
            .optional()?)
    }

    fn song_slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        slug_taken(&conn, SONGS_TABLE.name, slug, except_id)
    }

    fn list_songs(&self, filter: &SongFilter, page: Option<Page>) -> Result<(Vec<Song>, u64)> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec![];
        let mut values = vec![];

        if let Some(title) = &filter.title {
            conditions.push("normalized_title LIKE '%' || ? || '%'".to_string());
            values.push(Value::Text(title.clone()));
        }
        if let Some(artist) = &filter.artist {
            conditions.push(format!(
                "(artist_id IN (SELECT id FROM {artists} WHERE normalized_name LIKE '%' || ? || '%') \
                 OR EXISTS (SELECT 1 FROM {credits} sa JOIN {artists} a ON a.id = sa.artist_id \
                 WHERE sa.song_id = {songs}.id AND a.normalized_name LIKE '%' || ? || '%'))",
                artists = ARTISTS_TABLE.name,
                credits = SONG_ARTISTS_TABLE.name,
                songs = SONGS_TABLE.name,
            ));
            values.push(Value::Text(artist.clone()));
            values.push(Value::Text(artist.clone()));
        }
        if let Some(artist_id) = filter.artist_id {
            conditions.push(format!(
                "(artist_id = ? OR EXISTS (SELECT 1 FROM {credits} sa \
                 WHERE sa.song_id = {songs}.id AND sa.artist_id = ?))",
                credits = SONG_ARTISTS_TABLE.name,
                songs = SONGS_TABLE.name,
            ));
            values.push(Value::Integer(artist_id));
            values.push(Value::Integer(artist_id));
        }

        query_page(
            &conn,
            SONGS_TABLE.name,
            SONG_COLUMNS,
            &conditions,
            values,
            page,
            song_from_row,
        )
    }

    fn update_song(
        &self,
        id: i64,
        update: &SongUpdate,
        credits: &CreditsUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| {
            if select_song(conn, id)?.is_none() {
                return Ok(None);
            }

            if let CreditsUpdate::Reconcile(desired) = credits {
                let existing = select_song_artists(conn, id)?;
                let plan = plan_reconciliation(id, desired, &existing)?;
                apply_credits(conn, id, &plan, updated_by)?;
            }

            let mut set = SetClause::stamped(updated_by);
            set.set_opt("title = ?", &update.title);
            set.set_opt("normalized_title = ?", &update.normalized_title);
            set.set_opt("slug = ?", &update.slug);
            set.set_opt("description = ?", &update.description);
            set.set_opt("lyric = ?", &update.lyric);
            set.set_opt("image_url = ?", &update.image_url);
            set.set_opt("release_at = ?", &update.release_at);
            set.set_opt("artist_id = ?", &update.artist_id);
            set.execute(conn, SONGS_TABLE.name, id)
                .with_context(|| format!("Failed to update song {}", id))?;

            select_song(conn, id)
        })
    }

    fn delete_song(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| delete_song_in(conn, id))
    }

    fn delete_songs(&self, ids: &[i64]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        in_transaction(&conn, |conn| {
            let mut deleted = 0;
            for id in ids {
                if delete_song_in(conn, *id)? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
    }

    fn increment_song_counter(&self, id: i64, counter: SongCounter) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let column = counter.column();
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET {} = {} + 1 WHERE id = ?1",
                SONGS_TABLE.name, column, column
            ),
            params![id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_song(&conn, id)
    }

    // =========================================================================
    // Credits
    // =========================================================================

    fn get_song_artists(&self, song_id: i64) -> Result<Vec<SongArtist>> {
        let conn = self.conn.lock().unwrap();
        select_song_artists(&conn, song_id)
    }

    fn get_song_artist(&self, id: i64) -> Result<Option<SongArtist>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    SONG_ARTIST_COLUMNS, SONG_ARTISTS_TABLE.name
                ),
                params![id],
                song_artist_from_row,
            )
            .optional()?)
    }

    fn get_artist_songs(&self, artist_id: i64) -> Result<Vec<SongArtist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE artist_id = ?1 ORDER BY id",
            SONG_ARTIST_COLUMNS, SONG_ARTISTS_TABLE.name
        ))?;
        let credits = stmt
            .query_map(params![artist_id], song_artist_from_row)?
            .collect::<Result<Vec<SongArtist>, _>>()?;
        Ok(credits)
    }
}
