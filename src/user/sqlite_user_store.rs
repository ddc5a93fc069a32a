use super::user_models::{NewUser, User, UserRole, UserUpdate};
use super::user_store::UserStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    now_unix, open_versioned_db, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::debug;

/// V 0
const USERS_TABLE_V_0: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "verified",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "role",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'user'")
        ),
        sqlite_column!("deleted_at", &SqlType::Integer),
        sqlite_column!("created_by", &SqlType::Integer),
        sqlite_column!("updated_by", &SqlType::Integer),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_users_email", "email")],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USERS_TABLE_V_0],
    migration: None,
}];

const USER_COLUMNS: &str = "id, name, email, password_hash, image_url, active, verified, role, \
    deleted_at, created_by, updated_by, created_at, updated_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(7)?;
    let role = UserRole::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("Unknown user role {}", role_str).into(),
        )
    })?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image_url: row.get(4)?,
        active: row.get(5)?,
        verified: row.get(6)?,
        role,
        deleted_at: row.get(8)?,
        created_by: row.get(9)?,
        updated_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn select_live_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NULL",
                USER_COLUMNS, USERS_TABLE_V_0.name
            ),
            params![user_id],
            user_from_row,
        )
        .optional()?)
}

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, USER_VERSIONED_SCHEMAS, "user")?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn.lock().unwrap();
        let now = now_unix();
        conn.execute(
            &format!(
                "INSERT INTO {} (name, email, password_hash, image_url, active, verified, role, \
                 created_by, updated_by, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?9)",
                USERS_TABLE_V_0.name
            ),
            params![
                user.name,
                user.email,
                user.password_hash,
                user.image_url,
                user.active,
                user.verified,
                user.role.as_str(),
                user.created_by,
                now,
            ],
        )
        .with_context(|| format!("Failed to create user {}", user.email))?;

        let id = conn.last_insert_rowid();
        debug!("Created user {} with id {}", user.email, id);
        select_live_user(&conn, id)?.context("Created user vanished")
    }

    fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        select_live_user(&conn, user_id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE email = ?1 AND deleted_at IS NULL",
                    USER_COLUMNS, USERS_TABLE_V_0.name
                ),
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY id",
            USER_COLUMNS, USERS_TABLE_V_0.name
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<User>, _>>()?;
        Ok(users)
    }

    fn update_user(
        &self,
        user_id: i64,
        update: &UserUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<User>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if select_live_user(&tx, user_id)?.is_none() {
            return Ok(None);
        }

        let mut assignments: Vec<&str> = vec!["updated_at = ?", "updated_by = ?"];
        let mut values: Vec<Value> = vec![
            Value::Integer(now_unix()),
            updated_by.map(Value::Integer).unwrap_or(Value::Null),
        ];
        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(email) = &update.email {
            assignments.push("email = ?");
            values.push(Value::Text(email.clone()));
        }
        if let Some(password_hash) = &update.password_hash {
            assignments.push("password_hash = ?");
            values.push(Value::Text(password_hash.clone()));
        }
        if let Some(image_url) = &update.image_url {
            assignments.push("image_url = ?");
            values.push(Value::Text(image_url.clone()));
        }
        if let Some(active) = update.active {
            assignments.push("active = ?");
            values.push(Value::Integer(active as i64));
        }
        if let Some(verified) = update.verified {
            assignments.push("verified = ?");
            values.push(Value::Integer(verified as i64));
        }
        if let Some(role) = update.role {
            assignments.push("role = ?");
            values.push(Value::Text(role.as_str().to_string()));
        }
        values.push(Value::Integer(user_id));

        tx.execute(
            &format!(
                "UPDATE {} SET {} WHERE id = ?",
                USERS_TABLE_V_0.name,
                assignments.join(", ")
            ),
            params_from_iter(values),
        )
        .with_context(|| format!("Failed to update user {}", user_id))?;

        let user = select_live_user(&tx, user_id)?;
        tx.commit()?;
        Ok(user)
    }

    fn soft_delete_user(&self, user_id: i64, deleted_by: Option<i64>) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let now = now_unix();
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET deleted_at = ?1, active = 0, updated_at = ?1, updated_by = ?2 \
                 WHERE id = ?3 AND deleted_at IS NULL",
                USERS_TABLE_V_0.name
            ),
            params![now, deleted_by, user_id],
        )?;
        Ok(changed > 0)
    }
}
