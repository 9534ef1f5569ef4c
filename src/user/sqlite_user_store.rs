use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};

use super::account_models::{
    Account, NewPasswordCredentials, PasswordCredentials, UserSummary, VerificationToken,
};
use super::auth::VerificationTokenValue;
use super::store::{AccountStore, VerificationTokenStore};
use crate::library::models::{AlbumStatus, Review, StatusKind};
use crate::library::store::LibraryStore;

use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
};
use tracing::info;

/// V 0
const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "verified",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("profile_picture", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_account_username", "username"),
        ("idx_account_email", "email"),
    ],
};

const ACCOUNT_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "account_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const EMAIL_VERIFICATION_TABLE_V_0: Table = Table {
    name: "email_verification",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("expires", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_email_verification_value", "value")],
};

const ALBUM_STATUS_TABLE_V_0: Table = Table {
    name: "album_status",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("album_id", &SqlType::Text, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_favorite",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "album_id"]],
    indices: &[("idx_album_status_user", "user_id")],
};

const REVIEW_TABLE_V_0: Table = Table {
    name: "review",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("album_id", &SqlType::Text, non_null = true),
        sqlite_column!("rating", &SqlType::Real),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "album_id"]],
    indices: &[("idx_review_album", "album_id")],
};

const FOLLOW_TABLE_V_0: Table = Table {
    name: "follow",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "follower_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "followee_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["follower_id", "followee_id"]],
    indices: &[("idx_follow_followee", "followee_id")],
};

const VERSIONED_SCHEMAS: [VersionedSchema; 1] = [VersionedSchema {
    version: 0,
    tables: &[
        ACCOUNT_TABLE_V_0,
        ACCOUNT_CREDENTIALS_TABLE_V_0,
        EMAIL_VERIFICATION_TABLE_V_0,
        ALBUM_STATUS_TABLE_V_0,
        REVIEW_TABLE_V_0,
        FOLLOW_TABLE_V_0,
    ],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
            conn
        };
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Database version {} is too old, does not contain base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        if db_version >= VERSIONED_SCHEMAS.len() as i64 {
            bail!("Database version {} is too new", db_version);
        } else {
            VERSIONED_SCHEMAS
                .get(version)
                .context("Failed to get schema")?
                .validate(&conn)?;
        }

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }

    fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            verified: row.get(3)?,
            profile_picture: row.get(4)?,
            created: row.get(5)?,
        })
    }

    fn row_to_summary(row: &Row) -> rusqlite::Result<UserSummary> {
        Ok(UserSummary {
            id: row.get(0)?,
            username: row.get(1)?,
            profile_picture: row.get(2)?,
        })
    }

    fn row_to_status(row: &Row) -> rusqlite::Result<AlbumStatus> {
        let status_str: String = row.get(3)?;
        let status = StatusKind::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown status '{}'", status_str).into(),
            )
        })?;
        Ok(AlbumStatus {
            id: row.get(0)?,
            user_id: row.get(1)?,
            album_id: row.get(2)?,
            status,
            is_favorite: row.get(4)?,
            created: row.get(5)?,
            updated: row.get(6)?,
        })
    }

    fn row_to_review(row: &Row) -> rusqlite::Result<Review> {
        Ok(Review {
            id: row.get(0)?,
            user_id: row.get(1)?,
            album_id: row.get(2)?,
            rating: row.get(3)?,
            content: row.get(4)?,
            created: row.get(5)?,
            updated: row.get(6)?,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, username, email, verified, profile_picture, created";
const STATUS_COLUMNS: &str = "id, user_id, album_id, status, is_favorite, created, updated";
const REVIEW_COLUMNS: &str = "id, user_id, album_id, rating, content, created, updated";

impl AccountStore for SqliteUserStore {
    fn create_account(
        &self,
        username: &str,
        email: &str,
        credentials: NewPasswordCredentials,
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO account (username, email) VALUES (?1, ?2)",
            params![username, email],
        )
        .with_context(|| format!("Failed to create account {}", username))?;
        let user_id = tx.last_insert_rowid() as usize;

        tx.execute(
            "INSERT INTO account_credentials (user_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;

        tx.commit()?;
        Ok(user_id)
    }

    fn get_account(&self, user_id: usize) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                &format!("SELECT {} FROM account WHERE id = ?1", ACCOUNT_COLUMNS),
                params![user_id],
                Self::row_to_account,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(account)
    }

    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM account WHERE username = ?1",
                    ACCOUNT_COLUMNS
                ),
                params![username],
                Self::row_to_account,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(account)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                &format!("SELECT {} FROM account WHERE email = ?1", ACCOUNT_COLUMNS),
                params![email],
                Self::row_to_account,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(account)
    }

    fn search_accounts(&self, query: &str, limit: usize) -> Result<Vec<UserSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, username, profile_picture FROM account
             WHERE username LIKE '%' || ?1 || '%' COLLATE NOCASE
             ORDER BY username LIMIT ?2",
        )?;
        let summaries = stmt
            .query_map(params![query, limit], Self::row_to_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn mark_verified(&self, user_id: usize) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE account SET verified = 1 WHERE id = ?1",
            params![user_id],
        )?;
        Ok(())
    }

    fn set_profile_picture(&self, user_id: usize, relative_path: &str) -> Result<Option<String>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let previous: Option<String> = tx.query_row(
            "SELECT profile_picture FROM account WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE account SET profile_picture = ?1 WHERE id = ?2",
            params![relative_path, user_id],
        )?;
        tx.commit()?;
        Ok(previous)
    }

    fn get_password_credentials(&self, username: &str) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let credentials = conn
            .query_row(
                "SELECT c.user_id, c.salt, c.hash, c.hasher, c.created, c.last_used
                 FROM account_credentials c JOIN account a ON a.id = c.user_id
                 WHERE a.username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, usize>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                    ))
                },
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match credentials {
            None => Ok(None),
            Some((user_id, salt, hash, hasher_tag, created, last_used)) => {
                Ok(Some(PasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher: FromStr::from_str(&hasher_tag)?,
                    created,
                    last_used,
                }))
            }
        }
    }

    fn touch_password_credentials(&self, user_id: usize) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE account_credentials SET last_used = {} WHERE user_id = ?1",
                DEFAULT_TIMESTAMP
            ),
            params![user_id],
        )?;
        Ok(())
    }
}

impl VerificationTokenStore for SqliteUserStore {
    fn add_verification_token(&self, token: VerificationToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO email_verification (user_id, value, created, expires) VALUES (?1, ?2, ?3, ?4)",
            params![token.user_id, token.value.0, token.created, token.expires],
        )?;
        Ok(())
    }

    fn get_verification_token(
        &self,
        value: &VerificationTokenValue,
    ) -> Result<Option<VerificationToken>> {
        let conn = self.conn.lock().unwrap();
        let token = conn
            .query_row(
                "SELECT user_id, value, created, expires FROM email_verification WHERE value = ?1",
                params![value.0],
                |row| {
                    Ok(VerificationToken {
                        user_id: row.get(0)?,
                        value: VerificationTokenValue(row.get(1)?),
                        created: row.get(2)?,
                        expires: row.get(3)?,
                    })
                },
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(token)
    }

    fn prune_expired_verification_tokens(&self, now: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM email_verification WHERE expires < ?1",
            params![now],
        )?;
        Ok(deleted)
    }
}

impl LibraryStore for SqliteUserStore {
    fn upsert_status(
        &self,
        user_id: usize,
        album_id: &str,
        status: StatusKind,
        is_favorite: bool,
    ) -> Result<AlbumStatus> {
        let conn = self.conn.lock().unwrap();
        let row = conn.query_row(
            &format!(
                "INSERT INTO album_status (user_id, album_id, status, is_favorite) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, album_id) DO UPDATE SET
                     status = excluded.status,
                     is_favorite = excluded.is_favorite,
                     updated = {}
                 RETURNING {}",
                DEFAULT_TIMESTAMP, STATUS_COLUMNS
            ),
            params![user_id, album_id, status.to_db_str(), is_favorite],
            Self::row_to_status,
        )?;
        Ok(row)
    }

    fn get_status(&self, status_id: usize) -> Result<Option<AlbumStatus>> {
        let conn = self.conn.lock().unwrap();
        let status = conn
            .query_row(
                &format!("SELECT {} FROM album_status WHERE id = ?1", STATUS_COLUMNS),
                params![status_id],
                Self::row_to_status,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(status)
    }

    fn update_status(
        &self,
        status_id: usize,
        status: Option<StatusKind>,
        is_favorite: Option<bool>,
    ) -> Result<Option<AlbumStatus>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "UPDATE album_status SET
                         status = coalesce(?2, status),
                         is_favorite = coalesce(?3, is_favorite),
                         updated = {}
                     WHERE id = ?1
                     RETURNING {}",
                    DEFAULT_TIMESTAMP, STATUS_COLUMNS
                ),
                params![
                    status_id,
                    status.map(|s| s.to_db_str()),
                    is_favorite
                ],
                Self::row_to_status,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(row)
    }

    fn delete_status(&self, status_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM album_status WHERE id = ?1", params![status_id])?;
        Ok(deleted > 0)
    }

    fn list_statuses(&self, user_id: usize) -> Result<Vec<AlbumStatus>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM album_status WHERE user_id = ?1 ORDER BY updated DESC, id DESC",
            STATUS_COLUMNS
        ))?;
        let statuses = stmt
            .query_map(params![user_id], Self::row_to_status)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }

    fn toggle_favorite(&self, user_id: usize, album_id: &str) -> Result<AlbumStatus> {
        // Favoriting an album the user has no relation to yet implies at
        // least a want-to-listen status.
        let conn = self.conn.lock().unwrap();
        let row = conn.query_row(
            &format!(
                "INSERT INTO album_status (user_id, album_id, status, is_favorite) VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT (user_id, album_id) DO UPDATE SET
                     is_favorite = CASE WHEN album_status.is_favorite = 0 THEN 1 ELSE 0 END,
                     updated = {}
                 RETURNING {}",
                DEFAULT_TIMESTAMP, STATUS_COLUMNS
            ),
            params![user_id, album_id, StatusKind::WantToListen.to_db_str()],
            Self::row_to_status,
        )?;
        Ok(row)
    }

    fn add_follow(&self, follower_id: usize, followee_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO follow (follower_id, followee_id) VALUES (?1, ?2)",
            params![follower_id, followee_id],
        )?;
        Ok(inserted > 0)
    }

    fn remove_follow(&self, follower_id: usize, followee_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM follow WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower_id, followee_id],
        )?;
        Ok(deleted > 0)
    }

    fn list_followers(&self, user_id: usize) -> Result<Vec<UserSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.username, a.profile_picture
             FROM follow f JOIN account a ON a.id = f.follower_id
             WHERE f.followee_id = ?1
             ORDER BY f.created DESC, f.id DESC",
        )?;
        let followers = stmt
            .query_map(params![user_id], Self::row_to_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(followers)
    }

    fn list_following(&self, user_id: usize) -> Result<Vec<UserSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.username, a.profile_picture
             FROM follow f JOIN account a ON a.id = f.followee_id
             WHERE f.follower_id = ?1
             ORDER BY f.created DESC, f.id DESC",
        )?;
        let following = stmt
            .query_map(params![user_id], Self::row_to_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(following)
    }

    fn count_followers(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: usize = conn.query_row(
            "SELECT COUNT(*) FROM follow WHERE followee_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_following(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: usize = conn.query_row(
            "SELECT COUNT(*) FROM follow WHERE follower_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn upsert_review(
        &self,
        user_id: usize,
        album_id: &str,
        rating: Option<f64>,
        content: &str,
    ) -> Result<Review> {
        let conn = self.conn.lock().unwrap();
        let row = conn.query_row(
            &format!(
                "INSERT INTO review (user_id, album_id, rating, content) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, album_id) DO UPDATE SET
                     rating = excluded.rating,
                     content = excluded.content,
                     updated = {}
                 RETURNING {}",
                DEFAULT_TIMESTAMP, REVIEW_COLUMNS
            ),
            params![user_id, album_id, rating, content],
            Self::row_to_review,
        )?;
        Ok(row)
    }

    fn get_review(&self, review_id: usize) -> Result<Option<Review>> {
        let conn = self.conn.lock().unwrap();
        let review = conn
            .query_row(
                &format!("SELECT {} FROM review WHERE id = ?1", REVIEW_COLUMNS),
                params![review_id],
                Self::row_to_review,
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(review)
    }

    fn delete_review(&self, review_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM review WHERE id = ?1", params![review_id])?;
        Ok(deleted > 0)
    }

    fn list_reviews_for_album(&self, album_id: &str) -> Result<Vec<Review>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM review WHERE album_id = ?1 ORDER BY created DESC, id DESC",
            REVIEW_COLUMNS
        ))?;
        let reviews = stmt
            .query_map(params![album_id], Self::row_to_review)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn list_reviews_for_user(&self, user_id: usize) -> Result<Vec<Review>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM review WHERE user_id = ?1 ORDER BY created DESC, id DESC",
            REVIEW_COLUMNS
        ))?;
        let reviews = stmt
            .query_map(params![user_id], Self::row_to_review)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn average_rating(&self, album_id: &str) -> Result<Option<f64>> {
        let conn = self.conn.lock().unwrap();
        let average: Option<f64> = conn.query_row(
            "SELECT AVG(rating) FROM review WHERE album_id = ?1 AND rating IS NOT NULL",
            params![album_id],
            |row| row.get(0),
        )?;
        Ok(average)
    }
}
