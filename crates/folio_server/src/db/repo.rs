use chrono::{DateTime, Utc};
use folio_core::access::{SharePermission, Visibility};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Arc, Mutex};

/// User account
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Full document row
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry (no content blob). `permission` is set for documents the
/// listing user received through a share.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub visibility: Visibility,
    pub updated_at: DateTime<Utc>,
    pub permission: Option<SharePermission>,
}

/// Immutable version snapshot, with the modifying user's email resolved
#[derive(Debug, Clone)]
pub struct VersionRecord {
    pub version_number: i64,
    pub content: String,
    pub modified_by_email: Option<String>,
    pub modified_at: DateTime<Utc>,
}

/// Share grant with the grantee's email resolved
#[derive(Debug, Clone)]
pub struct ShareRecord {
    pub user_id: String,
    pub email: String,
    pub permission: SharePermission,
}

/// Fields to apply in a document update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub content: Option<String>,
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
}

impl DocumentUpdate {
    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.title.is_none() && self.visibility.is_none()
    }
}

/// Storage layer for users, documents, versions, shares, and reset tokens
#[derive(Clone)]
pub struct Repo {
    conn: Arc<Mutex<Connection>>,
}

impl Repo {
    /// Create a new Repo with the given connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    // ===== User operations =====

    /// Create a user account. The email must not already be registered.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRecord, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            params![id, email, password_hash, now],
        )?;

        Ok(UserRecord {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: timestamp_to_datetime(now),
        })
    }

    /// Get a user by ID
    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
            [user_id],
            map_user,
        )
        .optional()
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
            [email],
            map_user,
        )
        .optional()
    }

    // ===== Document operations =====

    /// Create a document owned by `owner_id`
    pub fn create_document(
        &self,
        owner_id: &str,
        title: &str,
        content: &str,
        visibility: Visibility,
    ) -> Result<DocumentRecord, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO documents (id, owner_id, title, content, visibility, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![id, owner_id, title, content, visibility.as_str(), now, now],
        )?;

        Ok(DocumentRecord {
            id,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            visibility,
            created_at: timestamp_to_datetime(now),
            updated_at: timestamp_to_datetime(now),
        })
    }

    /// Get a document by ID
    pub fn get_document(&self, document_id: &str) -> Result<Option<DocumentRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        read_document(&conn, document_id)
    }

    /// Documents owned by `user_id`, newest-updated first, optionally
    /// filtered by a title/content search term
    pub fn list_owned(
        &self,
        user_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<DocumentSummary>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let map = |row: &rusqlite::Row<'_>| {
            Ok(DocumentSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                visibility: Visibility::parse(&row.get::<_, String>(2)?),
                updated_at: timestamp_to_datetime(row.get(3)?),
                permission: None,
            })
        };

        let docs = if let Some(term) = search {
            let pattern = format!("%{}%", term);
            let mut stmt = conn.prepare(
                "SELECT id, title, visibility, updated_at FROM documents
                 WHERE owner_id = ? AND (title LIKE ? OR content LIKE ?)
                 ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map(params![user_id, pattern, pattern], map)?;
            rows.filter_map(|r| r.ok()).collect()
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, title, visibility, updated_at FROM documents
                 WHERE owner_id = ? ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map([user_id], map)?;
            rows.filter_map(|r| r.ok()).collect()
        };

        Ok(docs)
    }

    /// Documents shared with `user_id`, newest-updated first, optionally
    /// filtered by a title/content search term
    pub fn list_shared(
        &self,
        user_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<DocumentSummary>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let map = |row: &rusqlite::Row<'_>| {
            Ok(DocumentSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                visibility: Visibility::parse(&row.get::<_, String>(2)?),
                updated_at: timestamp_to_datetime(row.get(3)?),
                permission: Some(SharePermission::parse(&row.get::<_, String>(4)?)),
            })
        };

        let docs = if let Some(term) = search {
            let pattern = format!("%{}%", term);
            let mut stmt = conn.prepare(
                "SELECT d.id, d.title, d.visibility, d.updated_at, s.permission
                 FROM documents d
                 JOIN document_shares s ON d.id = s.document_id
                 WHERE s.user_id = ? AND (d.title LIKE ? OR d.content LIKE ?)
                 ORDER BY d.updated_at DESC",
            )?;
            let rows = stmt.query_map(params![user_id, pattern, pattern], map)?;
            rows.filter_map(|r| r.ok()).collect()
        } else {
            let mut stmt = conn.prepare(
                "SELECT d.id, d.title, d.visibility, d.updated_at, s.permission
                 FROM documents d
                 JOIN document_shares s ON d.id = s.document_id
                 WHERE s.user_id = ? ORDER BY d.updated_at DESC",
            )?;
            let rows = stmt.query_map([user_id], map)?;
            rows.filter_map(|r| r.ok()).collect()
        };

        Ok(docs)
    }

    /// Apply an update to a document, archiving the previous content into
    /// the version log first when it changed.
    ///
    /// The max-version read, the snapshot insert, and the field updates run
    /// in one transaction: a save either lands together with its history
    /// entry or not at all. Returns the updated row and the archived version
    /// number, if a snapshot was taken; `None` if the document is gone.
    pub fn apply_update(
        &self,
        document_id: &str,
        editor_id: &str,
        update: &DocumentUpdate,
    ) -> Result<Option<(DocumentRecord, Option<i64>)>, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        let current: Option<String> = tx
            .query_row(
                "SELECT content FROM documents WHERE id = ?",
                [document_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current_content) = current else {
            return Ok(None);
        };

        let mut archived = None;
        if let Some(content) = &update.content {
            if *content != current_content {
                let next: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(version_number), 0) + 1 FROM document_versions
                     WHERE document_id = ?",
                    [document_id],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "INSERT INTO document_versions (document_id, version_number, content, modified_by, modified_at)
                     VALUES (?, ?, ?, ?, ?)",
                    params![document_id, next, current_content, editor_id, now],
                )?;
                tx.execute(
                    "UPDATE documents SET content = ? WHERE id = ?",
                    params![content, document_id],
                )?;
                archived = Some(next);
            }
        }
        if let Some(title) = &update.title {
            tx.execute(
                "UPDATE documents SET title = ? WHERE id = ?",
                params![title, document_id],
            )?;
        }
        if let Some(visibility) = update.visibility {
            tx.execute(
                "UPDATE documents SET visibility = ? WHERE id = ?",
                params![visibility.as_str(), document_id],
            )?;
        }
        tx.execute(
            "UPDATE documents SET updated_at = ? WHERE id = ?",
            params![now, document_id],
        )?;

        let doc = read_document(&tx, document_id)?;
        tx.commit()?;

        Ok(doc.map(|d| (d, archived)))
    }

    // ===== Version operations =====

    /// Version history for a document, newest first
    pub fn list_versions(&self, document_id: &str) -> Result<Vec<VersionRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT v.version_number, v.content, u.email, v.modified_at
             FROM document_versions v
             LEFT JOIN users u ON v.modified_by = u.id
             WHERE v.document_id = ? ORDER BY v.version_number DESC",
        )?;

        let versions = stmt
            .query_map([document_id], |row| {
                Ok(VersionRecord {
                    version_number: row.get(0)?,
                    content: row.get(1)?,
                    modified_by_email: row.get(2)?,
                    modified_at: timestamp_to_datetime(row.get(3)?),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(versions)
    }

    // ===== Share operations =====

    /// Get the share permission granted to `user_id` on a document
    pub fn get_share(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Option<SharePermission>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT permission FROM document_shares WHERE document_id = ? AND user_id = ?",
            params![document_id, user_id],
            |row| Ok(SharePermission::parse(&row.get::<_, String>(0)?)),
        )
        .optional()
    }

    /// Insert or overwrite a share grant, keyed on (document, user)
    pub fn upsert_share(
        &self,
        document_id: &str,
        user_id: &str,
        permission: SharePermission,
    ) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO document_shares (document_id, user_id, permission, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(document_id, user_id) DO UPDATE SET permission = excluded.permission",
            params![document_id, user_id, permission.as_str(), now],
        )?;
        Ok(())
    }

    /// Delete a share grant; deleting an absent grant is a no-op
    pub fn delete_share(&self, document_id: &str, user_id: &str) -> Result<bool, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM document_shares WHERE document_id = ? AND user_id = ?",
            params![document_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// All share grants on a document, with grantee emails
    pub fn list_shares(&self, document_id: &str) -> Result<Vec<ShareRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.email, s.permission
             FROM document_shares s
             JOIN users u ON s.user_id = u.id
             WHERE s.document_id = ?",
        )?;

        let shares = stmt
            .query_map([document_id], |row| {
                Ok(ShareRecord {
                    user_id: row.get(0)?,
                    email: row.get(1)?,
                    permission: SharePermission::parse(&row.get::<_, String>(2)?),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(shares)
    }

    // ===== Password reset tokens =====

    /// Create a password reset token for a user
    pub fn create_reset_token(
        &self,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let token = generate_secure_token();
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO password_reset_tokens (token, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?)",
            params![token, user_id, expires_at.timestamp(), now],
        )?;

        Ok(token)
    }

    /// Count recent reset tokens for a user (for rate limiting)
    pub fn count_recent_reset_tokens(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = ? AND created_at > ?",
            params![user_id, since.timestamp()],
            |row| row.get(0),
        )
    }

    /// Redeem a reset token: set the user's new password hash and consume
    /// the token, in one transaction. Returns false if the token is unknown
    /// or expired.
    pub fn redeem_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
    ) -> Result<bool, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        let user_id: Option<String> = tx
            .query_row(
                "SELECT user_id FROM password_reset_tokens WHERE token = ? AND expires_at > ?",
                params![token, now],
                |row| row.get(0),
            )
            .optional()?;
        let Some(user_id) = user_id else {
            return Ok(false);
        };

        tx.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![new_password_hash, user_id],
        )?;
        tx.execute(
            "DELETE FROM password_reset_tokens WHERE token = ?",
            [token],
        )?;
        tx.commit()?;

        Ok(true)
    }

    /// Clean up expired reset tokens
    pub fn cleanup_expired_reset_tokens(&self) -> Result<usize, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        let deleted = conn.execute(
            "DELETE FROM password_reset_tokens WHERE expires_at < ?",
            [now],
        )?;
        Ok(deleted)
    }
}

// ===== Helper functions =====

fn map_user(row: &rusqlite::Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: timestamp_to_datetime(row.get(3)?),
    })
}

fn read_document(
    conn: &Connection,
    document_id: &str,
) -> Result<Option<DocumentRecord>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, owner_id, title, content, visibility, created_at, updated_at
         FROM documents WHERE id = ?",
        [document_id],
        |row| {
            Ok(DocumentRecord {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                visibility: Visibility::parse(&row.get::<_, String>(4)?),
                created_at: timestamp_to_datetime(row.get(5)?),
                updated_at: timestamp_to_datetime(row.get(6)?),
            })
        },
    )
    .optional()
}

/// Generate a cryptographically secure random token
fn generate_secure_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.r#gen()).collect();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Convert Unix timestamp to DateTime<Utc>
fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_else(|| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;

    fn setup_test_db() -> Repo {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        Repo::new(conn)
    }

    #[test]
    fn test_user_creation_and_lookup() {
        let repo = setup_test_db();

        let user = repo.create_user("test@example.com", "hash").unwrap();
        assert!(!user.id.is_empty());

        let by_email = repo.get_user_by_email("test@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = repo.get_user(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "test@example.com");

        // The email column is unique
        assert!(repo.create_user("test@example.com", "other").is_err());
    }

    #[test]
    fn test_document_create_and_read() {
        let repo = setup_test_db();
        let owner = repo.create_user("owner@example.com", "hash").unwrap();

        let doc = repo
            .create_document(&owner.id, "Notes", "hello", Visibility::Private)
            .unwrap();

        let read = repo.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(read.title, "Notes");
        assert_eq!(read.content, "hello");
        assert_eq!(read.visibility, Visibility::Private);
        assert_eq!(read.owner_id, owner.id);

        assert!(repo.get_document("missing").unwrap().is_none());
    }

    #[test]
    fn test_apply_update_archives_previous_content() {
        let repo = setup_test_db();
        let owner = repo.create_user("owner@example.com", "hash").unwrap();
        let doc = repo
            .create_document(&owner.id, "Notes", "first", Visibility::Private)
            .unwrap();

        let update = DocumentUpdate {
            content: Some("second".to_string()),
            ..Default::default()
        };
        let (updated, archived) = repo.apply_update(&doc.id, &owner.id, &update).unwrap().unwrap();
        assert_eq!(updated.content, "second");
        assert_eq!(archived, Some(1));

        let versions = repo.list_versions(&doc.id).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version_number, 1);
        // The snapshot holds the content from before the save
        assert_eq!(versions[0].content, "first");
        assert_eq!(
            versions[0].modified_by_email.as_deref(),
            Some("owner@example.com")
        );
    }

    #[test]
    fn test_apply_update_equal_content_archives_nothing() {
        let repo = setup_test_db();
        let owner = repo.create_user("owner@example.com", "hash").unwrap();
        let doc = repo
            .create_document(&owner.id, "Notes", "same", Visibility::Private)
            .unwrap();

        let update = DocumentUpdate {
            content: Some("same".to_string()),
            ..Default::default()
        };
        let (_, archived) = repo.apply_update(&doc.id, &owner.id, &update).unwrap().unwrap();
        assert_eq!(archived, None);
        assert!(repo.list_versions(&doc.id).unwrap().is_empty());
    }

    #[test]
    fn test_apply_update_missing_document() {
        let repo = setup_test_db();
        let owner = repo.create_user("owner@example.com", "hash").unwrap();
        let update = DocumentUpdate {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(repo.apply_update("missing", &owner.id, &update).unwrap().is_none());
    }

    #[test]
    fn test_share_upsert_overwrites() {
        let repo = setup_test_db();
        let owner = repo.create_user("owner@example.com", "hash").unwrap();
        let guest = repo.create_user("guest@example.com", "hash").unwrap();
        let doc = repo
            .create_document(&owner.id, "Notes", "", Visibility::Private)
            .unwrap();

        repo.upsert_share(&doc.id, &guest.id, SharePermission::View).unwrap();
        assert_eq!(
            repo.get_share(&doc.id, &guest.id).unwrap(),
            Some(SharePermission::View)
        );

        // A second grant overwrites rather than duplicating
        repo.upsert_share(&doc.id, &guest.id, SharePermission::Edit).unwrap();
        assert_eq!(
            repo.get_share(&doc.id, &guest.id).unwrap(),
            Some(SharePermission::Edit)
        );
        assert_eq!(repo.list_shares(&doc.id).unwrap().len(), 1);

        assert!(repo.delete_share(&doc.id, &guest.id).unwrap());
        assert!(!repo.delete_share(&doc.id, &guest.id).unwrap());
    }

    #[test]
    fn test_listing_owned_and_shared() {
        let repo = setup_test_db();
        let alice = repo.create_user("alice@example.com", "hash").unwrap();
        let bob = repo.create_user("bob@example.com", "hash").unwrap();

        let mine = repo
            .create_document(&alice.id, "Roadmap", "alpha beta", Visibility::Private)
            .unwrap();
        let theirs = repo
            .create_document(&bob.id, "Minutes", "gamma", Visibility::Private)
            .unwrap();
        repo.upsert_share(&theirs.id, &alice.id, SharePermission::View).unwrap();

        let owned = repo.list_owned(&alice.id, None).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, mine.id);
        assert!(owned[0].permission.is_none());

        let shared = repo.list_shared(&alice.id, None).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, theirs.id);
        assert_eq!(shared[0].permission, Some(SharePermission::View));

        // Search matches content as well as title
        assert_eq!(repo.list_owned(&alice.id, Some("beta")).unwrap().len(), 1);
        assert!(repo.list_owned(&alice.id, Some("zeta")).unwrap().is_empty());
        assert_eq!(repo.list_shared(&alice.id, Some("Minut")).unwrap().len(), 1);
    }

    #[test]
    fn test_reset_token_redeem_is_single_use() {
        let repo = setup_test_db();
        let user = repo.create_user("test@example.com", "old-hash").unwrap();
        let expires = Utc::now() + chrono::Duration::hours(1);

        let token = repo.create_reset_token(&user.id, expires).unwrap();
        assert!(!token.is_empty());

        assert!(repo.redeem_reset_token(&token, "new-hash").unwrap());
        let updated = repo.get_user(&user.id).unwrap().unwrap();
        assert_eq!(updated.password_hash, "new-hash");

        // Token was consumed
        assert!(!repo.redeem_reset_token(&token, "again").unwrap());
    }

    #[test]
    fn test_expired_reset_token_is_inert() {
        let repo = setup_test_db();
        let user = repo.create_user("test@example.com", "old-hash").unwrap();
        let expired = Utc::now() - chrono::Duration::minutes(1);

        let token = repo.create_reset_token(&user.id, expired).unwrap();
        assert!(!repo.redeem_reset_token(&token, "new-hash").unwrap());

        // The sweep removes it
        assert_eq!(repo.cleanup_expired_reset_tokens().unwrap(), 1);
    }
}
