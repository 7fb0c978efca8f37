//! User repository
//!
//! - init_schema: CREATE TABLE IF NOT EXISTS + seed INSERT with ON CONFLICT, one transaction
//! - list: ordered by id

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::postgres::{PgConnection, Postgres};
use sqlx::{Connection, FromRow, QueryBuilder};

use super::DbError;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Fixed seed rows as (name, email).
pub const SEED_USERS: [(&str, &str); 3] = [
    ("João Silva", "joao@example.com"),
    ("Maria Santos", "maria@example.com"),
    ("Pedro Costa", "pedro@example.com"),
];

/// User record from database
///
/// `created_at` serializes as ISO-8601 without offset, matching the
/// column's `TIMESTAMP` type.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: Option<NaiveDateTime>,
}

/// User repository
pub struct UserRepo<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Create the table if needed and insert the seed rows.
    ///
    /// Returns how many seed rows were newly inserted; rows whose email
    /// already exists are skipped, so repeat calls return 0.
    pub async fn init_schema(&mut self) -> Result<u64, DbError> {
        let mut tx = self.conn.begin().await?;

        sqlx::query(CREATE_USERS_TABLE).execute(&mut *tx).await?;

        let mut insert: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO users (name, email) ");
        insert.push_values(SEED_USERS, |mut row, (name, email)| {
            row.push_bind(name).push_bind(email);
        });
        insert.push(" ON CONFLICT (email) DO NOTHING");

        let inserted = insert.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;
        tracing::debug!(inserted, "users schema initialized");
        Ok(inserted)
    }

    /// All users, ascending by id.
    pub async fn list(&mut self) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users ORDER BY id",
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn seed_emails_are_unique() {
        let mut emails: Vec<_> = SEED_USERS.iter().map(|(_, email)| *email).collect();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), SEED_USERS.len());
    }

    #[test]
    fn created_at_serializes_iso8601() {
        let user = User {
            id: 1,
            name: "Maria Santos".into(),
            email: "maria@example.com".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                .and_then(|d| d.and_hms_opt(14, 7, 9)),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["created_at"], "2024-03-05T14:07:09");
        assert_eq!(json["id"], 1);
    }
}
