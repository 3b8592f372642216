use crate::db::models::{NewUser, Role, User};
use crate::db::schema::SQLITE_INIT;
use crate::db::store::IdentityStore;
use crate::error::BootstrapError;
use sqlx::{Pool, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

const USER_COLUMNS: &str = r#"id, username, password, firstname, lastname, email,
       otp_secret, role_id, confirmed"#;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count_roles_by_name(&self, name: &str) -> Result<i64, BootstrapError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM role WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn count_users_by_username(&self, username: &str) -> Result<i64, BootstrapError> {
        let rec: (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "user" WHERE username = ?"#)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }
}

impl IdentityStore for SqliteStore {
    /// Initialize the schema by executing the bundled DDL.
    async fn create_all_schema(&self) -> Result<(), BootstrapError> {
        // sqlx::query runs one statement at a time
        let mut tx = self.pool.begin().await?;
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, BootstrapError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description FROM role WHERE name = ? LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn insert_role(&self, name: &str, description: &str) -> Result<Role, BootstrapError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO role (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        tx.commit().await?;

        Ok(Role {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
        })
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, BootstrapError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE username = ? LIMIT 1"#);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<(), BootstrapError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"DELETE FROM "user" WHERE id = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, BootstrapError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query(
            r#"
            INSERT INTO "user" (
                username, password, firstname, lastname, email,
                otp_secret, role_id, confirmed
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.otp_secret)
        .bind(user.role_id)
        .bind(user.confirmed)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        tx.commit().await?;

        Ok(user.into_user(id))
    }
}
