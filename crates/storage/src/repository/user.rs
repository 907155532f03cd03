use sqlx::PgPool;

use crate::error::Result;
use crate::models::User;

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up the user owning a credential key
    pub async fn find_by_user_key(&self, user_key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, user_key
            FROM users
            WHERE user_key = $1
            "#,
        )
        .bind(user_key)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}
