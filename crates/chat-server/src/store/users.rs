use super::ChatStore;
use crate::models::{now, ts, PublicUser};

impl ChatStore {
    /// Insert or refresh the public profile of a user. Accounts themselves are
    /// owned by the auth system; this keeps the copy chat queries join on.
    pub async fn upsert_user(&self, user: &PublicUser) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user (id, name, username, display_username, image, bio, is_verified, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                username = excluded.username,
                display_username = excluded.display_username,
                image = excluded.image,
                bio = excluded.bio,
                is_verified = excluded.is_verified
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.display_username)
        .bind(&user.image)
        .bind(&user.bio)
        .bind(user.is_verified)
        .bind(ts(&now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_public_user(&self, user_id: &str) -> Result<Option<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            "SELECT id, name, username, display_username, image, bio, is_verified FROM user WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
