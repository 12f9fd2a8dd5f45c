/// Sessions ended before their token expired
///
/// A session token stays cryptographically valid until `exp`. Logging out
/// stores its `jti` here and the HTTP layer refuses any token found in this
/// table. Rows are useless once the token would have expired anyway, so each
/// logout also purges expired rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE revoked_sessions (
///     jti UUID PRIMARY KEY,
///     member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::session::SessionClaims;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RevokedSession {
    pub jti: Uuid,
    pub member_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

impl RevokedSession {
    /// Ends the session named by `claims`; revoking twice is a no-op
    pub async fn revoke(pool: &PgPool, claims: &SessionClaims) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO revoked_sessions (jti, member_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(claims.jti)
        .bind(claims.sub)
        .bind(claims.expires_at())
        .execute(pool)
        .await?;

        let purged = sqlx::query("DELETE FROM revoked_sessions WHERE expires_at < NOW()")
            .execute(pool)
            .await?;

        debug!(
            jti = %claims.jti,
            purged = purged.rows_affected(),
            "Session revoked"
        );

        Ok(())
    }

    pub async fn is_revoked(pool: &PgPool, jti: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_sessions WHERE jti = $1)")
            .bind(jti)
            .fetch_one(pool)
            .await
    }
}
