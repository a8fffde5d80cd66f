use crate::otp::{
    model::{Binding, Challenge},
    storage::{OtpStore, StoreError},
};
use async_trait::async_trait;
use log::debug;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // 每次操作取一个连接，离开作用域时归还
    async fn conn(&self) -> Result<PoolConnection<Sqlite>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::Storage(format!("获取数据库连接失败: {}", e)))
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed") {
            return StoreError::UniqueViolation(db_err.message().to_string());
        }
    }
    StoreError::Storage(format!("插入绑定失败: {}", e))
}

#[async_trait]
impl OtpStore for SqliteBackend {
    async fn get_binding(&self, email: &str) -> Result<Option<Binding>, StoreError> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Binding>("SELECT email, address FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::Storage(format!("查询绑定失败: {}", e)))
    }

    async fn upsert_challenge_if_expired(
        &self,
        challenge: &Challenge,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO otps (email, otp, expiresAt) VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET otp = excluded.otp, expiresAt = excluded.expiresAt
            WHERE otps.expiresAt < ?
            "#,
        )
        .bind(&challenge.email)
        .bind(&challenge.code)
        .bind(challenge.expires_at)
        .bind(now_ms)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::Storage(format!("写入验证码失败: {}", e)))?;

        debug!(
            "写入验证码 - 邮箱: {}, 影响行数: {}",
            challenge.email,
            result.rows_affected()
        );
        Ok(result.rows_affected() == 1)
    }

    async fn get_challenge(&self, email: &str) -> Result<Option<Challenge>, StoreError> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Challenge>(
            "SELECT email, otp AS code, expiresAt AS expires_at FROM otps WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::Storage(format!("查询验证码失败: {}", e)))
    }

    async fn consume_challenge(
        &self,
        email: &str,
        code: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let result =
            sqlx::query("DELETE FROM otps WHERE email = ? AND otp = ? AND expiresAt >= ?")
                .bind(email)
                .bind(code)
                .bind(now_ms)
                .execute(&mut *conn)
                .await
                .map_err(|e| StoreError::Storage(format!("删除验证码失败: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_binding(&self, binding: &Binding) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        sqlx::query("INSERT INTO accounts (email, address) VALUES (?, ?)")
            .bind(&binding.email)
            .bind(&binding.address)
            .execute(&mut *conn)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }
}
