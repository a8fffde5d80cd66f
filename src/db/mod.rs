use crate::otp::storage::StoreError;
use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct DbInitializer<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DbInitializer<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// 初始化验证码表
    pub async fn init_otp_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS otps (
                email TEXT PRIMARY KEY,
                otp TEXT NOT NULL,
                expiresAt INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("创建验证码表失败: {}", e)))?;

        Ok(())
    }

    /// 初始化账户绑定表
    pub async fn init_account_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                email TEXT PRIMARY KEY,
                address TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("创建账户表失败: {}", e)))?;

        Ok(())
    }
}

/// 打开连接池；内存数据库只保留一个连接，否则每个连接各是一个库
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| StoreError::Storage(format!("数据库地址无效: {}", e)))?
        .create_if_missing(true);

    let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Storage(format!("数据库连接错误: {}", e)))
}

/// 初始化所有数据库表
pub async fn initialize_db(pool: &SqlitePool) -> Result<(), StoreError> {
    info!("开始初始化数据库...");
    let initializer = DbInitializer::new(pool);

    initializer.init_otp_table().await.map_err(|e| {
        error!("验证码表初始化失败: {:?}", e);
        e
    })?;

    initializer.init_account_table().await.map_err(|e| {
        error!("账户表初始化失败: {:?}", e);
        e
    })?;

    info!("数据库初始化完成");
    Ok(())
}
