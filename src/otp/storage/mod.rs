use crate::otp::model::{Binding, Challenge};
use async_trait::async_trait;
use thiserror::Error;

pub mod sqlite_backend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("存储错误: {0}")]
    Storage(String),

    #[error("唯一约束冲突: {0}")]
    UniqueViolation(String),
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// 查询邮箱的绑定
    async fn get_binding(&self, email: &str) -> Result<Option<Binding>, StoreError>;

    /// 写入验证码；已有未过期的记录时不覆盖，返回 false
    async fn upsert_challenge_if_expired(
        &self,
        challenge: &Challenge,
        now_ms: i64,
    ) -> Result<bool, StoreError>;

    /// 查询邮箱当前的验证码
    async fn get_challenge(&self, email: &str) -> Result<Option<Challenge>, StoreError>;

    /// 删除匹配且未过期的验证码，返回是否真的删除了一行
    async fn consume_challenge(
        &self,
        email: &str,
        code: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError>;

    /// 插入绑定，邮箱或地址重复时返回 UniqueViolation
    async fn insert_binding(&self, binding: &Binding) -> Result<(), StoreError>;
}
