use rand::{thread_rng, Rng};
use sqlx::FromRow;
use thiserror::Error;

pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

/// 待验证的一次性密码，每个邮箱最多一条
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Challenge {
    pub email: String,
    pub code: String,
    /// 过期时间（毫秒时间戳）
    pub expires_at: i64,
}

impl Challenge {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at < now_ms
    }
}

/// 邮箱与链上地址的永久绑定
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Binding {
    pub email: String,
    pub address: String,
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("User already registered")]
    AlreadyRegistered,

    #[error("OTP already sent")]
    ChallengePending,

    #[error("Email already bound to an account")]
    DuplicateEmail,

    #[error("Address already bound to another email")]
    DuplicateAddress,

    #[error("Failed to send OTP: {0}")]
    DeliveryFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// 验证失败的内部原因，只用于日志；对外统一为 false
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyFailure {
    #[error("没有待验证的验证码")]
    NoChallenge,

    #[error("验证码已过期")]
    Expired,

    #[error("验证码不匹配")]
    Mismatch,

    #[error("验证码已被并发请求使用")]
    Replayed,

    #[error("存储错误: {0}")]
    Storage(String),
}

pub fn generate_code() -> String {
    thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// 数字与字符串形式的同一验证码比较结果相同
pub fn normalize_code(code: &str) -> &str {
    code.trim()
}
