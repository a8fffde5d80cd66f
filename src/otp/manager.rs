use crate::mailer::Mailer;
use crate::otp::{
    clock::Clock,
    model::{
        generate_code, normalize_address, normalize_code, normalize_email, Binding, Challenge,
        OtpError, VerifyFailure,
    },
    storage::{OtpStore, StoreError},
};
use log::{debug, error, info, warn};
use std::sync::Arc;

// 验证码签发、校验与账户绑定
pub struct OtpManager<B: OtpStore> {
    store: B,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl<B: OtpStore> OtpManager<B> {
    pub fn new(store: B, mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>, ttl_secs: i64) -> Self {
        info!("初始化验证码管理器 - 有效期: {} 秒", ttl_secs);
        Self {
            store,
            mailer,
            clock,
            ttl_ms: ttl_secs.saturating_mul(1000),
        }
    }

    /// 签发验证码并发送邮件
    ///
    /// 已绑定的邮箱先于未过期的验证码被拒绝。邮件发送失败不会撤销已写入的验证码。
    pub async fn request_code(&self, email: &str) -> Result<(), OtpError> {
        let email = normalize_email(email);
        info!("处理验证码请求 - 邮箱: {}", email);

        let existing = self
            .store
            .get_binding(&email)
            .await
            .map_err(|e| OtpError::Storage(e.to_string()))?;
        if existing.is_some() {
            warn!("邮箱已注册 - 邮箱: {}", email);
            return Err(OtpError::AlreadyRegistered);
        }

        let now = self.clock.now_millis();
        let challenge = Challenge {
            email: email.clone(),
            code: generate_code(),
            expires_at: now.saturating_add(self.ttl_ms),
        };

        let written = self
            .store
            .upsert_challenge_if_expired(&challenge, now)
            .await
            .map_err(|e| OtpError::Storage(e.to_string()))?;
        if !written {
            warn!("已有未过期的验证码 - 邮箱: {}", email);
            return Err(OtpError::ChallengePending);
        }
        debug!(
            "验证码已写入 - 邮箱: {}, 过期时间: {}",
            email, challenge.expires_at
        );

        self.mailer
            .send_code(&email, &challenge.code)
            .await
            .map_err(|e| {
                error!("验证码邮件发送失败 - 邮箱: {}, 错误: {}", email, e);
                OtpError::DeliveryFailed(e.to_string())
            })?;

        info!("验证码已发送 - 邮箱: {}", email);
        Ok(())
    }

    /// 校验验证码，成功时删除，保证只能使用一次
    ///
    /// 不存在、过期、不匹配、存储错误都返回 false，不区分原因。
    pub async fn verify_code(&self, email: &str, submitted: impl ToString) -> bool {
        let email = normalize_email(email);
        let submitted = submitted.to_string();

        match self.check_code(&email, normalize_code(&submitted)).await {
            Ok(()) => {
                info!("验证码验证成功 - 邮箱: {}", email);
                true
            }
            Err(VerifyFailure::Storage(e)) => {
                error!("验证码校验存储错误 - 邮箱: {}, 错误: {}", email, e);
                false
            }
            Err(failure) => {
                warn!("验证码验证失败 - 邮箱: {}, 原因: {}", email, failure);
                false
            }
        }
    }

    async fn check_code(&self, email: &str, submitted: &str) -> Result<(), VerifyFailure> {
        let now = self.clock.now_millis();

        let challenge = self
            .store
            .get_challenge(email)
            .await
            .map_err(|e| VerifyFailure::Storage(e.to_string()))?
            .ok_or(VerifyFailure::NoChallenge)?;

        if challenge.is_expired(now) {
            return Err(VerifyFailure::Expired);
        }
        if normalize_code(&challenge.code) != submitted {
            return Err(VerifyFailure::Mismatch);
        }

        let consumed = self
            .store
            .consume_challenge(email, &challenge.code, now)
            .await
            .map_err(|e| VerifyFailure::Storage(e.to_string()))?;
        if !consumed {
            return Err(VerifyFailure::Replayed);
        }

        Ok(())
    }

    /// 记录邮箱与地址的绑定，邮箱和地址都只能绑定一次
    pub async fn bind_account(&self, email: &str, address: &str) -> Result<(), OtpError> {
        let binding = Binding {
            email: normalize_email(email),
            address: normalize_address(address),
        };
        debug!(
            "绑定账户 - 邮箱: {}, 地址: {}",
            binding.email, binding.address
        );

        match self.store.insert_binding(&binding).await {
            Ok(()) => {
                info!(
                    "账户绑定成功 - 邮箱: {}, 地址: {}",
                    binding.email, binding.address
                );
                Ok(())
            }
            Err(StoreError::UniqueViolation(detail)) => {
                debug!("绑定唯一约束冲突: {}", detail);
                let email_taken = self
                    .store
                    .get_binding(&binding.email)
                    .await
                    .map_err(|e| OtpError::Storage(e.to_string()))?
                    .is_some();
                if email_taken {
                    warn!("邮箱已绑定 - 邮箱: {}", binding.email);
                    Err(OtpError::DuplicateEmail)
                } else {
                    warn!("地址已绑定 - 地址: {}", binding.address);
                    Err(OtpError::DuplicateAddress)
                }
            }
            Err(e) => Err(OtpError::Storage(e.to_string())),
        }
    }
}
