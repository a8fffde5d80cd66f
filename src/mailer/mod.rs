use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info};
use thiserror::Error;

pub const OTP_SUBJECT: &str = "Your OTP Code";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("邮箱地址无效: {0}")]
    Address(String),

    #[error("构建邮件失败: {0}")]
    Build(String),

    #[error("发送邮件失败: {0}")]
    Transport(String),
}

/// 验证码投递
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_code(&self, to: &str, code: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        info!("初始化邮件发送器 - 服务器: {}", config.host);
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(creds)
            .build();

        let from = config
            .user
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address(format!("{}: {}", config.user, e)))?;

        Ok(Self { transport, from })
    }
}

/// 纯文本验证码邮件
pub fn build_otp_message(from: &Mailbox, to: &str, code: &str) -> Result<Message, MailError> {
    let to = to
        .parse::<Mailbox>()
        .map_err(|e| MailError::Address(format!("{}: {}", to, e)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(OTP_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(format!("Your OTP code is {}", code))
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        let message = build_otp_message(&self.from, to, code)?;
        debug!("发送验证码邮件 - 收件人: {}", to);
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!("验证码邮件已发送 - 收件人: {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Mailbox {
        "noreply@pse.dev".parse().unwrap()
    }

    #[test]
    fn builds_plain_text_otp_message() {
        let message = build_otp_message(&from(), "alice@pse.dev", "123456").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your OTP Code"));
        assert!(raw.contains("To: alice@pse.dev"));
        assert!(raw.contains("From: noreply@pse.dev"));
        assert!(raw.contains("Your OTP code is 123456"));
    }

    #[test]
    fn rejects_bad_recipient() {
        assert!(matches!(
            build_otp_message(&from(), "not an address", "123456"),
            Err(MailError::Address(_))
        ));
    }
}
