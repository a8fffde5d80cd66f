use crate::config::Network;
use async_trait::async_trait;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoleGrantError {
    #[error("角色授予失败: {0}")]
    Failed(String),
}

/// 在绑定之前给地址授予链上角色
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleGranter: Send + Sync {
    async fn grant_role(&self, address: &str) -> Result<(), RoleGrantError>;
}

/// 只记录授予请求，真正的链上客户端由部署方接入
pub struct LoggingRoleGranter {
    hat_id: String,
    network: Network,
}

impl LoggingRoleGranter {
    pub fn new(hat_id: String, network: Network) -> Self {
        Self { hat_id, network }
    }
}

#[async_trait]
impl RoleGranter for LoggingRoleGranter {
    async fn grant_role(&self, address: &str) -> Result<(), RoleGrantError> {
        if address.is_empty() {
            return Err(RoleGrantError::Failed("地址为空".to_string()));
        }
        info!(
            "授予角色 - hat: {}, 网络: {} ({}), 地址: {}",
            self.hat_id,
            self.network.name(),
            self.network.chain_id(),
            address
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn logging_granter_accepts_addresses() {
        let granter = LoggingRoleGranter::new("42".to_string(), Network::Optimism);
        assert_ok!(
            granter
                .grant_role("0x0000000000000000000000000000000000000001")
                .await
        );
        assert_err!(granter.grant_role("").await);
    }
}
