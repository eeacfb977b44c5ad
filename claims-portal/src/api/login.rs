//! Login by probing the role-specific endpoints in a fixed order.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::client::{ApiResult, Credentials, PortalClient};
use crate::error::ApiError;
use crate::session::{Role, UserData};

#[derive(Debug, Clone, PartialEq)]
pub struct LoginSuccess {
    pub role: Role,
    pub token: String,
    pub user: UserData,
}

/// One way of authenticating a set of credentials
#[async_trait]
pub trait LoginStrategy: Send + Sync {
    fn role(&self) -> Role;

    async fn attempt(&self, credentials: &Credentials) -> ApiResult<LoginSuccess>;
}

/// `POST /api/{role}-login`
pub struct EndpointLogin {
    client: PortalClient,
    role: Role,
}

impl EndpointLogin {
    pub fn new(client: PortalClient, role: Role) -> Self {
        Self { client, role }
    }
}

#[async_trait]
impl LoginStrategy for EndpointLogin {
    fn role(&self) -> Role {
        self.role
    }

    async fn attempt(&self, credentials: &Credentials) -> ApiResult<LoginSuccess> {
        let response = self.client.login(self.role, credentials).await?;
        if !response.success {
            return Err(ApiError::LoginRejected);
        }

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::UnexpectedPayload {
                endpoint: self.role.login_path(),
                reason: "login succeeded without a token".to_string(),
            })?;

        Ok(LoginSuccess {
            role: self.role,
            token,
            user: response.user.unwrap_or_default(),
        })
    }
}

/// Hospital, patient, then insurance.
pub fn default_strategies(client: &PortalClient) -> Vec<Arc<dyn LoginStrategy>> {
    Role::LOGIN_ORDER
        .into_iter()
        .map(|role| Arc::new(EndpointLogin::new(client.clone(), role)) as Arc<dyn LoginStrategy>)
        .collect()
}

/// Try each strategy in order; the first success wins. Failures of any
/// kind move on to the next strategy.
pub async fn login_in_order(
    strategies: &[Arc<dyn LoginStrategy>],
    credentials: &Credentials,
) -> ApiResult<LoginSuccess> {
    if credentials.is_blank() {
        return Err(ApiError::EmptyCredentials);
    }

    for strategy in strategies {
        match strategy.attempt(credentials).await {
            Ok(success) => {
                info!(role = %success.role, username = %credentials.username, "Login succeeded");
                return Ok(success);
            }
            Err(e) => {
                warn!(role = %strategy.role(), error = %e, "Login attempt failed, trying next");
            }
        }
    }

    Err(ApiError::LoginRejected)
}
