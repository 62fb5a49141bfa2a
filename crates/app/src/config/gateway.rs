//! Order Gateway Config

use std::time::Duration;

use clap::Args;

use crate::{
    config::ConfigError,
    gateway::{HttpGatewayConfig, HttpOrderGateway},
};

/// Order submission settings.
#[derive(Debug, Args)]
pub struct GatewayConfig {
    /// Base URL of the order service
    #[arg(long, env = "ORDER_GATEWAY_URL")]
    pub order_gateway_url: String,

    /// Bearer token for the order service
    #[arg(long, env = "ORDER_GATEWAY_TOKEN", hide_env_values = true)]
    pub order_gateway_token: Option<String>,

    /// Seconds to wait for the order service before giving up on a submission
    #[arg(long, env = "ORDER_SUBMIT_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub order_submit_timeout_seconds: u64,
}

impl GatewayConfig {
    /// Time allowed for one submission attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] if the timeout is zero.
    pub fn submit_timeout(&self) -> Result<Duration, ConfigError> {
        match self.order_submit_timeout_seconds {
            0 => Err(ConfigError::ZeroTimeout),
            seconds => Ok(Duration::from_secs(seconds)),
        }
    }

    /// HTTP gateway for the configured order service.
    #[must_use]
    pub fn http_gateway(&self) -> HttpOrderGateway {
        HttpOrderGateway::new(HttpGatewayConfig {
            base_url: self.order_gateway_url.clone(),
            token: self
                .order_gateway_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        gateway: GatewayConfig,
    }

    #[test]
    fn timeout_defaults_to_thirty_seconds() -> TestResult {
        let cli = TestCli::try_parse_from(["verdant", "--order-gateway-url", "http://orders"])?;

        assert_eq!(cli.gateway.submit_timeout()?, Duration::from_secs(30));

        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> TestResult {
        let cli = TestCli::try_parse_from([
            "verdant",
            "--order-gateway-url",
            "http://orders",
            "--order-submit-timeout-seconds",
            "0",
        ])?;

        assert!(matches!(
            cli.gateway.submit_timeout(),
            Err(ConfigError::ZeroTimeout)
        ));

        Ok(())
    }
}
