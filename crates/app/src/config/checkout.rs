//! Checkout Config

use std::path::PathBuf;

use clap::Args;

use verdant::{
    coupons::{DEFAULT_COUPON_CODE, LiteralCoupon},
    fixtures::{Fixture, parse_percentage},
};

use crate::config::ConfigError;

/// Storefront checkout settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Coupon code accepted at checkout
    #[arg(long, env = "COUPON_CODE", default_value = DEFAULT_COUPON_CODE)]
    pub coupon_code: String,

    /// Discount granted by the coupon (e.g. "10%" or "0.10")
    #[arg(long, env = "COUPON_RATE", default_value = "10%")]
    pub coupon_rate: String,

    /// Directory holding cart and address fixtures
    #[arg(long, env = "FIXTURES_PATH", default_value = "./fixtures")]
    pub fixtures_path: PathBuf,
}

impl CheckoutConfig {
    /// Coupon validator for the configured code and rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is blank or the rate is not a percentage.
    pub fn coupon_validator(&self) -> Result<LiteralCoupon, ConfigError> {
        let code = self.coupon_code.trim();

        if code.is_empty() {
            return Err(ConfigError::EmptyCouponCode);
        }

        Ok(LiteralCoupon::new(code, parse_percentage(&self.coupon_rate)?))
    }

    /// Fixture loader rooted at the configured path.
    #[must_use]
    pub fn fixture(&self) -> Fixture {
        Fixture::with_base_path(&self.fixtures_path)
    }
}
