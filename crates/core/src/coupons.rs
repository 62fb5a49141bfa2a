//! Coupons

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

/// Default code recognised by [`LiteralCoupon`].
pub const DEFAULT_COUPON_CODE: &str = "WELCOME10";

/// Result of validating a coupon code.
#[derive(Debug, Clone, Copy)]
pub enum CouponOutcome {
    /// Nothing was entered; no feedback is shown.
    Empty,

    /// The code is valid and discounts the subtotal by `rate`.
    Accepted {
        /// Fraction of the subtotal to take off
        rate: Percentage,
    },

    /// The code is not recognised.
    Rejected,
}

impl CouponOutcome {
    /// Whether the code was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, CouponOutcome::Accepted { .. })
    }

    /// Discount rate, if the code was accepted.
    pub fn rate(&self) -> Option<Percentage> {
        match self {
            CouponOutcome::Accepted { rate } => Some(*rate),
            CouponOutcome::Empty | CouponOutcome::Rejected => None,
        }
    }
}

/// Decides whether a coupon code grants a discount.
pub trait CouponValidator: Send + Sync {
    /// Validate `code` as typed by the patient.
    fn validate(&self, code: &str) -> CouponOutcome;
}

/// Accepts a single literal code, case-insensitively. Surrounding whitespace is
/// part of the code, so `" WELCOME10"` does not match.
#[derive(Debug, Clone)]
pub struct LiteralCoupon {
    code: String,
    rate: Percentage,
}

impl LiteralCoupon {
    /// Accept `code` for a discount of `rate`.
    pub fn new(code: impl Into<String>, rate: Percentage) -> Self {
        Self {
            code: code.into(),
            rate,
        }
    }

    /// The accepted code
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl Default for LiteralCoupon {
    fn default() -> Self {
        Self::new(DEFAULT_COUPON_CODE, Percentage::from(Decimal::new(10, 2)))
    }
}

impl CouponValidator for LiteralCoupon {
    fn validate(&self, code: &str) -> CouponOutcome {
        if code.is_empty() {
            CouponOutcome::Empty
        } else if code.eq_ignore_ascii_case(&self.code) {
            CouponOutcome::Accepted { rate: self.rate }
        } else {
            CouponOutcome::Rejected
        }
    }
}
