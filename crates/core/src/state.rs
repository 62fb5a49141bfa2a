//! Checkout form state
//!
//! [`CheckoutState`] is the single aggregate behind the checkout steps. It is only
//! ever changed by applying a [`CheckoutField`], which replaces exactly one field
//! and leaves the rest untouched. [`CheckoutStore`] owns the current state for
//! the active checkout and is the only writer.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{
    addresses::AddressUuid,
    coupons::{CouponOutcome, CouponValidator},
};

/// Error returned when parsing a method name fails.
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownMethod {
    kind: &'static str,
    value: String,
}

/// How the order reaches the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Standard shipping
    Standard,

    /// Express shipping
    Express,

    /// Collected in person; no address required
    Pickup,
}

impl DeliveryMethod {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMethod::Standard => "standard",
            DeliveryMethod::Express => "express",
            DeliveryMethod::Pickup => "pickup",
        }
    }

    /// Whether the method ships to an address.
    pub fn requires_address(self) -> bool {
        !matches!(self, DeliveryMethod::Pickup)
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(DeliveryMethod::Standard),
            "express" => Ok(DeliveryMethod::Express),
            "pickup" => Ok(DeliveryMethod::Pickup),
            _ => Err(UnknownMethod {
                kind: "delivery method",
                value: s.to_string(),
            }),
        }
    }
}

/// How the order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit card, optionally in installments
    #[default]
    Credit,

    /// Instant transfer
    Pix,

    /// Bank slip (boleto)
    BankSlip,
}

impl PaymentMethod {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankSlip => "bankslip",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(PaymentMethod::Credit),
            "pix" => Ok(PaymentMethod::Pix),
            "bankslip" | "boleto" => Ok(PaymentMethod::BankSlip),
            _ => Err(UnknownMethod {
                kind: "payment method",
                value: s.to_string(),
            }),
        }
    }
}

/// Card fields, only meaningful when paying by credit card.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Card number as typed
    pub number: String,

    /// Name printed on the card
    pub holder_name: String,

    /// Expiry as typed (MM/YY)
    pub expiry: String,

    /// Security code
    pub cvv: String,

    /// Number of installments
    pub installments: u8,

    /// Whether to keep the card on file
    pub save_card: bool,
}

impl CardDetails {
    /// Last four digits of the card number, if at least four digits were entered.
    pub fn last4(&self) -> Option<String> {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        let start = digits.len().checked_sub(4)?;

        digits.get(start..).map(|tail| tail.iter().collect())
    }
}

impl Default for CardDetails {
    fn default() -> Self {
        Self {
            number: String::new(),
            holder_name: String::new(),
            expiry: String::new(),
            cvv: String::new(),
            installments: 1,
            save_card: false,
        }
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("holder_name", &self.holder_name)
            .field("installments", &self.installments)
            .field("save_card", &self.save_card)
            .finish_non_exhaustive()
    }
}

/// A single field update.
#[derive(Clone, PartialEq, Eq)]
pub enum CheckoutField {
    /// Select (or clear) the delivery method
    DeliveryMethod(Option<DeliveryMethod>),

    /// Select (or clear) the delivery address
    SelectedAddress(Option<AddressUuid>),

    /// Select the payment method
    PaymentMethod(PaymentMethod),

    /// Card number
    CardNumber(String),

    /// Card holder name
    CardHolderName(String),

    /// Card expiry
    CardExpiry(String),

    /// Card security code
    CardCvv(String),

    /// Installment count
    Installments(u8),

    /// Keep card on file
    SaveCard(bool),

    /// Coupon code as typed
    CouponCode(String),

    /// Free-text notes for the order
    OrderNotes(String),

    /// Terms and conditions acceptance
    TermsAccepted(bool),
}

impl CheckoutField {
    /// Field name, safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutField::DeliveryMethod(_) => "delivery_method",
            CheckoutField::SelectedAddress(_) => "selected_address",
            CheckoutField::PaymentMethod(_) => "payment_method",
            CheckoutField::CardNumber(_) => "card_number",
            CheckoutField::CardHolderName(_) => "card_holder_name",
            CheckoutField::CardExpiry(_) => "card_expiry",
            CheckoutField::CardCvv(_) => "card_cvv",
            CheckoutField::Installments(_) => "installments",
            CheckoutField::SaveCard(_) => "save_card",
            CheckoutField::CouponCode(_) => "coupon_code",
            CheckoutField::OrderNotes(_) => "order_notes",
            CheckoutField::TermsAccepted(_) => "terms_accepted",
        }
    }
}

// Card values never reach logs.
impl fmt::Debug for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CheckoutField").field(&self.name()).finish()
    }
}

/// Everything the patient has entered so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    delivery_method: Option<DeliveryMethod>,
    selected_address: Option<AddressUuid>,
    payment_method: PaymentMethod,
    card: CardDetails,
    coupon_code: String,
    order_notes: String,
    terms_accepted: bool,
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self {
            delivery_method: Some(DeliveryMethod::Standard),
            selected_address: None,
            payment_method: PaymentMethod::default(),
            card: CardDetails::default(),
            coupon_code: String::new(),
            order_notes: String::new(),
            terms_accepted: false,
        }
    }
}

impl CheckoutState {
    /// A state with nothing selected at all, not even a delivery method.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            delivery_method: None,
            ..Self::default()
        }
    }

    /// Return a new state with `field` replaced and every other field kept.
    #[must_use]
    pub fn apply(mut self, field: CheckoutField) -> Self {
        match field {
            CheckoutField::DeliveryMethod(method) => self.delivery_method = method,
            CheckoutField::SelectedAddress(address) => self.selected_address = address,
            CheckoutField::PaymentMethod(method) => self.payment_method = method,
            CheckoutField::CardNumber(number) => self.card.number = number,
            CheckoutField::CardHolderName(name) => self.card.holder_name = name,
            CheckoutField::CardExpiry(expiry) => self.card.expiry = expiry,
            CheckoutField::CardCvv(cvv) => self.card.cvv = cvv,
            CheckoutField::Installments(installments) => self.card.installments = installments,
            CheckoutField::SaveCard(save) => self.card.save_card = save,
            CheckoutField::CouponCode(code) => self.coupon_code = code,
            CheckoutField::OrderNotes(notes) => self.order_notes = notes,
            CheckoutField::TermsAccepted(accepted) => self.terms_accepted = accepted,
        }

        self
    }

    /// Selected delivery method
    pub fn delivery_method(&self) -> Option<DeliveryMethod> {
        self.delivery_method
    }

    /// Selected address
    pub fn selected_address(&self) -> Option<AddressUuid> {
        self.selected_address
    }

    /// Selected payment method
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Card fields
    pub fn card(&self) -> &CardDetails {
        &self.card
    }

    /// Coupon code as typed
    pub fn coupon_code(&self) -> &str {
        &self.coupon_code
    }

    /// Order notes
    pub fn order_notes(&self) -> &str {
        &self.order_notes
    }

    /// Whether the terms were accepted
    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }
}

/// Single-writer holder of the current [`CheckoutState`].
#[derive(Debug, Clone, Default)]
pub struct CheckoutStore {
    state: CheckoutState,
}

impl CheckoutStore {
    /// Start from the default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    #[must_use]
    pub fn with_state(state: CheckoutState) -> Self {
        Self { state }
    }

    /// Current state
    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Merge one field into the state.
    pub fn update_field(&mut self, field: CheckoutField) {
        trace!(field = field.name(), "updating checkout field");

        self.state = std::mem::take(&mut self.state).apply(field);
    }

    /// Validate the typed coupon code.
    ///
    /// A rejected code is cleared from the state so a stale code cannot linger
    /// without contributing a discount. Empty input is left alone.
    pub fn apply_coupon(&mut self, validator: &dyn CouponValidator) -> CouponOutcome {
        let outcome = validator.validate(&self.state.coupon_code);

        if matches!(outcome, CouponOutcome::Rejected) {
            self.update_field(CheckoutField::CouponCode(String::new()));
        }

        outcome
    }

    /// Consume the store, returning the final state.
    #[must_use]
    pub fn into_state(self) -> CheckoutState {
        self.state
    }
}
