//! Step validation
//!
//! Pure predicates deciding whether the patient may leave a step. They read the
//! form state and never change it.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    addresses::{AddressBook, AddressUuid},
    state::{CheckoutState, PaymentMethod},
};

/// Card fields that must be filled in for a credit card payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    /// Card number
    Number,

    /// Holder name
    HolderName,

    /// Expiry date
    Expiry,

    /// Security code
    Cvv,
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CardField::Number => "card number",
            CardField::HolderName => "cardholder name",
            CardField::Expiry => "expiry date",
            CardField::Cvv => "CVV",
        })
    }
}

/// Missing card fields, in form order.
pub type MissingCardFields = SmallVec<[CardField; 4]>;

/// Why a step cannot be left yet. The message is shown to the patient as is.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// No delivery method chosen.
    #[error("Please choose a delivery method.")]
    MissingDeliveryMethod,

    /// Shipping needs an address and none is selected.
    #[error("Please select a delivery address.")]
    MissingAddress,

    /// The selected address is not in the patient's address book.
    #[error("The selected address is no longer available.")]
    UnknownAddress(AddressUuid),

    /// Credit card payment with empty card fields.
    #[error("Please fill in the {}.", list(.0))]
    IncompleteCard(MissingCardFields),

    /// Terms and conditions not accepted.
    #[error("You must accept the terms and conditions to place the order.")]
    TermsNotAccepted,
}

fn list(fields: &[CardField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Delivery step: a method is chosen and, unless collecting in person, an address
/// from the address book is selected.
///
/// # Errors
///
/// Returns the first [`ValidationError`] that blocks the step.
pub fn validate_delivery(
    state: &CheckoutState,
    addresses: &AddressBook,
) -> Result<(), ValidationError> {
    let method = state
        .delivery_method()
        .ok_or(ValidationError::MissingDeliveryMethod)?;

    if !method.requires_address() {
        return Ok(());
    }

    let address = state
        .selected_address()
        .ok_or(ValidationError::MissingAddress)?;

    if addresses.contains(address) {
        Ok(())
    } else {
        Err(ValidationError::UnknownAddress(address))
    }
}

/// Payment step: credit card payments need number, holder, expiry and CVV.
///
/// Only presence is checked; there is no Luhn or expiry-date validation.
///
/// # Errors
///
/// Returns [`ValidationError::IncompleteCard`] listing every empty field.
pub fn validate_payment(state: &CheckoutState) -> Result<(), ValidationError> {
    if state.payment_method() != PaymentMethod::Credit {
        return Ok(());
    }

    let card = state.card();

    let missing: MissingCardFields = [
        (CardField::Number, &card.number),
        (CardField::HolderName, &card.holder_name),
        (CardField::Expiry, &card.expiry),
        (CardField::Cvv, &card.cvv),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::IncompleteCard(missing))
    }
}

/// Review step: the terms must be accepted before the order is submitted.
///
/// # Errors
///
/// Returns [`ValidationError::TermsNotAccepted`].
pub fn validate_review(state: &CheckoutState) -> Result<(), ValidationError> {
    if state.terms_accepted() {
        Ok(())
    } else {
        Err(ValidationError::TermsNotAccepted)
    }
}
