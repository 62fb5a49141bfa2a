//! Step sequencer
//!
//! Checkout is a linear wizard: `Delivery -> Payment -> Review -> Complete`.
//!
//! Moving forward is gated by the predicates in [`crate::validation`]; moving back
//! is always allowed and never clears anything the patient entered. `Complete`
//! is only reachable by resolving a [`SubmissionTicket`] with the identifier the
//! gateway returned, and only one ticket can be outstanding at a time.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{
    addresses::AddressBook,
    order::OrderId,
    state::CheckoutState,
    validation::{ValidationError, validate_delivery, validate_payment, validate_review},
};

/// A checkout step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Choose delivery method and address
    Delivery,

    /// Choose payment method and enter card details
    Payment,

    /// Review everything and accept the terms
    Review,

    /// The order was placed
    Complete(OrderId),
}

impl Step {
    /// Position in the wizard, starting at 1.
    pub fn index(&self) -> u8 {
        match self {
            Step::Delivery => 1,
            Step::Payment => 2,
            Step::Review => 3,
            Step::Complete(_) => 4,
        }
    }

    /// Heading shown for the step.
    pub fn title(&self) -> &'static str {
        match self {
            Step::Delivery => "Delivery",
            Step::Payment => "Payment",
            Step::Review => "Review",
            Step::Complete(_) => "Order placed",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Step::Delivery => "delivery",
            Step::Payment => "payment",
            Step::Review => "review",
            Step::Complete(_) => "complete",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by step transitions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SequencerError {
    /// The step's guard failed; the message is meant for the patient.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The action makes no sense from the current step.
    #[error("cannot {action} from the {from} step")]
    InvalidTransition {
        /// Step the action was attempted from
        from: &'static str,

        /// Attempted action
        action: &'static str,
    },

    /// A submission is already in flight.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The ticket does not belong to the submission in flight.
    #[error("submission ticket does not match the attempt in progress")]
    StaleTicket,
}

/// Proof that a submission attempt was started. Resolve it exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a submission ticket must be completed or failed"]
pub struct SubmissionTicket {
    attempt: u64,
}

impl SubmissionTicket {
    /// Attempt number, starting at 1.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

/// Finite-state controller for the checkout steps.
#[derive(Debug, Clone)]
pub struct Sequencer {
    step: Step,
    in_flight: Option<u64>,
    attempts: u64,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            step: Step::Delivery,
            in_flight: None,
            attempts: 0,
        }
    }
}

impl Sequencer {
    /// Start at the delivery step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// Whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of submission attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Advance to the next step if the current step validates.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::Validation`]: the current step's guard failed; the step is unchanged.
    /// - [`SequencerError::InvalidTransition`]: called on `Review` (submit instead) or `Complete`.
    pub fn next(
        &mut self,
        state: &CheckoutState,
        addresses: &AddressBook,
    ) -> Result<&Step, SequencerError> {
        let next = match self.step {
            Step::Delivery => {
                validate_delivery(state, addresses)?;
                Step::Payment
            }
            Step::Payment => {
                validate_payment(state)?;
                Step::Review
            }
            Step::Review | Step::Complete(_) => return Err(self.invalid("advance")),
        };

        self.transition(next);

        Ok(&self.step)
    }

    /// Return to the previous step.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::SubmissionInFlight`]: leaving `Review` while submitting.
    /// - [`SequencerError::InvalidTransition`]: called on `Delivery` or `Complete`.
    pub fn back(&mut self) -> Result<&Step, SequencerError> {
        let previous = match self.step {
            Step::Payment => Step::Delivery,
            Step::Review if self.is_submitting() => {
                return Err(SequencerError::SubmissionInFlight);
            }
            Step::Review => Step::Payment,
            Step::Delivery | Step::Complete(_) => return Err(self.invalid("go back")),
        };

        self.transition(previous);

        Ok(&self.step)
    }

    /// Start a submission attempt from `Review`.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::InvalidTransition`]: not on the review step.
    /// - [`SequencerError::SubmissionInFlight`]: another attempt has not resolved yet.
    /// - [`SequencerError::Validation`]: the terms were not accepted.
    pub fn begin_submission(
        &mut self,
        state: &CheckoutState,
    ) -> Result<SubmissionTicket, SequencerError> {
        if self.step != Step::Review {
            return Err(self.invalid("submit"));
        }

        if self.is_submitting() {
            return Err(SequencerError::SubmissionInFlight);
        }

        validate_review(state)?;

        self.attempts += 1;
        self.in_flight = Some(self.attempts);

        debug!(attempt = self.attempts, "order submission started");

        Ok(SubmissionTicket {
            attempt: self.attempts,
        })
    }

    /// Resolve the attempt as successful and move to `Complete`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::StaleTicket`] if `ticket` is not the attempt in flight.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        order_id: OrderId,
    ) -> Result<&Step, SequencerError> {
        self.resolve(&ticket)?;
        self.transition(Step::Complete(order_id));

        Ok(&self.step)
    }

    /// Resolve the attempt as failed, staying on `Review` so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::StaleTicket`] if `ticket` is not the attempt in flight.
    pub fn fail_submission(&mut self, ticket: SubmissionTicket) -> Result<(), SequencerError> {
        self.resolve(&ticket)?;

        debug!(attempt = ticket.attempt, "order submission failed");

        Ok(())
    }

    fn resolve(&mut self, ticket: &SubmissionTicket) -> Result<(), SequencerError> {
        if self.in_flight != Some(ticket.attempt) {
            return Err(SequencerError::StaleTicket);
        }

        self.in_flight = None;

        Ok(())
    }

    fn transition(&mut self, to: Step) {
        debug!(from = %self.step, to = %to, "checkout step changed");

        self.step = to;
    }

    fn invalid(&self, action: &'static str) -> SequencerError {
        SequencerError::InvalidTransition {
            from: self.step.name(),
            action,
        }
    }
}
