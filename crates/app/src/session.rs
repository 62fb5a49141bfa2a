//! Checkout session
//!
//! A [`CheckoutSession`] owns everything one checkout needs: the cart, the
//! address book, the form store, the step sequencer, the coupon validator and
//! the order gateway. It is what a UI event loop talks to.
//!
//! All mutable state sits behind a single async mutex. The lock is released
//! while the gateway call is awaited; the sequencer's in-flight flag keeps a
//! second submit from reaching the gateway in the meantime. Each attempt runs
//! on its own task and settles the session itself, so the outcome is recorded
//! even when the caller stops waiting.

use std::{fmt, sync::Arc, time::Duration};

use jiff::Timestamp;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use verdant::{
    addresses::AddressBook,
    cart::Cart,
    confirmation::Confirmation,
    coupons::{CouponOutcome, CouponValidator, LiteralCoupon},
    order::{OrderId, OrderRequest},
    pricing::{DerivedTotals, PricingError, ShippingRates, calculate_totals},
    sequencer::{Sequencer, SequencerError, Step, SubmissionTicket},
    state::{CheckoutField, CheckoutState, CheckoutStore},
};

use crate::gateway::{GatewayError, OrderGateway};

/// Time allowed for one submission attempt unless configured otherwise.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by form and navigation actions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The field cannot be edited on the current step.
    #[error("{field} cannot be changed on the {step} step")]
    ReadOnly {
        /// Field that was edited
        field: &'static str,

        /// Current step
        step: Step,
    },

    /// Nothing can be edited while the order is being submitted.
    #[error("checkout cannot be changed while the order is being submitted")]
    Submitting,

    /// The step transition was refused.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// Errors raised by [`CheckoutSession::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Another submission is still waiting on the gateway.
    #[error("an order submission is already in progress")]
    InFlight,

    /// Submission is not allowed from the current step or state.
    #[error(transparent)]
    Sequencer(SequencerError),

    /// Totals could not be derived for the payload.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The gateway failed or refused the order.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The gateway did not answer in time.
    #[error("the order service did not answer within {} seconds", .0.as_secs())]
    TimedOut(Duration),

    /// The gateway call crashed.
    #[error("the order could not be submitted due to an unexpected error")]
    GatewayPanicked,
}

impl SubmitError {
    /// Whether the patient can simply try again from the review step.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmitError::Gateway(_) | SubmitError::TimedOut(_) | SubmitError::GatewayPanicked
        )
    }
}

impl From<SequencerError> for SubmitError {
    fn from(error: SequencerError) -> Self {
        match error {
            SequencerError::SubmissionInFlight => SubmitError::InFlight,
            other => SubmitError::Sequencer(other),
        }
    }
}

#[derive(Debug)]
struct SessionState<'a> {
    store: CheckoutStore,
    sequencer: Sequencer,
    confirmation: Option<Confirmation<'a>>,
}

impl SessionState<'_> {
    /// Delivery and payment are freely editable; review only takes the terms and
    /// notes; nothing changes once submitting or complete.
    fn ensure_editable(&self, field: &CheckoutField) -> Result<(), SessionError> {
        if self.sequencer.is_submitting() {
            return Err(SessionError::Submitting);
        }

        let step = self.sequencer.step();
        let editable = match step {
            Step::Delivery | Step::Payment => true,
            Step::Review => matches!(
                field,
                CheckoutField::TermsAccepted(_) | CheckoutField::OrderNotes(_)
            ),
            Step::Complete(_) => false,
        };

        if editable {
            Ok(())
        } else {
            Err(SessionError::ReadOnly {
                field: field.name(),
                step: step.clone(),
            })
        }
    }
}

/// One patient's checkout, from delivery to confirmation.
pub struct CheckoutSession<'a> {
    cart: Arc<Cart<'a>>,
    addresses: Arc<AddressBook>,
    rates: ShippingRates<'a>,
    coupons: Arc<dyn CouponValidator>,
    gateway: Arc<dyn OrderGateway>,
    submit_timeout: Duration,
    inner: Arc<Mutex<SessionState<'a>>>,
}

impl fmt::Debug for CheckoutSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("cart", &self.cart)
            .field("addresses", &self.addresses)
            .field("rates", &self.rates)
            .field("submit_timeout", &self.submit_timeout)
            .finish_non_exhaustive()
    }
}

impl<'a> CheckoutSession<'a> {
    /// Start a checkout for `cart`, shipping to one of `addresses`.
    ///
    /// The patient's default address, if any, is preselected. Shipping uses the
    /// default flat rates and the welcome coupon is accepted.
    pub fn new(cart: Cart<'a>, addresses: AddressBook, gateway: Arc<dyn OrderGateway>) -> Self {
        let mut store = CheckoutStore::new();

        if let Some(address) = addresses.default_address() {
            store.update_field(CheckoutField::SelectedAddress(Some(address.uuid)));
        }

        let rates = ShippingRates::defaults(cart.currency());

        Self {
            cart: Arc::new(cart),
            addresses: Arc::new(addresses),
            rates,
            coupons: Arc::new(LiteralCoupon::default()),
            gateway,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            inner: Arc::new(Mutex::new(SessionState {
                store,
                sequencer: Sequencer::new(),
                confirmation: None,
            })),
        }
    }

    /// Use `coupons` to decide which codes grant a discount.
    #[must_use]
    pub fn with_coupon_validator(mut self, coupons: Arc<dyn CouponValidator>) -> Self {
        self.coupons = coupons;
        self
    }

    /// Use `rates` for shipping.
    #[must_use]
    pub fn with_shipping_rates(mut self, rates: ShippingRates<'a>) -> Self {
        self.rates = rates;
        self
    }

    /// Give up on a submission attempt after `timeout`.
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// The cart being checked out
    pub fn cart(&self) -> &Cart<'a> {
        self.cart.as_ref()
    }

    /// Addresses the patient can ship to
    pub fn addresses(&self) -> &AddressBook {
        self.addresses.as_ref()
    }

    /// Current step
    pub async fn step(&self) -> Step {
        self.inner.lock().await.sequencer.step().clone()
    }

    /// Snapshot of the form state
    pub async fn state(&self) -> CheckoutState {
        self.inner.lock().await.store.state().clone()
    }

    /// Whether a submission is waiting on the gateway.
    pub async fn is_submitting(&self) -> bool {
        self.inner.lock().await.sequencer.is_submitting()
    }

    /// The confirmation, once the order has been placed.
    pub async fn confirmation(&self) -> Option<Confirmation<'a>> {
        self.inner.lock().await.confirmation.clone()
    }

    /// Change one form field.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Submitting`]: a submission is in flight.
    /// - [`SessionError::ReadOnly`]: the field is not editable on the current step.
    pub async fn update_field(&self, field: CheckoutField) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        inner.ensure_editable(&field)?;
        inner.store.update_field(field);

        Ok(())
    }

    /// Validate the typed coupon code. A rejected code is cleared from the form.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ReadOnly`] past the payment step, or
    /// [`SessionError::Submitting`] while submitting.
    pub async fn apply_coupon(&self) -> Result<CouponOutcome, SessionError> {
        let mut inner = self.inner.lock().await;

        inner.ensure_editable(&CheckoutField::CouponCode(String::new()))?;

        let outcome = inner.store.apply_coupon(self.coupons.as_ref());

        match outcome {
            CouponOutcome::Accepted { .. } => info!("coupon applied"),
            CouponOutcome::Rejected => info!("coupon code not recognised"),
            CouponOutcome::Empty => {}
        }

        Ok(outcome)
    }

    /// Totals for the cart and the current selections.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if no delivery method is selected or an amount overflows.
    pub async fn totals(&self) -> Result<DerivedTotals<'a>, PricingError> {
        let inner = self.inner.lock().await;

        self.derive_totals(inner.store.state())
    }

    /// Advance to the next step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Sequencer`] when the current step does not validate
    /// or cannot be advanced with `next`.
    pub async fn next(&self) -> Result<Step, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let from = inner.sequencer.step().clone();

        match inner.sequencer.next(inner.store.state(), &self.addresses) {
            Ok(to) => {
                info!(%from, %to, "checkout step advanced");

                Ok(to.clone())
            }
            Err(error) => {
                warn!(step = %from, %error, "checkout step blocked");

                Err(error.into())
            }
        }
    }

    /// Return to the previous step, keeping everything entered.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Sequencer`] on the first step, once complete, or while submitting.
    pub async fn back(&self) -> Result<Step, SessionError> {
        let mut inner = self.inner.lock().await;
        let from = inner.sequencer.step().clone();
        let to = inner.sequencer.back()?.clone();

        info!(%from, %to, "checkout step went back");

        Ok(to)
    }

    fn derive_totals(&self, state: &CheckoutState) -> Result<DerivedTotals<'a>, PricingError> {
        calculate_totals(
            &self.cart,
            state.delivery_method(),
            &self.coupons.validate(state.coupon_code()),
            &self.rates,
        )
    }
}

impl CheckoutSession<'static> {
    /// Submit the order from the review step.
    ///
    /// Each call sends a fresh idempotency key and invokes the gateway at most
    /// once. On success the session moves to `Complete` and the confirmation
    /// becomes available; on failure it stays on review so the patient can retry.
    ///
    /// The attempt keeps running if this future is dropped: the session still
    /// reaches `Complete`, or returns to an idle review, once the gateway answers
    /// or the timeout expires.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::InFlight`]: another submission has not finished.
    /// - [`SubmitError::Sequencer`]: not on review, or the terms are not accepted.
    /// - [`SubmitError::Gateway`], [`SubmitError::TimedOut`], [`SubmitError::GatewayPanicked`]:
    ///   the attempt failed and can be retried.
    pub async fn submit(&self) -> Result<OrderId, SubmitError> {
        let attempt = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;

            let ticket = inner
                .sequencer
                .begin_submission(inner.store.state())
                .inspect_err(|error| warn!(%error, "order submission refused"))?;

            let totals = match self.derive_totals(inner.store.state()) {
                Ok(totals) => totals,
                Err(error) => {
                    inner.sequencer.fail_submission(ticket)?;

                    return Err(error.into());
                }
            };

            let request =
                OrderRequest::build(inner.store.state(), &self.cart, &totals, Uuid::now_v7());

            SubmissionAttempt {
                ticket,
                request,
                totals,
                gateway: Arc::clone(&self.gateway),
                submit_timeout: self.submit_timeout,
                cart: Arc::clone(&self.cart),
                addresses: Arc::clone(&self.addresses),
                inner: Arc::clone(&self.inner),
            }
        };

        info!(
            attempt = attempt.ticket.attempt(),
            idempotency_key = %attempt.request.idempotency_key,
            total = %attempt.totals.total().amount(),
            "submitting order"
        );

        match tokio::spawn(attempt.run()).await {
            Ok(result) => result,
            Err(join_error) => {
                error!(%join_error, "order submission task failed");

                Err(SubmitError::GatewayPanicked)
            }
        }
    }
}

/// One submission in flight, with everything needed to settle the session.
struct SubmissionAttempt {
    ticket: SubmissionTicket,
    request: OrderRequest,
    totals: DerivedTotals<'static>,
    gateway: Arc<dyn OrderGateway>,
    submit_timeout: Duration,
    cart: Arc<Cart<'static>>,
    addresses: Arc<AddressBook>,
    inner: Arc<Mutex<SessionState<'static>>>,
}

impl SubmissionAttempt {
    /// Call the gateway, then resolve the ticket: `Complete` with a confirmation
    /// on success, back to an idle review otherwise.
    async fn run(self) -> Result<OrderId, SubmitError> {
        let Self {
            ticket,
            request,
            totals,
            gateway,
            submit_timeout,
            cart,
            addresses,
            inner,
        } = self;

        let attempt = ticket.attempt();
        let outcome = dispatch(gateway, request, submit_timeout).await;

        let mut guard = inner.lock().await;
        let session = &mut *guard;

        let order_id = match outcome {
            Ok(order_id) => order_id,
            Err(error) => {
                session.sequencer.fail_submission(ticket)?;

                warn!(
                    attempt,
                    %error,
                    retryable = error.is_retryable(),
                    "order submission failed"
                );

                return Err(error);
            }
        };

        let confirmation = match Confirmation::new(
            order_id.clone(),
            Timestamp::now(),
            session.store.state(),
            &cart,
            &addresses,
            totals,
        ) {
            Ok(confirmation) => confirmation,
            Err(error) => {
                session.sequencer.fail_submission(ticket)?;

                return Err(error.into());
            }
        };

        session
            .sequencer
            .complete_submission(ticket, order_id.clone())?;
        session.confirmation = Some(confirmation);

        info!(attempt, %order_id, "order placed");

        Ok(order_id)
    }
}

/// Run the gateway call on its own task, bounded by `submit_timeout`. A
/// panicking gateway surfaces as [`SubmitError::GatewayPanicked`].
async fn dispatch(
    gateway: Arc<dyn OrderGateway>,
    request: OrderRequest,
    submit_timeout: Duration,
) -> Result<OrderId, SubmitError> {
    let mut task = tokio::spawn(async move { gateway.submit(&request).await });

    match tokio::time::timeout(submit_timeout, &mut task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_error)) => {
            error!(%join_error, "order gateway task failed");

            Err(SubmitError::GatewayPanicked)
        }
        Err(_elapsed) => {
            task.abort();

            Err(SubmitError::TimedOut(submit_timeout))
        }
    }
}
