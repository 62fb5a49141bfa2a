use std::sync::Arc;

use clap::Args;

use verdant::{
    addresses::AddressUuid,
    coupons::CouponOutcome,
    state::{CheckoutField, DeliveryMethod, PaymentMethod},
};
use verdant_app::{
    config::{CheckoutConfig, GatewayConfig},
    session::CheckoutSession,
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Order service settings.
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Cart fixture name
    #[arg(long, default_value = "patient")]
    cart: String,

    /// Address book fixture name
    #[arg(long, default_value = "patient")]
    addresses: String,

    /// Delivery method (standard, express, pickup)
    #[arg(long, default_value = "standard")]
    delivery: DeliveryMethod,

    /// Delivery address; the default address when omitted
    #[arg(long)]
    address: Option<AddressUuid>,

    /// Payment method (credit, pix, bankslip)
    #[arg(long, default_value = "credit")]
    payment: PaymentMethod,

    /// Card number
    #[arg(long, default_value = "")]
    card_number: String,

    /// Name printed on the card
    #[arg(long, default_value = "")]
    card_holder: String,

    /// Card expiry (MM/YY)
    #[arg(long, default_value = "")]
    card_expiry: String,

    /// Card security code
    #[arg(long, default_value = "", hide_default_value = true)]
    card_cvv: String,

    /// Number of installments
    #[arg(long, default_value_t = 1)]
    installments: u8,

    /// Keep the card on file
    #[arg(long)]
    save_card: bool,

    /// Coupon code
    #[arg(long, default_value = "")]
    coupon: String,

    /// Notes for the order
    #[arg(long, default_value = "")]
    notes: String,

    /// Accept the terms and conditions
    #[arg(long)]
    accept_terms: bool,
}

pub(crate) async fn run(config: &CheckoutConfig, args: CheckoutArgs) -> Result<(), String> {
    let fixture = config.fixture();

    let cart = fixture
        .load_cart(&args.cart)
        .map_err(|error| format!("failed to load cart `{}`: {error}", args.cart))?;
    let addresses = fixture
        .load_addresses(&args.addresses)
        .map_err(|error| format!("failed to load addresses `{}`: {error}", args.addresses))?;

    let coupons = config
        .coupon_validator()
        .map_err(|error| format!("invalid checkout configuration: {error}"))?;
    let timeout = args
        .gateway
        .submit_timeout()
        .map_err(|error| format!("invalid gateway configuration: {error}"))?;

    let session = CheckoutSession::new(cart, addresses, Arc::new(args.gateway.http_gateway()))
        .with_coupon_validator(Arc::new(coupons))
        .with_submit_timeout(timeout);

    let mut delivery = vec![CheckoutField::DeliveryMethod(Some(args.delivery))];

    if let Some(address) = args.address {
        delivery.push(CheckoutField::SelectedAddress(Some(address)));
    }

    delivery.push(CheckoutField::CouponCode(args.coupon));

    for field in delivery {
        session.update_field(field).await.map_err(|error| error.to_string())?;
    }

    let coupon = session
        .apply_coupon()
        .await
        .map_err(|error| error.to_string())?;

    if matches!(coupon, CouponOutcome::Rejected) {
        println!("coupon is not valid and was removed");
    }

    session.next().await.map_err(|error| error.to_string())?;

    for field in [
        CheckoutField::PaymentMethod(args.payment),
        CheckoutField::CardNumber(args.card_number),
        CheckoutField::CardHolderName(args.card_holder),
        CheckoutField::CardExpiry(args.card_expiry),
        CheckoutField::CardCvv(args.card_cvv),
        CheckoutField::Installments(args.installments),
        CheckoutField::SaveCard(args.save_card),
    ] {
        session.update_field(field).await.map_err(|error| error.to_string())?;
    }

    session.next().await.map_err(|error| error.to_string())?;

    for field in [
        CheckoutField::OrderNotes(args.notes),
        CheckoutField::TermsAccepted(args.accept_terms),
    ] {
        session.update_field(field).await.map_err(|error| error.to_string())?;
    }

    let order_id = session.submit().await.map_err(|error| {
        if error.is_retryable() {
            format!("order was not placed, please try again: {error}")
        } else {
            format!("order was not placed: {error}")
        }
    })?;

    match session.confirmation().await {
        Some(confirmation) => {
            for line in confirmation.lines() {
                println!("{line}");
            }
        }
        None => println!("order {order_id} placed"),
    }

    Ok(())
}
