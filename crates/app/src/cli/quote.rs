use clap::Args;

use verdant::{
    confirmation::{display_amount, totals_lines},
    coupons::{CouponOutcome, CouponValidator},
    pricing::{ShippingRates, calculate_totals, line_total},
    state::DeliveryMethod,
};
use verdant_app::config::CheckoutConfig;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Cart fixture name
    #[arg(long, default_value = "patient")]
    cart: String,

    /// Delivery method (standard, express, pickup)
    #[arg(long, default_value = "standard")]
    delivery: DeliveryMethod,

    /// Coupon code to apply
    #[arg(long, default_value = "")]
    coupon: String,
}

pub(crate) fn run(config: &CheckoutConfig, args: QuoteArgs) -> Result<(), String> {
    let cart = config
        .fixture()
        .load_cart(&args.cart)
        .map_err(|error| format!("failed to load cart `{}`: {error}", args.cart))?;

    let coupons = config
        .coupon_validator()
        .map_err(|error| format!("invalid checkout configuration: {error}"))?;

    let coupon = coupons.validate(&args.coupon);

    if matches!(coupon, CouponOutcome::Rejected) {
        println!("coupon `{}` is not valid and was ignored", args.coupon);
    }

    let totals = calculate_totals(
        &cart,
        Some(args.delivery),
        &coupon,
        &ShippingRates::defaults(cart.currency()),
    )
    .map_err(|error| format!("failed to price cart: {error}"))?;

    for (index, item) in cart.iter().enumerate() {
        let total = line_total(index, item)
            .map_err(|error| format!("failed to price cart: {error}"))?;

        println!(
            "{} x {} @ {} = {}",
            item.quantity(),
            item.name(),
            display_amount(item.unit_price_applied()),
            display_amount(&total)
        );
    }

    for line in totals_lines(&totals) {
        println!("{line}");
    }

    Ok(())
}
