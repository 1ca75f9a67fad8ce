use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use storefront_auth_types::identity::IdentityHeaders;

use crate::domain::types::{Buyer, LineItem, PriceTotals, ShippingAddressInput};
use crate::error::CheckoutServiceError;
use crate::state::AppState;
use crate::usecase::checkout::SubmitCheckoutInput;

// ── POST /checkout ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub order_items: Vec<LineItem>,
    pub shipping_address: Option<ShippingAddressInput>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items_price: f64,
    #[serde(default)]
    pub tax_price: f64,
    #[serde(default)]
    pub shipping_price: f64,
    #[serde(default)]
    pub total_price: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAccepted {
    pub job_id: String,
    pub order_number: String,
    pub status: &'static str,
}

pub async fn submit_checkout(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutAccepted>), CheckoutServiceError> {
    let output = state
        .submit_checkout()
        .execute(SubmitCheckoutInput {
            buyer: Buyer {
                id: identity.user_id,
                email: identity.email,
                name: identity.name,
            },
            order_items: body.order_items,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            prices: PriceTotals {
                items_price: body.items_price,
                tax_price: body.tax_price,
                shipping_price: body.shipping_price,
                total_price: body.total_price,
            },
        })
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CheckoutAccepted {
            job_id: output.job_id.to_string(),
            order_number: output.order_number,
            status: "queued",
        }),
    ))
}
