use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::{
    web::{
        types::{DeserSubscription, SubscribeResponse, ValidSubscription},
        WebResult,
    },
    AppState,
};

/// Validates the subscription request and inserts exactly one row into the store.
/// Nothing reaches the store unless every check passes.
#[tracing::instrument(
    name = "Saving new subscription to the row store",
    skip(app_state, payload)
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    payload: Result<Json<DeserSubscription>, JsonRejection>,
) -> WebResult<Json<SubscribeResponse>> {
    let Json(subscription) = payload?;
    let subscription = ValidSubscription::try_from(subscription)?;
    tracing::debug!(
        subscription_type = subscription.subscription_type.as_ref(),
        has_email = subscription.email.is_some(),
        has_phone_number = subscription.phone_number.is_some(),
        "subscription validated"
    );

    let rows = app_state
        .row_store
        .insert_subscription(&subscription.to_record())
        .await?;
    info!("SUCCESS!");

    Ok(Json(SubscribeResponse::subscribed(rows)))
}
