//----------------------------------------------   Checkout  ----------------------------------------------------
//! The settlement surface: session open, the client poll path, the manual fallback and the gateway webhook. The
//! first three are synchronous callers and surface real error statuses; the webhook is different — once a delivery
//! has been durably processed or definitively deemed malformed it must be acknowledged with a 2xx, otherwise the
//! gateway keeps redelivering it. Only transient failures may return a retryable status.
use actix_web::{web, HttpResponse};
use checkout_tools::WebhookEvent;
use forkful_engine::{
    api::order_objects::OpenSessionRequest,
    db_types::SessionId,
    traits::{PaymentSessionSource, SettlementDatabase},
    SettlementApi,
    SettlementApiError,
};
use log::*;

use crate::{
    data_objects::{JsonResponse, OpenSessionResponse, OrderResponse, SessionDetailsResponse, SessionRequest},
    errors::ServerError,
    integrations::checkout::session_data_from,
    route,
};

route!(open_checkout_session => Post "/session" impl SettlementDatabase, PaymentSessionSource);
pub async fn open_checkout_session<B, S>(
    body: web::Json<OpenSessionRequest>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let request = body.into_inner();
    debug!("💸️ POST open checkout session ({} items)", request.cart_items.len());
    let handle = api.open_session(request).await?;
    Ok(HttpResponse::Ok().json(OpenSessionResponse {
        success: true,
        session_id: handle.session_id.to_string(),
        url: handle.redirect_url,
    }))
}

route!(session_details => Post "/session/details" impl SettlementDatabase, PaymentSessionSource);
/// The client poll path: called by the storefront after the payment redirect. Reports the session state and, when
/// payment has completed, materializes the order on the spot so a missed webhook cannot strand a paid session.
pub async fn session_details<B, S>(
    body: web::Json<SessionRequest>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let session_id = SessionId::from(body.into_inner().session_id);
    debug!("💸️ POST session details for {session_id}");
    let session = api.fetch_session(&session_id).await?;
    let order = if session.payment_complete {
        Some(api.settle_session(&session).await?)
    } else {
        api.fetch_order_by_session(&session_id).await?
    };
    Ok(HttpResponse::Ok().json(SessionDetailsResponse {
        success: true,
        session_id: session_id.to_string(),
        payment_status: if session.payment_complete { "paid".to_string() } else { "unpaid".to_string() },
        customer_email: session.customer_email,
        order,
    }))
}

route!(order_from_payment => Post "/order" impl SettlementDatabase, PaymentSessionSource);
/// Manual reconciliation fallback: an operator (or the storefront's retry logic) forces materialization of a
/// session. Fails loudly when the payment has not completed.
pub async fn order_from_payment<B, S>(
    body: web::Json<SessionRequest>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let session_id = SessionId::from(body.into_inner().session_id);
    info!("💸️ POST create order from payment for {session_id}");
    let order = api.materialize(&session_id).await?;
    Ok(HttpResponse::Ok().json(OrderResponse {
        success: true,
        message: "Order created successfully".to_string(),
        order,
    }))
}

route!(checkout_webhook => Post "" impl SettlementDatabase, PaymentSessionSource);
/// The gateway webhook. Signature verification has already happened in the middleware wrapping this route.
pub async fn checkout_webhook<B, S>(
    body: web::Json<WebhookEvent>,
    api: web::Data<SettlementApi<B, S>>,
) -> HttpResponse
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let event = body.into_inner();
    trace!("💸️ Received webhook event '{}'", event.event_type);
    if !event.is_checkout_completed() {
        debug!("💸️ Ignoring unhandled webhook event type '{}'", event.event_type);
        return HttpResponse::Ok().json(JsonResponse::success("Event ignored."));
    }
    let session = session_data_from(event.session);
    match api.settle_session(&session).await {
        Ok(order) => {
            info!("💸️ Webhook settled order #{} for session {}", order.id, session.id);
            HttpResponse::Ok().json(JsonResponse::success("Order processed successfully."))
        },
        // Malformed correlation data is a poison pill: log it and acknowledge, or the gateway redelivers forever.
        Err(SettlementApiError::DataIntegrity(e)) => {
            warn!("💸️ Webhook session {} has unusable metadata: {e}", session.id);
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
        // The gateway claims completion but the payload says otherwise. Nothing to settle; acknowledge.
        Err(SettlementApiError::PaymentIncomplete(id)) => {
            warn!("💸️ Webhook delivered a completion event for unpaid session {id}");
            HttpResponse::Ok().json(JsonResponse::failure("Session is not paid."))
        },
        // Transient: signal the gateway to redeliver.
        Err(e) => {
            warn!("💸️ Webhook processing failed transiently for session {}: {e}", session.id);
            HttpResponse::ServiceUnavailable().json(JsonResponse::failure("Temporary failure, please retry."))
        },
    }
}
