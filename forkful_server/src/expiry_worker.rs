use chrono::Duration;
use forkful_engine::{
    api::order_objects::PricingPolicy,
    db_types::Order,
    events::EventProducers,
    SettlementApi,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::checkout::CheckoutGateway;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Starts the stale-order expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Abandoned checkouts leave pending placeholder orders behind; this worker cancels any that have sat unpaid for
/// longer than `pending_timeout` so they stop showing up as open orders.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    gateway: CheckoutGateway,
    producers: EventProducers,
    pricing: PricingPolicy,
    pending_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = SettlementApi::new(db, gateway, pricing, producers);
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        info!("🕰️ Stale order expiry worker started (timeout {} hrs)", pending_timeout.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running stale order sweep");
            match api.expire_stale_orders(pending_timeout).await {
                Ok(cancelled) if cancelled.is_empty() => {},
                Ok(cancelled) => {
                    info!("🕰️ {} stale orders cancelled: {}", cancelled.len(), order_list(&cancelled));
                },
                Err(e) => {
                    error!("🕰️ Error running stale order sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] session: {}", o.id, o.session_id.as_ref().map(|s| s.as_str()).unwrap_or("-")))
        .collect::<Vec<String>>()
        .join(", ")
}
