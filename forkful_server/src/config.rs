use std::env;

use checkout_tools::CheckoutConfig;
use chrono::Duration;
use fdg_common::{helpers::parse_boolean_flag, Paise};
use forkful_engine::{
    api::order_objects::PricingPolicy,
    db_types::{GeoPoint, RestaurantOrigin},
};
use log::*;

const DEFAULT_FDG_HOST: &str = "127.0.0.1";
const DEFAULT_FDG_PORT: u16 = 8420;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_WEBHOOK_SIGNATURE_HEADER: &str = "X-Checkout-Signature";
const DEFAULT_PENDING_ORDER_TIMEOUT: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the storefront, used to build the gateway redirect URLs.
    pub frontend_url: String,
    /// Payment gateway credentials and timeout, injected into the adapter at construction.
    pub checkout: CheckoutConfig,
    /// Header carrying the webhook HMAC signature.
    pub webhook_signature_header: String,
    /// When false, webhook signatures are not verified. Never run production like this.
    pub webhook_signature_checks: bool,
    /// Tax and delivery-fee parameters applied at session-open time.
    pub pricing: PricingPolicy,
    /// The fixed pickup origin seeded into every new tracking.
    pub origin: RestaurantOrigin,
    /// Placeholder orders unpaid for longer than this are cancelled by the expiry worker.
    pub pending_order_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FDG_HOST.to_string(),
            port: DEFAULT_FDG_PORT,
            database_url: String::default(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            checkout: CheckoutConfig::default(),
            webhook_signature_header: DEFAULT_WEBHOOK_SIGNATURE_HEADER.to_string(),
            webhook_signature_checks: true,
            pricing: PricingPolicy::default(),
            origin: RestaurantOrigin::default(),
            pending_order_timeout: DEFAULT_PENDING_ORDER_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FDG_HOST").ok().unwrap_or_else(|| DEFAULT_FDG_HOST.into());
        let port = env::var("FDG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for FDG_PORT. {e} Using the default, {DEFAULT_FDG_PORT}, instead.");
                    DEFAULT_FDG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FDG_PORT);
        let database_url = env::var("FDG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ FDG_DATABASE_URL is not set. Please set it to the URL for the FDG database.");
            String::default()
        });
        let frontend_url = env::var("FDG_FRONTEND_URL")
            .map(|s| s.trim_matches(['\'', '"']).trim_end_matches('/').to_string())
            .ok()
            .unwrap_or_else(|| {
                warn!("🪛️ FDG_FRONTEND_URL is not set. Using {DEFAULT_FRONTEND_URL} for redirect URLs.");
                DEFAULT_FRONTEND_URL.into()
            });
        let checkout = CheckoutConfig::new_from_env_or_default();
        let webhook_signature_header = env::var("FDG_WEBHOOK_SIGNATURE_HEADER")
            .ok()
            .unwrap_or_else(|| DEFAULT_WEBHOOK_SIGNATURE_HEADER.to_string());
        let webhook_signature_checks =
            parse_boolean_flag(env::var("FDG_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Anyone can post fake payment events. Do not run production like this.");
        }
        let pricing = pricing_from_env();
        let origin = origin_from_env();
        let pending_order_timeout = env::var("FDG_PENDING_ORDER_TIMEOUT")
            .map_err(|_| {
                info!(
                    "🪛️ FDG_PENDING_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                    DEFAULT_PENDING_ORDER_TIMEOUT.num_hours()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FDG_PENDING_ORDER_TIMEOUT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PENDING_ORDER_TIMEOUT);
        Self {
            host,
            port,
            database_url,
            frontend_url,
            checkout,
            webhook_signature_header,
            webhook_signature_checks,
            pricing,
            origin,
            pending_order_timeout,
        }
    }
}

fn pricing_from_env() -> PricingPolicy {
    let defaults = PricingPolicy::default();
    let tax_basis_points = env::var("FDG_TAX_BASIS_POINTS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(defaults.tax_basis_points);
    let free_delivery_threshold = env::var("FDG_FREE_DELIVERY_THRESHOLD_RUPEES")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(Paise::from_rupees)
        .unwrap_or(defaults.free_delivery_threshold);
    let delivery_fee = env::var("FDG_DELIVERY_FEE_RUPEES")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(Paise::from_rupees)
        .unwrap_or(defaults.delivery_fee);
    PricingPolicy { tax_basis_points, free_delivery_threshold, delivery_fee }
}

fn origin_from_env() -> RestaurantOrigin {
    let defaults = RestaurantOrigin::default();
    let lng = env::var("FDG_RESTAURANT_LNG").ok().and_then(|s| s.parse::<f64>().ok());
    let lat = env::var("FDG_RESTAURANT_LAT").ok().and_then(|s| s.parse::<f64>().ok());
    let location = match (lng, lat) {
        (Some(lng), Some(lat)) => GeoPoint::new(lng, lat),
        _ => {
            info!("🪛️ FDG_RESTAURANT_LNG/LAT not set. Using the default restaurant location.");
            defaults.location
        },
    };
    let address = env::var("FDG_RESTAURANT_ADDRESS").ok().unwrap_or(defaults.address);
    RestaurantOrigin { location, address }
}
