use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fdg_common::Paise;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderItem, OrderStatus, ShippingAddress};

//--------------------------------------  OrderQueryFilter   ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub email: Option<String>,
    pub status: Option<Vec<OrderStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.email.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }
}

//--------------------------------------    PricingPolicy    ---------------------------------------------------------
/// The injected pricing parameters applied at session-open time. Totals are always re-derived server-side from the
/// line items with this policy; totals arriving in a request body are ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Tax rate in basis points (10,000 bps = 100%).
    pub tax_basis_points: i64,
    /// Delivery is free when the item subtotal is strictly greater than this.
    pub free_delivery_threshold: Paise,
    /// Flat delivery charge below the threshold.
    pub delivery_fee: Paise,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_basis_points: 500,
            free_delivery_threshold: Paise::from_rupees(500),
            delivery_fee: Paise::from_rupees(50),
        }
    }
}

impl PricingPolicy {
    pub fn quote(&self, subtotal: Paise) -> PricingQuote {
        let tax = subtotal.basis_points(self.tax_basis_points);
        let delivery_charge =
            if subtotal > self.free_delivery_threshold { Paise::default() } else { self.delivery_fee };
        let total = subtotal + tax + delivery_charge;
        PricingQuote { subtotal, tax, delivery_charge, total }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingQuote {
    pub subtotal: Paise,
    pub tax: Paise,
    pub delivery_charge: Paise,
    pub total: Paise,
}

//-------------------------------------- OpenSessionRequest  ---------------------------------------------------------
/// Input to [`SettlementApi::open_session`](crate::SettlementApi::open_session). Carries no totals on purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub cart_items: Vec<OrderItem>,
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_id: Option<i64>,
}

//--------------------------------------    OrderMetadata    ---------------------------------------------------------
/// The correlation data attached to a gateway session as an opaque string map, and read back during settlement to
/// reconstruct the order. The gateway stores and echoes it verbatim; it is the single source of truth when the
/// placeholder order was skipped or lost.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderMetadata {
    pub cart_items: Vec<OrderItem>,
    pub shipping: ShippingAddress,
    pub subtotal: Paise,
    pub tax: Paise,
    pub delivery_charge: Paise,
    pub total: Paise,
    pub customer_email: String,
    pub customer_id: Option<i64>,
}

const META_CART_ITEMS: &str = "cart_items";
const META_SHIPPING: &str = "shipping_details";
const META_SUBTOTAL: &str = "subtotal";
const META_TAX: &str = "tax";
const META_DELIVERY_CHARGE: &str = "delivery_charge";
const META_TOTAL: &str = "total_amount";
const META_CUSTOMER_EMAIL: &str = "customer_email";
const META_CUSTOMER_ID: &str = "customer_id";

impl OrderMetadata {
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(8);
        map.insert(META_CART_ITEMS.into(), serde_json::to_string(&self.cart_items).unwrap_or_else(|_| "[]".into()));
        map.insert(META_SHIPPING.into(), serde_json::to_string(&self.shipping).unwrap_or_else(|_| "{}".into()));
        map.insert(META_SUBTOTAL.into(), self.subtotal.value().to_string());
        map.insert(META_TAX.into(), self.tax.value().to_string());
        map.insert(META_DELIVERY_CHARGE.into(), self.delivery_charge.value().to_string());
        map.insert(META_TOTAL.into(), self.total.value().to_string());
        map.insert(META_CUSTOMER_EMAIL.into(), self.customer_email.clone());
        if let Some(id) = self.customer_id {
            map.insert(META_CUSTOMER_ID.into(), id.to_string());
        }
        map
    }

    /// Rebuilds the metadata from the map the gateway echoed back. A missing or unparsable cart or email makes the
    /// whole session unusable for settlement.
    pub fn parse(map: &HashMap<String, String>) -> Result<Self, String> {
        let raw_items = map.get(META_CART_ITEMS).ok_or_else(|| format!("'{META_CART_ITEMS}' is missing"))?;
        let cart_items: Vec<OrderItem> =
            serde_json::from_str(raw_items).map_err(|e| format!("'{META_CART_ITEMS}' is not valid JSON: {e}"))?;
        if cart_items.is_empty() {
            return Err(format!("'{META_CART_ITEMS}' is empty"));
        }
        let customer_email =
            map.get(META_CUSTOMER_EMAIL).ok_or_else(|| format!("'{META_CUSTOMER_EMAIL}' is missing"))?.clone();
        let shipping = map
            .get(META_SHIPPING)
            .map(|raw| serde_json::from_str(raw).map_err(|e| format!("'{META_SHIPPING}' is not valid JSON: {e}")))
            .transpose()?
            .unwrap_or_default();
        let money = |key: &str| -> Result<Paise, String> {
            map.get(key)
                .map(|raw| raw.parse::<i64>().map(Paise::from).map_err(|e| format!("'{key}' is not an amount: {e}")))
                .transpose()
                .map(Option::unwrap_or_default)
        };
        let subtotal = money(META_SUBTOTAL)?;
        let tax = money(META_TAX)?;
        let delivery_charge = money(META_DELIVERY_CHARGE)?;
        let total = money(META_TOTAL)?;
        let customer_id = map
            .get(META_CUSTOMER_ID)
            .map(|raw| raw.parse::<i64>().map_err(|e| format!("'{META_CUSTOMER_ID}' is not an id: {e}")))
            .transpose()?;
        Ok(Self { cart_items, shipping, subtotal, tax, delivery_charge, total, customer_email, customer_id })
    }
}
