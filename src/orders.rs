//! Order records for the external display panel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

/// One order row shown by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub item: String,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

/// Fixed, in-memory order dataset.
///
/// The reply evaluator does not query this per-utterance today; wiring
/// order lookups into intent handling is an extension point.
#[derive(Debug, Clone, Default)]
pub struct StaticOrderDirectory;

impl crate::runtime::OrderDirectory for StaticOrderDirectory {
    fn orders(&self) -> Vec<OrderRecord> {
        fn record(order_id: &str, item: &str, status: OrderStatus, days_ago: i64) -> OrderRecord {
            OrderRecord {
                order_id: order_id.to_string(),
                item: item.to_string(),
                status,
                placed_at: Utc::now() - chrono::Duration::days(days_ago),
            }
        }

        vec![
            record("SB-10041", "Trail running shoes", OrderStatus::Shipped, 3),
            record("SB-10038", "Insulated water bottle", OrderStatus::Delivered, 9),
            record("SB-10049", "Wool hiking socks (3-pack)", OrderStatus::Processing, 1),
        ]
    }
}
