//! Enums describing how an order is fulfilled and paid.

use serde::{Deserialize, Serialize};

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(type_name = "TEXT", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Courier delivery to a customer address.
    Delivery,
    /// Customer collects the order at the restaurant.
    Pickup,
}

impl DeliveryType {
    /// Stable storage/callback key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        }
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            _ => Err(format!("invalid delivery type: {s}")),
        }
    }
}

/// How the customer intends to pay.
///
/// Informational only; no payment is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(type_name = "TEXT", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment on receipt.
    Card,
    /// Cash payment; the courier brings change.
    Cash,
    /// No payment step was shown (pickup orders by default).
    #[default]
    Unspecified,
}

impl PaymentMethod {
    /// Stable storage/callback key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Order listing direction for the review surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Most recent order first.
    #[default]
    NewestFirst,
    /// Oldest order first.
    OldestFirst,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(Self::NewestFirst),
            "oldest" | "asc" => Ok(Self::OldestFirst),
            _ => Err(format!("invalid sort direction: {s}")),
        }
    }
}
