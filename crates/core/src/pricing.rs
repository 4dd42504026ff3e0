//! Delivery pricing policy.

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryType, Price, PriceError};

/// Errors raised by the pricing rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Cart total is below the delivery minimum.
    #[error("minimum order for delivery is {minimum}")]
    BelowDeliveryMinimum {
        /// Configured minimum.
        minimum: Price,
    },
    /// Cash amount could not be parsed.
    #[error(transparent)]
    InvalidAmount(#[from] PriceError),
    /// Cash amount is below the configured minimum.
    #[error("cash amount must be at least {minimum}")]
    CashBelowMinimum {
        /// Configured minimum.
        minimum: Price,
    },
}

/// Thresholds and fees that decide what delivery costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub min_order_for_delivery: Price,
    pub free_delivery_min: Price,
    pub flat_delivery_fee: Price,
    pub min_cash_amount: Price,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            min_order_for_delivery: Price::new(1000),
            free_delivery_min: Price::new(2000),
            flat_delivery_fee: Price::new(200),
            min_cash_amount: Price::new(500),
        }
    }
}

impl DeliveryPolicy {
    /// Fee for the given fulfillment type and cart subtotal.
    #[must_use]
    pub fn delivery_cost(&self, delivery_type: DeliveryType, subtotal: Price) -> Price {
        match delivery_type {
            DeliveryType::Pickup => Price::ZERO,
            DeliveryType::Delivery if subtotal >= self.free_delivery_min => Price::ZERO,
            DeliveryType::Delivery => self.flat_delivery_fee,
        }
    }

    /// Check that the subtotal allows courier delivery.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::BelowDeliveryMinimum`] when the cart is too small.
    pub fn check_delivery_allowed(&self, subtotal: Price) -> Result<(), PricingError> {
        if subtotal < self.min_order_for_delivery {
            return Err(PricingError::BelowDeliveryMinimum {
                minimum: self.min_order_for_delivery,
            });
        }
        Ok(())
    }

    /// Parse and validate the amount a cash-paying customer will hand over.
    ///
    /// # Errors
    ///
    /// Returns an error for non-digit input or an amount below the minimum.
    pub fn validate_cash(&self, input: &str) -> Result<Price, PricingError> {
        let amount = Price::parse_digits(input)?;
        if amount < self.min_cash_amount {
            return Err(PricingError::CashBelowMinimum {
                minimum: self.min_cash_amount,
            });
        }
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_is_always_free() {
        let policy = DeliveryPolicy::default();
        assert_eq!(
            policy.delivery_cost(DeliveryType::Pickup, Price::new(10)),
            Price::ZERO
        );
    }

    #[test]
    fn test_delivery_fee_threshold() {
        let policy = DeliveryPolicy::default();
        assert_eq!(
            policy.delivery_cost(DeliveryType::Delivery, Price::new(1999)),
            Price::new(200)
        );
        assert_eq!(
            policy.delivery_cost(DeliveryType::Delivery, Price::new(2000)),
            Price::ZERO
        );
    }

    #[test]
    fn test_delivery_minimum() {
        let policy = DeliveryPolicy::default();
        assert!(matches!(
            policy.check_delivery_allowed(Price::new(999)),
            Err(PricingError::BelowDeliveryMinimum { .. })
        ));
        assert!(policy.check_delivery_allowed(Price::new(1000)).is_ok());
    }

    #[test]
    fn test_cash_minimum() {
        let policy = DeliveryPolicy::default();
        assert_eq!(
            policy.validate_cash("100"),
            Err(PricingError::CashBelowMinimum {
                minimum: Price::new(500)
            })
        );
        assert_eq!(policy.validate_cash("500"), Ok(Price::new(500)));
        assert!(matches!(
            policy.validate_cash("five hundred"),
            Err(PricingError::InvalidAmount(_))
        ));
    }
}
