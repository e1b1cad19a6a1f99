//! The pricing policy and the cart price calculator.
//!
//! Pricing is server-authoritative: the calculator in this module - never a
//! caller-supplied figure - is the source of truth for money. All arithmetic
//! uses [`rust_decimal::Decimal`], so pricing the same cart under the same
//! policy always produces identical totals.
//!
//! A cart is priced in two steps:
//!
//! 1. [`price_line`] - base contribution (`unit_price x quantity`) plus the
//!    extra-photo contribution for photos beyond the policy's included count.
//! 2. [`price_cart`] - sums line totals, resolves the quantity-discount tier
//!    for the cart's total quantity, and produces the final total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A quantity-based discount tier.
///
/// A cart whose total quantity falls within `[min_qty, max_qty]` receives
/// `discount_percent` off its subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub min_qty: u32,
    pub max_qty: u32,
    pub discount_percent: Decimal,
}

/// The store-wide pricing policy.
///
/// There is exactly one active policy; it is versioned by replacement and
/// each order records the version it was priced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Photos included in a line's base price.
    pub default_photo_count: u32,
    /// Price per photo beyond the included count.
    pub extra_photo_price: Decimal,
    /// Discount tiers in declaration order. On overlap, the first matching
    /// tier wins.
    pub discount_tiers: Vec<DiscountTier>,
    /// Optional cap on a single order's total quantity.
    pub max_qty_per_order: Option<u32>,
}

/// Validation failure for a pricing policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A discount tier is structurally invalid.
    #[error("invalid discount tier {index}: {reason}")]
    InvalidTier { index: usize, reason: String },

    /// The per-order quantity cap must admit at least one item.
    #[error("maxQtyPerOrder must be at least 1")]
    InvalidMaxQty,

    /// The extra-photo price cannot be negative.
    #[error("extraPhotoPrice cannot be negative")]
    NegativeExtraPhotoPrice,
}

impl PricingPolicy {
    /// Validate the policy's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if a tier has `min_qty > max_qty` or a
    /// negative discount, the quantity cap is zero, or the extra-photo
    /// price is negative.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.extra_photo_price < Decimal::ZERO {
            return Err(PolicyError::NegativeExtraPhotoPrice);
        }
        for (index, tier) in self.discount_tiers.iter().enumerate() {
            if tier.min_qty > tier.max_qty {
                return Err(PolicyError::InvalidTier {
                    index,
                    reason: "minQty cannot be greater than maxQty".to_string(),
                });
            }
            if tier.discount_percent < Decimal::ZERO {
                return Err(PolicyError::InvalidTier {
                    index,
                    reason: "discountPercent cannot be negative".to_string(),
                });
            }
        }
        if self.max_qty_per_order == Some(0) {
            return Err(PolicyError::InvalidMaxQty);
        }
        Ok(())
    }

    /// Resolve the discount tier for a cart's total quantity.
    ///
    /// Tiers are matched in declaration order; the first tier whose range
    /// contains `total_quantity` wins, which makes overlapping tiers
    /// deterministic. `None` means no discount.
    #[must_use]
    pub fn tier_for(&self, total_quantity: u32) -> Option<&DiscountTier> {
        self.discount_tiers
            .iter()
            .find(|t| t.min_qty <= total_quantity && total_quantity <= t.max_qty)
    }
}

/// One cart line as submitted for pricing (unit price already snapshotted
/// from the catalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub photo_count: u32,
}

/// The settled totals of a priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub sub_total: Decimal,
    pub discounted_amount: Decimal,
    pub final_price: Decimal,
}

/// Pricing failure for a line or cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A line quantity below 1.
    #[error("line quantity must be at least 1")]
    InvalidQuantity,

    /// The cart's total quantity exceeds the policy cap.
    #[error("total quantity {total} exceeds the per-order maximum of {max}")]
    QuantityExceeded { total: u32, max: u32 },
}

/// Price a single line under the given policy.
///
/// `line_total = unit_price x quantity
///             + max(0, photo_count - default_photo_count) x extra_photo_price`
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] if `quantity < 1`.
pub fn price_line(line: &CartLine, policy: &PricingPolicy) -> Result<Decimal, PricingError> {
    if line.quantity < 1 {
        return Err(PricingError::InvalidQuantity);
    }

    let base = line.unit_price * Decimal::from(line.quantity);
    let extra_photos = line.photo_count.saturating_sub(policy.default_photo_count);
    let extra = Decimal::from(extra_photos) * policy.extra_photo_price;

    Ok(base + extra)
}

/// Price a whole cart under the given policy.
///
/// Sums line totals into a subtotal, resolves the discount tier for the
/// cart's total quantity (first declared match wins; no match means zero
/// discount), and clamps the final price at zero.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] if any line has `quantity < 1`,
/// or [`PricingError::QuantityExceeded`] if the policy caps order quantity
/// and the cart exceeds it.
pub fn price_cart(lines: &[CartLine], policy: &PricingPolicy) -> Result<CartTotals, PricingError> {
    let mut sub_total = Decimal::ZERO;
    let mut total_quantity: u32 = 0;

    for line in lines {
        sub_total += price_line(line, policy)?;
        total_quantity = total_quantity.saturating_add(line.quantity);
    }

    if let Some(max) = policy.max_qty_per_order {
        if total_quantity > max {
            return Err(PricingError::QuantityExceeded {
                total: total_quantity,
                max,
            });
        }
    }

    let discounted_amount = policy.tier_for(total_quantity).map_or(Decimal::ZERO, |t| {
        sub_total * t.discount_percent / Decimal::ONE_HUNDRED
    });

    let final_price = (sub_total - discounted_amount).max(Decimal::ZERO);

    Ok(CartTotals {
        sub_total,
        discounted_amount,
        final_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    fn standard_policy() -> PricingPolicy {
        PricingPolicy {
            default_photo_count: 5,
            extra_photo_price: dec("2"),
            discount_tiers: vec![
                DiscountTier {
                    min_qty: 1,
                    max_qty: 9,
                    discount_percent: dec("0"),
                },
                DiscountTier {
                    min_qty: 10,
                    max_qty: 999,
                    discount_percent: dec("15"),
                },
            ],
            max_qty_per_order: Some(100),
        }
    }

    #[test]
    fn line_price_includes_extra_photos() {
        // 3 x 50 = 150, plus 3 photos over the included 5 at 2 each
        let line = CartLine {
            unit_price: dec("50"),
            quantity: 3,
            photo_count: 8,
        };
        let total = price_line(&line, &standard_policy()).expect("valid line");
        assert_eq!(total, dec("156"));
    }

    #[test]
    fn photos_within_default_cost_nothing() {
        let line = CartLine {
            unit_price: dec("100"),
            quantity: 10,
            photo_count: 5,
        };
        let total = price_line(&line, &standard_policy()).expect("valid line");
        assert_eq!(total, dec("1000"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let line = CartLine {
            unit_price: dec("100"),
            quantity: 0,
            photo_count: 0,
        };
        assert_eq!(
            price_line(&line, &standard_policy()),
            Err(PricingError::InvalidQuantity)
        );
    }

    #[test]
    fn line_price_is_monotonic_in_quantity_and_photos() {
        let policy = standard_policy();
        let mut previous = Decimal::ZERO;
        for quantity in 1..20 {
            let line = CartLine {
                unit_price: dec("7.50"),
                quantity,
                photo_count: 0,
            };
            let total = price_line(&line, &policy).expect("valid line");
            assert!(total > previous);
            previous = total;
        }

        previous = Decimal::ZERO;
        for photo_count in 6..20 {
            let line = CartLine {
                unit_price: dec("7.50"),
                quantity: 1,
                photo_count,
            };
            let total = price_line(&line, &policy).expect("valid line");
            assert!(total > previous);
            previous = total;
        }
    }

    #[test]
    fn cart_hits_fifteen_percent_tier() {
        // subTotal 1000, tier [10,999] at 15% -> 850
        let lines = vec![CartLine {
            unit_price: dec("100"),
            quantity: 10,
            photo_count: 5,
        }];
        let totals = price_cart(&lines, &standard_policy()).expect("valid cart");
        assert_eq!(totals.sub_total, dec("1000"));
        assert_eq!(totals.discounted_amount, dec("150"));
        assert_eq!(totals.final_price, dec("850"));
    }

    #[test]
    fn small_cart_gets_zero_discount_tier() {
        let lines = vec![CartLine {
            unit_price: dec("50"),
            quantity: 3,
            photo_count: 8,
        }];
        let totals = price_cart(&lines, &standard_policy()).expect("valid cart");
        assert_eq!(totals.sub_total, dec("156"));
        assert_eq!(totals.discounted_amount, dec("0"));
        assert_eq!(totals.final_price, dec("156"));
    }

    #[test]
    fn overlapping_tiers_resolve_to_first_declared() {
        let policy = PricingPolicy {
            default_photo_count: 0,
            extra_photo_price: dec("0"),
            discount_tiers: vec![
                DiscountTier {
                    min_qty: 1,
                    max_qty: 5,
                    discount_percent: dec("10"),
                },
                DiscountTier {
                    min_qty: 3,
                    max_qty: 8,
                    discount_percent: dec("20"),
                },
            ],
            max_qty_per_order: None,
        };

        // Quantity 4 is inside both ranges; first declaration wins, every time.
        for _ in 0..10 {
            let tier = policy.tier_for(4).expect("a tier matches");
            assert_eq!(tier.discount_percent, dec("10"));
        }

        let lines = vec![CartLine {
            unit_price: dec("10"),
            quantity: 4,
            photo_count: 0,
        }];
        let totals = price_cart(&lines, &policy).expect("valid cart");
        assert_eq!(totals.discounted_amount, dec("4"));
    }

    #[test]
    fn quantity_outside_every_tier_gets_no_discount() {
        let policy = standard_policy();
        let lines = vec![CartLine {
            unit_price: dec("1"),
            quantity: 1000,
            photo_count: 0,
        }];
        let policy = PricingPolicy {
            max_qty_per_order: None,
            ..policy
        };
        let totals = price_cart(&lines, &policy).expect("valid cart");
        assert_eq!(totals.discounted_amount, dec("0"));
        assert_eq!(totals.final_price, totals.sub_total);
    }

    #[test]
    fn cart_over_quantity_cap_is_rejected() {
        let lines = vec![CartLine {
            unit_price: dec("1"),
            quantity: 101,
            photo_count: 0,
        }];
        assert_eq!(
            price_cart(&lines, &standard_policy()),
            Err(PricingError::QuantityExceeded {
                total: 101,
                max: 100
            })
        );
    }

    #[test]
    fn totals_are_invariant_under_line_reordering() {
        let policy = standard_policy();
        let a = CartLine {
            unit_price: dec("19.99"),
            quantity: 2,
            photo_count: 7,
        };
        let b = CartLine {
            unit_price: dec("4.25"),
            quantity: 5,
            photo_count: 5,
        };
        let c = CartLine {
            unit_price: dec("120"),
            quantity: 3,
            photo_count: 11,
        };

        let forward = price_cart(&[a.clone(), b.clone(), c.clone()], &policy).expect("prices");
        let backward = price_cart(&[c, b, a], &policy).expect("prices");
        assert_eq!(forward, backward);
    }

    #[test]
    fn final_price_never_exceeds_sub_total() {
        let policy = standard_policy();
        for quantity in 1..40 {
            let lines = vec![CartLine {
                unit_price: dec("3.33"),
                quantity,
                photo_count: quantity,
            }];
            let totals = price_cart(&lines, &policy).expect("valid cart");
            assert!(totals.final_price <= totals.sub_total);
        }
    }

    #[test]
    fn discount_over_one_hundred_percent_clamps_to_zero() {
        let policy = PricingPolicy {
            default_photo_count: 0,
            extra_photo_price: dec("0"),
            discount_tiers: vec![DiscountTier {
                min_qty: 1,
                max_qty: 10,
                discount_percent: dec("150"),
            }],
            max_qty_per_order: None,
        };
        let lines = vec![CartLine {
            unit_price: dec("10"),
            quantity: 1,
            photo_count: 0,
        }];
        let totals = price_cart(&lines, &policy).expect("valid cart");
        assert_eq!(totals.final_price, Decimal::ZERO);
    }

    #[test]
    fn inverted_tier_fails_validation() {
        let policy = PricingPolicy {
            default_photo_count: 0,
            extra_photo_price: dec("0"),
            discount_tiers: vec![DiscountTier {
                min_qty: 9,
                max_qty: 3,
                discount_percent: dec("5"),
            }],
            max_qty_per_order: None,
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidTier { index: 0, .. })
        ));
    }

    #[test]
    fn zero_quantity_cap_fails_validation() {
        let policy = PricingPolicy {
            default_photo_count: 0,
            extra_photo_price: dec("0"),
            discount_tiers: vec![],
            max_qty_per_order: Some(0),
        };
        assert_eq!(policy.validate(), Err(PolicyError::InvalidMaxQty));
    }

    #[test]
    fn valid_policy_passes_validation() {
        assert_eq!(standard_policy().validate(), Ok(()));
    }
}
