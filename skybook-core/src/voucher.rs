use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Either a fixed amount off or a percentage off, never both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherDiscount {
    Amount { amount_nuc: i64 },
    Percentage { percent: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Voucher {
    pub code: String,
    pub description: String,
    pub remaining_quantity: u32,
    pub discount: VoucherDiscount,
    pub expiry_date: NaiveDate,
}

impl Voucher {
    /// Redeemable while stock remains and the expiry day has not passed.
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.remaining_quantity > 0 && today <= self.expiry_date
    }

    /// Discount in NUC for `base_nuc`. Percentages floor to the whole unit.
    pub fn calculate_discount(&self, base_nuc: i64) -> i64 {
        match self.discount {
            VoucherDiscount::Percentage { percent } => {
                let discount = i128::from(base_nuc) * i128::from(percent) / 100;
                i64::try_from(discount).unwrap_or(if discount < 0 { i64::MIN } else { i64::MAX })
            }
            VoucherDiscount::Amount { amount_nuc } => amount_nuc,
        }
    }

    /// Base price after the discount, never below zero.
    pub fn discounted_price(&self, base_nuc: i64) -> i64 {
        base_nuc.saturating_sub(self.calculate_discount(base_nuc)).max(0)
    }
}
