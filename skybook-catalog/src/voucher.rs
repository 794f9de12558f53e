use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use skybook_core::repository::VoucherRepository;
use skybook_core::voucher::{Voucher, VoucherDiscount};
use skybook_core::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Prices a base fare with a voucher, consuming one unit of the voucher's stock.
#[derive(Clone)]
pub struct VoucherEngine {
    vouchers: Arc<dyn VoucherRepository>,
}

impl VoucherEngine {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    /// Returns the discounted amount. Unknown, expired and exhausted codes are rejected
    /// with `VoucherInvalid` before any stock is consumed.
    pub async fn price_with_voucher(
        &self,
        base_nuc: i64,
        code: &str,
        today: NaiveDate,
    ) -> CoreResult<i64> {
        if base_nuc < 0 {
            return Err(CoreError::validation("amount", "must not be negative"));
        }

        let voucher = self.vouchers.redeem(code.trim(), today).await?;
        let discounted = voucher.discounted_price(base_nuc);

        info!(
            "Voucher {} applied: {} -> {} NUC ({} left)",
            voucher.code, base_nuc, discounted, voucher.remaining_quantity
        );

        Ok(discounted)
    }
}

/// In-memory voucher stock keyed by code.
pub struct InMemoryVoucherBook {
    vouchers: Mutex<HashMap<String, Voucher>>,
}

impl InMemoryVoucherBook {
    pub fn new() -> Self {
        Self {
            vouchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, voucher: Voucher) -> CoreResult<()> {
        match voucher.discount {
            VoucherDiscount::Percentage { percent } if percent > 100 => {
                return Err(CoreError::validation("discount_percentage", "must be at most 100"));
            }
            VoucherDiscount::Amount { amount_nuc } if amount_nuc < 0 => {
                return Err(CoreError::validation("discount_amount", "must not be negative"));
            }
            _ => {}
        }
        self.vouchers.lock().insert(voucher.code.clone(), voucher);
        Ok(())
    }
}

impl Default for InMemoryVoucherBook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoucherRepository for InMemoryVoucherBook {
    async fn redeem(&self, code: &str, today: NaiveDate) -> CoreResult<Voucher> {
        let mut vouchers = self.vouchers.lock();
        let voucher = vouchers
            .get_mut(code)
            .ok_or_else(|| CoreError::VoucherInvalid(format!("unknown voucher '{}'", code)))?;

        if !voucher.is_valid(today) {
            let reason = if voucher.remaining_quantity == 0 { "is exhausted" } else { "has expired" };
            return Err(CoreError::VoucherInvalid(format!("voucher '{}' {}", code, reason)));
        }

        voucher.remaining_quantity -= 1;
        Ok(voucher.clone())
    }

    async fn get(&self, code: &str) -> CoreResult<Option<Voucher>> {
        Ok(self.vouchers.lock().get(code).cloned())
    }
}
