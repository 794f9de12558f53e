use async_trait::async_trait;
use chrono::NaiveDate;
use skybook_core::repository::VoucherRepository;
use skybook_core::voucher::{Voucher, VoucherDiscount};
use skybook_core::{CoreError, CoreResult};
use sqlx::PgPool;

use crate::database::{db_error, seats_value};

pub struct StoreVoucherRepository {
    pool: PgPool,
}

impl StoreVoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const VOUCHER_COLUMNS: &str =
    "code, description, remaining_quantity, discount_amount_nuc, discount_percentage, expiry_date";

#[derive(sqlx::FromRow)]
struct VoucherRow {
    code: String,
    description: String,
    remaining_quantity: i32,
    discount_amount_nuc: Option<i64>,
    discount_percentage: Option<i32>,
    expiry_date: NaiveDate,
}

impl TryFrom<VoucherRow> for Voucher {
    type Error = CoreError;

    fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
        let discount = match (row.discount_percentage, row.discount_amount_nuc) {
            (Some(percent), None) => VoucherDiscount::Percentage {
                percent: u32::try_from(percent).map_err(|_| {
                    CoreError::InternalError(format!("voucher {} has a negative percentage", row.code))
                })?,
            },
            (None, Some(amount_nuc)) => VoucherDiscount::Amount { amount_nuc },
            _ => {
                return Err(CoreError::InternalError(format!(
                    "voucher {} must carry exactly one discount",
                    row.code
                )))
            }
        };

        Ok(Voucher {
            code: row.code,
            description: row.description,
            remaining_quantity: seats_value(row.remaining_quantity),
            discount,
            expiry_date: row.expiry_date,
        })
    }
}

#[async_trait]
impl VoucherRepository for StoreVoucherRepository {
    async fn redeem(&self, code: &str, today: NaiveDate) -> CoreResult<Voucher> {
        let row = sqlx::query_as::<_, VoucherRow>(&format!(
            r#"
            UPDATE vouchers
            SET remaining_quantity = remaining_quantity - 1
            WHERE code = $1 AND remaining_quantity > 0 AND expiry_date >= $2
            RETURNING {}
            "#,
            VOUCHER_COLUMNS
        ))
        .bind(code)
        .bind(today)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = row {
            return row.try_into();
        }

        // Explain the refusal
        let reason = match self.get(code).await? {
            None => format!("unknown voucher '{}'", code),
            Some(v) if v.remaining_quantity == 0 => format!("voucher '{}' is exhausted", code),
            Some(_) => format!("voucher '{}' has expired", code),
        };
        Err(CoreError::VoucherInvalid(reason))
    }

    async fn get(&self, code: &str) -> CoreResult<Option<Voucher>> {
        sqlx::query_as::<_, VoucherRow>(&format!(
            "SELECT {} FROM vouchers WHERE code = $1",
            VOUCHER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Voucher::try_from)
        .transpose()
    }
}
