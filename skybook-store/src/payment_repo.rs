use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skybook_core::payment::{Card, Payment};
use skybook_core::repository::{CardRepository, PaymentRepository};
use skybook_core::{CoreError, CoreResult};
use skybook_shared::pii::Masked;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

/// Payments and cards. Both tables are written with `ON CONFLICT` upserts keyed on the
/// booking and the owning account respectively.
pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PAYMENT_COLUMNS: &str =
    "id, booking_id, card_id, amount_nuc, method, transaction_id, voucher_code, created_at, updated_at";

const CARD_COLUMNS: &str =
    "id, owner_account_id, number_masked, holder_name, expiry_date, card_type, billing_address, updated_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    card_id: Uuid,
    amount_nuc: i64,
    method: String,
    transaction_id: String,
    voucher_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            card_id: row.card_id,
            amount_nuc: row.amount_nuc,
            method: row
                .method
                .parse()
                .map_err(|_| CoreError::InternalError(format!("stored payment method '{}'", row.method)))?,
            transaction_id: row.transaction_id,
            voucher_code: row.voucher_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    owner_account_id: Uuid,
    number_masked: String,
    holder_name: String,
    expiry_date: NaiveDate,
    card_type: String,
    billing_address: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = CoreError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        Ok(Card {
            id: row.id,
            owner_account_id: row.owner_account_id,
            number_masked: row.number_masked,
            holder_name: Masked(row.holder_name),
            expiry_date: row.expiry_date,
            card_type: row
                .card_type
                .parse()
                .map_err(|_| CoreError::InternalError(format!("stored card type '{}'", row.card_type)))?,
            billing_address: row.billing_address,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn upsert_payment(&self, payment: Payment) -> CoreResult<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (booking_id) DO UPDATE
            SET card_id = EXCLUDED.card_id,
                amount_nuc = EXCLUDED.amount_nuc,
                method = EXCLUDED.method,
                transaction_id = EXCLUDED.transaction_id,
                voucher_code = EXCLUDED.voucher_code,
                updated_at = NOW()
            RETURNING {cols}
            "#,
            cols = PAYMENT_COLUMNS
        ))
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.card_id)
        .bind(payment.amount_nuc)
        .bind(payment.method.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.voucher_code)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        row.try_into()
    }

    async fn get_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE booking_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Payment::try_from)
        .transpose()
    }

    async fn transaction_exists(&self, transaction_id: &str) -> CoreResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payments WHERE transaction_id = $1)")
            .bind(transaction_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}

#[async_trait]
impl CardRepository for StorePaymentRepository {
    async fn upsert_card(&self, card: Card) -> CoreResult<Card> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            r#"
            INSERT INTO cards ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_account_id) DO UPDATE
            SET number_masked = EXCLUDED.number_masked,
                holder_name = EXCLUDED.holder_name,
                expiry_date = EXCLUDED.expiry_date,
                card_type = EXCLUDED.card_type,
                billing_address = EXCLUDED.billing_address,
                updated_at = NOW()
            RETURNING {cols}
            "#,
            cols = CARD_COLUMNS
        ))
        .bind(card.id)
        .bind(card.owner_account_id)
        .bind(&card.number_masked)
        .bind(card.holder_name.expose())
        .bind(card.expiry_date)
        .bind(card.card_type.as_str())
        .bind(&card.billing_address)
        .bind(card.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        row.try_into()
    }

    async fn get_by_owner(&self, account_id: Uuid) -> CoreResult<Option<Card>> {
        sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {} FROM cards WHERE owner_account_id = $1",
            CARD_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Card::try_from)
        .transpose()
    }
}
