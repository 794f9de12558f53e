use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skybook_shared::pii::Masked;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    Visa,
    Mastercard,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Visa => "VISA",
            CardType::Mastercard => "MASTERCARD",
        }
    }
}

impl FromStr for CardType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace(['_', ' '], "").as_str() {
            "VISA" => Ok(CardType::Visa),
            "MASTERCARD" => Ok(CardType::Mastercard),
            _ => Err(CoreError::validation("card_type", "must be VISA or MASTERCARD")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::Paypal => "PAYPAL",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace(['_', ' '], "").as_str() {
            "CREDITCARD" => Ok(PaymentMethod::CreditCard),
            "PAYPAL" => Ok(PaymentMethod::Paypal),
            _ => Err(CoreError::validation("method", "must be CREDIT_CARD or PAYPAL")),
        }
    }
}

/// Raw card details as submitted by the payer. Validated before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: Masked<String>,
    pub holder_name: Masked<String>,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub card_type: String,
    pub billing_address: String,
}

/// The single stored card of an account. Only the masked number is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub number_masked: String,
    pub holder_name: Masked<String>,
    pub expiry_date: NaiveDate,
    pub card_type: CardType,
    pub billing_address: String,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date <= today
    }
}

/// Payment request for one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub card: CardDetails,
    pub amount_nuc: i64,
    pub method: String,
    pub voucher_code: Option<String>,
}

/// At most one per booking; re-submission overwrites it in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub card_id: Uuid,
    pub amount_nuc: i64,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub voucher_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub transaction_id: String,
    pub base_amount_nuc: i64,
    pub charged_amount_nuc: i64,
    pub method: PaymentMethod,
    pub card_number_masked: String,
}
