use chrono::Utc;
use skybook_catalog::VoucherEngine;
use skybook_core::booking::BookingStatus;
use skybook_core::identity::AuthContext;
use skybook_core::payment::{Card, CardDetails, Payment, PaymentMethod, PaymentReceipt, PaymentRequest};
use skybook_core::repository::{BookingRepository, CardRepository, PaymentRepository};
use skybook_core::{CoreError, CoreResult};
use skybook_shared::models::BookingEvent;
use skybook_shared::pii::Masked;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::policy::BookingPolicy;
use crate::validation;

/// Records simulated card payments: one payment per booking, one card per account.
pub struct PaymentRecorder {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    cards: Arc<dyn CardRepository>,
    vouchers: VoucherEngine,
    policy: BookingPolicy,
    events: broadcast::Sender<BookingEvent>,
}

impl PaymentRecorder {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        cards: Arc<dyn CardRepository>,
        vouchers: VoucherEngine,
        policy: BookingPolicy,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        Self {
            bookings,
            payments,
            cards,
            vouchers,
            policy,
            events,
        }
    }

    pub async fn record_payment(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        request: PaymentRequest,
    ) -> CoreResult<PaymentReceipt> {
        // 1. Caller must own a booking that can still be paid
        let caller = auth.caller()?;
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;

        if !booking.is_owned_by(caller.account_id) {
            warn!(
                "Account {} attempted to pay for booking {} it does not own",
                caller.account_id, booking_id
            );
            return Err(CoreError::PermissionDenied(format!(
                "booking {} belongs to another account",
                booking_id
            )));
        }
        if booking.status == BookingStatus::Canceled {
            return Err(CoreError::InvalidStateTransition {
                from: booking.status.to_string(),
                to: "PAID".to_string(),
            });
        }

        // 2. Validate everything before any write
        let today = Utc::now().date_naive();
        let card = validation::validate_card(&request.card, today, &self.policy)?;
        let method: PaymentMethod = request.method.parse()?;
        validation::validate_amount(request.amount_nuc)?;

        // 3. Optional voucher
        let voucher_code = request
            .voucher_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);
        let charged_nuc = match &voucher_code {
            Some(code) => {
                self.vouchers
                    .price_with_voucher(request.amount_nuc, code, today)
                    .await?
            }
            None => request.amount_nuc,
        };

        // 4. Stamp a unique transaction id
        let transaction_id = self.next_transaction_id().await?;

        // 5. Upsert the payer's card, then the booking's payment
        let now = Utc::now();
        let stored_card = self
            .cards
            .upsert_card(Card {
                id: Uuid::new_v4(),
                owner_account_id: caller.account_id,
                number_masked: card.number_masked,
                holder_name: Masked(card.holder_name),
                expiry_date: card.expiry_date,
                card_type: card.card_type,
                billing_address: card.billing_address,
                updated_at: now,
            })
            .await?;

        let payment = self
            .payments
            .upsert_payment(Payment {
                id: Uuid::new_v4(),
                booking_id,
                card_id: stored_card.id,
                amount_nuc: charged_nuc,
                method,
                transaction_id,
                voucher_code,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            "Payment {} recorded for booking {}: {} NUC via {} ({})",
            payment.id,
            booking_id,
            payment.amount_nuc,
            method.as_str(),
            payment.transaction_id
        );
        let _ = self.events.send(BookingEvent::PaymentRecorded {
            booking_id,
            payment_id: payment.id,
            transaction_id: payment.transaction_id.clone(),
            amount_nuc: payment.amount_nuc,
            timestamp: now.timestamp(),
        });

        Ok(PaymentReceipt {
            payment_id: payment.id,
            booking_id,
            transaction_id: payment.transaction_id,
            base_amount_nuc: request.amount_nuc,
            charged_amount_nuc: payment.amount_nuc,
            method,
            card_number_masked: stored_card.number_masked,
        })
    }

    /// Pays each leg of a purchase in turn. A failure after the first leg is reported as
    /// `IncompletePurchase`; legs already paid stay paid.
    pub async fn record_purchase_payments(
        &self,
        auth: &AuthContext,
        legs: &[(Uuid, i64)],
        card: &CardDetails,
        method: &str,
    ) -> CoreResult<Vec<PaymentReceipt>> {
        let mut receipts: Vec<PaymentReceipt> = Vec::with_capacity(legs.len());

        for (booking_id, amount_nuc) in legs {
            let request = PaymentRequest {
                card: card.clone(),
                amount_nuc: *amount_nuc,
                method: method.to_string(),
                voucher_code: None,
            };

            match self.record_payment(auth, *booking_id, request).await {
                Ok(receipt) => receipts.push(receipt),
                Err(err) if receipts.is_empty() => return Err(err),
                Err(err) => {
                    warn!(
                        "Purchase left incomplete: booking {} failed after {} paid leg(s): {}",
                        booking_id,
                        receipts.len(),
                        err
                    );
                    return Err(CoreError::IncompletePurchase {
                        paid: receipts.iter().map(|r| r.booking_id).collect(),
                        failed_booking: *booking_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(receipts)
    }

    async fn next_transaction_id(&self) -> CoreResult<String> {
        for _ in 0..self.policy.transaction_id_attempts.max(1) {
            let candidate = format!("TXN-{}", Uuid::new_v4().simple()).to_uppercase();
            if !self.payments.transaction_exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!("Transaction id {} already taken, drawing again", candidate);
        }
        Err(CoreError::InternalError(
            "could not allocate a unique transaction id".to_string(),
        ))
    }
}
