use chrono::{Datelike, NaiveDate};
use skybook_core::booking::{BookingRequest, ContactInfo, Passenger};
use skybook_core::payment::{CardDetails, CardType};
use skybook_core::{CoreError, CoreResult};
use skybook_shared::pii::mask_card_number;

use crate::policy::BookingPolicy;

const MAX_NAME_LEN: usize = 255;

/// Card details that passed every rule, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCard {
    pub card_type: CardType,
    pub expiry_date: NaiveDate,
    pub number_masked: String,
    pub holder_name: String,
    pub billing_address: String,
}

/// Leg count, seat quantity and manifest size.
pub fn validate_itinerary(request: &BookingRequest, policy: &BookingPolicy) -> CoreResult<()> {
    match request.legs.len() {
        1 => {}
        2 => {
            if request.legs[0] == request.legs[1] {
                return Err(CoreError::validation(
                    "legs",
                    "return leg must use a different fare class than the outbound leg",
                ));
            }
        }
        n => {
            return Err(CoreError::validation(
                "legs",
                format!("a booking covers one or two legs, got {}", n),
            ))
        }
    }

    if request.seat_quantity == 0 {
        return Err(CoreError::validation("seat_quantity", "must be at least 1"));
    }
    if request.seat_quantity > policy.max_seats_per_booking {
        return Err(CoreError::validation(
            "seat_quantity",
            format!("must be at most {}", policy.max_seats_per_booking),
        ));
    }
    if request.passengers.len() != request.seat_quantity as usize {
        return Err(CoreError::validation(
            "passengers",
            format!(
                "expected {} passengers, got {}",
                request.seat_quantity,
                request.passengers.len()
            ),
        ));
    }

    Ok(())
}

/// Every passenger on the manifest. Travel documents are mandatory when `international`.
pub fn validate_manifest(
    passengers: &[Passenger],
    international: bool,
    today: NaiveDate,
) -> CoreResult<()> {
    for (index, passenger) in passengers.iter().enumerate() {
        validate_passenger(index, passenger, international, today)?;
    }
    Ok(())
}

fn validate_passenger(
    index: usize,
    passenger: &Passenger,
    international: bool,
    today: NaiveDate,
) -> CoreResult<()> {
    let field = |name: &str| format!("passengers[{}].{}", index, name);

    validate_name(&field("first_name"), &passenger.first_name)?;
    validate_name(&field("last_name"), &passenger.last_name)?;

    if passenger.date_of_birth > today {
        return Err(CoreError::validation(field("date_of_birth"), "must not be in the future"));
    }

    match &passenger.document {
        None if international => Err(CoreError::validation(
            field("passport_number"),
            "required for international travel",
        )),
        None => Ok(()),
        Some(document) => {
            let number = document.passport_number.trim();
            if !(6..=20).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(CoreError::validation(
                    field("passport_number"),
                    "must be 6 to 20 letters or digits",
                ));
            }
            if document.nationality.trim().is_empty() {
                return Err(CoreError::validation(field("nationality"), "must not be empty"));
            }
            if document.expiry_date <= today {
                return Err(CoreError::validation(field("passport_expiry"), "passport has expired"));
            }
            Ok(())
        }
    }
}

fn validate_name(field: &str, value: &str) -> CoreResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::validation(
            field,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '\'' || c == '-')
    {
        return Err(CoreError::validation(field, "may only contain letters, spaces, apostrophes and hyphens"));
    }
    Ok(())
}

pub fn validate_contact(contact: &ContactInfo) -> CoreResult<()> {
    let phone = contact.phone_number.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !(8..=20).contains(&phone.len()) || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(
            "phone_number",
            "must be 8 to 20 digits with an optional leading +",
        ));
    }

    let email = contact.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid_email {
        return Err(CoreError::validation("email", "must be a valid email address"));
    }

    Ok(())
}

/// Upper bound on a single payment, in NUC.
pub const MAX_AMOUNT_NUC: i64 = 1_000_000_000_000_000;

pub fn validate_amount(amount_nuc: i64) -> CoreResult<()> {
    if amount_nuc <= 0 {
        return Err(CoreError::validation("amount", "must be greater than zero"));
    }
    if amount_nuc > MAX_AMOUNT_NUC {
        return Err(CoreError::validation(
            "amount",
            format!("must not exceed {}", MAX_AMOUNT_NUC),
        ));
    }
    Ok(())
}

/// Card rules in order; the first violated rule is reported.
pub fn validate_card(
    card: &CardDetails,
    today: NaiveDate,
    policy: &BookingPolicy,
) -> CoreResult<ValidatedCard> {
    let number: String = card.number.expose().chars().filter(|c| *c != ' ').collect();
    if !(13..=16).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation("card_number", "must be 13 to 16 digits"));
    }

    let holder_name = card.holder_name.expose().trim();
    if holder_name.is_empty()
        || holder_name.chars().count() > MAX_NAME_LEN
        || !holder_name.chars().all(|c| c.is_alphabetic() || c == ' ')
    {
        return Err(CoreError::validation("cardholder_name", "may only contain letters and spaces"));
    }

    if !(1..=12).contains(&card.expiry_month) {
        return Err(CoreError::validation("expiry_month", "must be between 1 and 12"));
    }

    let current_year = today.year();
    let last_year = current_year + policy.card_expiry_window_years;
    if card.expiry_year < current_year || card.expiry_year > last_year {
        return Err(CoreError::validation(
            "expiry_year",
            format!("must be between {} and {}", current_year, last_year),
        ));
    }

    let expiry_date = last_day_of_month(card.expiry_year, card.expiry_month)
        .ok_or_else(|| CoreError::validation("expiry_date", "is not a valid date"))?;
    if expiry_date <= today {
        return Err(CoreError::validation("expiry_date", "card has expired"));
    }

    let card_type: CardType = card.card_type.parse()?;

    let billing_address = card.billing_address.trim();
    if billing_address.is_empty() {
        return Err(CoreError::validation("billing_address", "must not be empty"));
    }

    Ok(ValidatedCard {
        card_type,
        expiry_date,
        number_masked: mask_card_number(&number),
        holder_name: holder_name.to_string(),
        billing_address: billing_address.to_string(),
    })
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybook_core::booking::TravelDocument;
    use skybook_core::inventory::FareClassRef;
    use skybook_shared::pii::Masked;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 5, 20).unwrap()
    }

    fn passenger() -> Passenger {
        Passenger {
            first_name: "Ada".to_string(),
            last_name: "O'Neil-Smith".to_string(),
            gender: None,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            document: None,
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            phone_number: "+441234567890".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            number: Masked("4111 1111 1111 1111".to_string()),
            holder_name: Masked("Ada Lovelace".to_string()),
            expiry_month: 8,
            expiry_year: 2032,
            card_type: "Visa".to_string(),
            billing_address: "12 Analytical Row".to_string(),
        }
    }

    fn request(legs: usize, seats: u32, passengers: usize) -> BookingRequest {
        BookingRequest {
            legs: (0..legs)
                .map(|_| FareClassRef::new(Uuid::new_v4(), "ECONOMY"))
                .collect(),
            seat_quantity: seats,
            passengers: vec![passenger(); passengers],
            contact: contact(),
        }
    }

    fn field_of(err: CoreError) -> String {
        match err {
            CoreError::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_itinerary_shape() {
        let policy = BookingPolicy::default();
        assert!(validate_itinerary(&request(1, 2, 2), &policy).is_ok());
        assert!(validate_itinerary(&request(2, 1, 1), &policy).is_ok());

        assert_eq!(field_of(validate_itinerary(&request(0, 1, 1), &policy).unwrap_err()), "legs");
        assert_eq!(field_of(validate_itinerary(&request(3, 1, 1), &policy).unwrap_err()), "legs");
        assert_eq!(
            field_of(validate_itinerary(&request(1, 0, 0), &policy).unwrap_err()),
            "seat_quantity"
        );
        assert_eq!(
            field_of(validate_itinerary(&request(1, 10, 10), &policy).unwrap_err()),
            "seat_quantity"
        );
        assert_eq!(
            field_of(validate_itinerary(&request(1, 2, 1), &policy).unwrap_err()),
            "passengers"
        );
    }

    #[test]
    fn test_round_trip_on_same_fare_class_is_rejected() {
        let mut req = request(2, 1, 1);
        req.legs[1] = req.legs[0].clone();
        assert_eq!(
            field_of(validate_itinerary(&req, &BookingPolicy::default()).unwrap_err()),
            "legs"
        );
    }

    #[test]
    fn test_passport_only_required_when_international() {
        let manifest = vec![passenger()];
        assert!(validate_manifest(&manifest, false, today()).is_ok());
        assert_eq!(
            field_of(validate_manifest(&manifest, true, today()).unwrap_err()),
            "passengers[0].passport_number"
        );

        let mut with_passport = passenger();
        with_passport.document = Some(TravelDocument {
            passport_number: "X1234567".to_string(),
            nationality: "British".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2035, 1, 1).unwrap(),
        });
        assert!(validate_manifest(&[with_passport.clone()], true, today()).is_ok());

        with_passport.document.as_mut().unwrap().expiry_date = today();
        assert_eq!(
            field_of(validate_manifest(&[with_passport], true, today()).unwrap_err()),
            "passengers[0].passport_expiry"
        );
    }

    #[test]
    fn test_passenger_name_and_birth_date() {
        let mut bad_name = passenger();
        bad_name.first_name = "R2D2".to_string();
        assert_eq!(
            field_of(validate_manifest(&[bad_name], false, today()).unwrap_err()),
            "passengers[0].first_name"
        );

        let mut unborn = passenger();
        unborn.date_of_birth = NaiveDate::from_ymd_opt(2031, 1, 1).unwrap();
        assert_eq!(
            field_of(validate_manifest(&[passenger(), unborn], false, today()).unwrap_err()),
            "passengers[1].date_of_birth"
        );
    }

    #[test]
    fn test_contact_rules() {
        assert!(validate_contact(&contact()).is_ok());

        let mut c = contact();
        c.phone_number = "12-34".to_string();
        assert_eq!(field_of(validate_contact(&c).unwrap_err()), "phone_number");

        let mut c = contact();
        c.phone_number = "123456789012345678901".to_string();
        assert_eq!(field_of(validate_contact(&c).unwrap_err()), "phone_number");

        for email in ["ada.example.com", "@example.com", "ada@example", "ada@.com"] {
            let mut c = contact();
            c.email = email.to_string();
            assert_eq!(field_of(validate_contact(&c).unwrap_err()), "email", "{}", email);
        }
    }

    #[test]
    fn test_valid_card_is_masked() {
        let validated = validate_card(&card(), today(), &BookingPolicy::default()).unwrap();
        assert_eq!(validated.card_type, CardType::Visa);
        assert_eq!(validated.number_masked, "**** **** **** 1111");
        assert_eq!(validated.expiry_date, NaiveDate::from_ymd_opt(2032, 8, 31).unwrap());
    }

    #[test]
    fn test_card_rules_report_first_violation() {
        let policy = BookingPolicy::default();

        let mut c = card();
        c.number = Masked("4111-1111".to_string());
        c.expiry_month = 13;
        assert_eq!(field_of(validate_card(&c, today(), &policy).unwrap_err()), "card_number");

        let mut c = card();
        c.holder_name = Masked("Ada L0velace".to_string());
        assert_eq!(field_of(validate_card(&c, today(), &policy).unwrap_err()), "cardholder_name");

        let mut c = card();
        c.expiry_month = 0;
        assert_eq!(field_of(validate_card(&c, today(), &policy).unwrap_err()), "expiry_month");

        let mut c = card();
        c.expiry_year = 2041;
        assert_eq!(field_of(validate_card(&c, today(), &policy).unwrap_err()), "expiry_year");

        let mut c = card();
        c.card_type = "Amex".to_string();
        assert_eq!(field_of(validate_card(&c, today(), &policy).unwrap_err()), "card_type");
    }

    #[test]
    fn test_card_expiring_this_month_is_still_valid() {
        let mut c = card();
        c.expiry_year = 2030;
        c.expiry_month = 5;
        assert!(validate_card(&c, today(), &BookingPolicy::default()).is_ok());

        c.expiry_month = 4;
        assert_eq!(
            field_of(validate_card(&c, today(), &BookingPolicy::default()).unwrap_err()),
            "expiry_date"
        );
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-5).is_err());
        assert!(validate_amount(MAX_AMOUNT_NUC).is_ok());
        assert!(validate_amount(MAX_AMOUNT_NUC + 1).is_err());
        assert!(validate_amount(i64::MAX).is_err());
    }
}
