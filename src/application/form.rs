use crate::domain::card::{
    CardBrand, card_type, format_card_number, normalize_digits, validate_card_number,
    validate_cvv,
};
use crate::domain::form::{CardFields, FieldErrors, FieldName, WizardStep};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

pub const INVALID_CARD_NUMBER: &str = "Invalid card number";
pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";
pub const AMOUNT_TOO_PRECISE: &str = "Amount must have at most 2 decimals";
pub const AMOUNT_TOO_LARGE: &str = "Amount is too large";
pub const INVALID_MONTH: &str = "Invalid month";
pub const CARD_EXPIRED: &str = "Card expired";
pub const INSECURE_CVV: &str =
    "Invalid or insecure CVV (avoid sequences like 123 or repeated digits)";
pub const INVALID_PHONE: &str = "Phone must have 8 digits";

const STEP_TWO_FIELDS: [FieldName; 3] =
    [FieldName::HolderName, FieldName::PhoneDigits, FieldName::Amount];
const STEP_THREE_FIELDS: [FieldName; 3] =
    [FieldName::CardNumberDisplay, FieldName::Expiry, FieldName::Cvv];

/// The three-step payment wizard.
///
/// Owns the session's field values, their per-field errors and the current
/// step. Validity is derived on demand, so it always reflects the latest
/// update.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    fields: CardFields,
    errors: FieldErrors,
    step: WizardStep,
    /// Fixed "today" for expiry checks; the local date when unset.
    today: Option<NaiveDate>,
}

impl PaymentForm {
    pub fn new(fields: CardFields) -> Self {
        Self {
            fields,
            errors: FieldErrors::default(),
            step: WizardStep::default(),
            today: None,
        }
    }

    /// Pins the date used to decide whether a card has expired.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn fields(&self) -> &CardFields {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn card_brand(&self) -> CardBrand {
        card_type(&self.fields.card_number_display)
    }

    pub fn is_form_valid(&self) -> bool {
        match self.step {
            WizardStep::IdentityConfirmation => true,
            WizardStep::PersonalInfo => {
                !self.fields.holder_name.trim().is_empty()
                    && !self.fields.phone_digits.trim().is_empty()
                    && self.fields.amount > Decimal::ZERO
                    && self.errors.none_of(&STEP_TWO_FIELDS)
            }
            WizardStep::CardDetails => {
                validate_card_number(&self.fields.card_number_display)
                    && !self.fields.expiry.trim().is_empty()
                    && !self.fields.cvv.trim().is_empty()
                    && self.errors.none_of(&STEP_THREE_FIELDS)
            }
        }
    }

    /// Applies one keystroke-level update to a field.
    ///
    /// Returns `false` when the input is refused outright and the state is
    /// left untouched (a second decimal point, or a third decimal digit, in
    /// the amount).
    pub fn update_field(&mut self, name: FieldName, raw: &str) -> bool {
        match name {
            FieldName::CardNumberDisplay => self.update_card_number(raw),
            FieldName::Amount => return self.update_amount(raw),
            FieldName::Expiry => self.update_expiry(raw),
            FieldName::Cvv => self.update_cvv(raw),
            FieldName::PhoneDigits => self.update_phone(raw),
            FieldName::HolderName => self.fields.holder_name = raw.to_string(),
            FieldName::CustomerId => self.fields.customer_id = raw.to_string(),
            FieldName::CustomerCode => self.fields.customer_code = raw.to_string(),
            FieldName::Email => self.fields.email = raw.to_string(),
            FieldName::DistributionCenterCode => {
                self.fields.distribution_center_code = raw.to_string()
            }
        }
        debug!(field = %name, error = ?self.errors.get(name), "field updated");
        true
    }

    /// Advances one step. Leaving personal info requires a valid form.
    pub fn go_to_next_step(&mut self) {
        let allowed = match self.step {
            WizardStep::IdentityConfirmation => true,
            WizardStep::PersonalInfo => self.is_form_valid(),
            WizardStep::CardDetails => false,
        };
        if allowed && let Some(next) = self.step.next() {
            debug!(from = self.step.number(), to = next.number(), "wizard advanced");
            self.step = next;
        }
    }

    pub fn go_to_previous_step(&mut self) {
        if let Some(previous) = self.step.previous() {
            debug!(from = self.step.number(), to = previous.number(), "wizard went back");
            self.step = previous;
        }
    }

    fn update_card_number(&mut self, raw: &str) {
        let digits = normalize_digits(raw);
        self.fields.card_number_display = format_card_number(&digits);

        let error = (!digits.is_empty() && !validate_card_number(&digits))
            .then(|| INVALID_CARD_NUMBER.to_string());
        self.errors.set(FieldName::CardNumberDisplay, error);
    }

    fn update_amount(&mut self, raw: &str) -> bool {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let mut parts = cleaned.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next();
        if fraction.is_some_and(|f| f.contains('.')) {
            return false;
        }
        if fraction.is_some_and(|f| f.len() > 2) {
            return false;
        }

        let blank = whole.is_empty() && fraction.is_none_or(str::is_empty);
        let amount = parse_amount(whole, fraction);
        if amount.is_none() && !blank {
            // Out of range for a decimal; the previous amount stays.
            self.errors
                .set(FieldName::Amount, Some(AMOUNT_TOO_LARGE.to_string()));
            debug!(field = %FieldName::Amount, "amount out of range");
            return true;
        }
        self.fields.amount = amount.unwrap_or(Decimal::ZERO);

        let error = match amount {
            Some(value) if value > Decimal::ZERO => {
                // A bare fraction such as ".5" parses but is not a well-formed amount.
                whole.is_empty().then(|| AMOUNT_TOO_PRECISE.to_string())
            }
            _ => Some(AMOUNT_NOT_POSITIVE.to_string()),
        };
        self.errors.set(FieldName::Amount, error);
        debug!(field = %FieldName::Amount, error = ?self.errors.get(FieldName::Amount), "field updated");
        true
    }

    fn update_expiry(&mut self, raw: &str) {
        let digits = normalize_digits(raw);
        self.fields.expiry = if digits.len() > 2 {
            let end = digits.len().min(4);
            format!("{}/{}", &digits[..2], &digits[2..end])
        } else {
            digits.clone()
        };

        let error = if digits.is_empty() {
            None
        } else {
            let month: u32 = digits[..digits.len().min(2)].parse().unwrap_or(0);
            if !(1..=12).contains(&month) {
                Some(INVALID_MONTH.to_string())
            } else if digits.len() >= 4 {
                let year = 2000 + digits[2..4].parse::<i32>().unwrap_or(0);
                let today = self.today.unwrap_or_else(|| Local::now().date_naive());
                let expired = year < today.year()
                    || (year == today.year() && month < today.month());
                expired.then(|| CARD_EXPIRED.to_string())
            } else {
                None
            }
        };
        self.errors.set(FieldName::Expiry, error);
    }

    fn update_cvv(&mut self, raw: &str) {
        let brand = self.card_brand();
        let expected = brand.cvv_length();
        let mut digits = normalize_digits(raw);
        digits.truncate(expected);

        let error = if digits.is_empty() {
            None
        } else if digits.len() != expected {
            Some(format!("CVV must have {} digits", expected))
        } else if !validate_cvv(&digits, brand) {
            Some(INSECURE_CVV.to_string())
        } else {
            None
        };
        self.fields.cvv = digits;
        self.errors.set(FieldName::Cvv, error);
    }

    fn update_phone(&mut self, raw: &str) {
        let digits = normalize_digits(raw);
        self.fields.phone_digits = if digits.len() > 4 {
            let end = digits.len().min(8);
            format!("{}-{}", &digits[..4], &digits[4..end])
        } else {
            digits.clone()
        };

        let error = (digits.len() != 8).then(|| INVALID_PHONE.to_string());
        self.errors.set(FieldName::PhoneDigits, error);
    }
}

/// Parses the accepted amount text; `None` when there is no number at all.
fn parse_amount(whole: &str, fraction: Option<&str>) -> Option<Decimal> {
    let fraction = fraction.unwrap_or_default();
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let text = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    };
    Decimal::from_str(&text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn form() -> PaymentForm {
        PaymentForm::new(CardFields::default()).with_today(today())
    }

    fn form_on_step_two() -> PaymentForm {
        let mut form = form();
        form.go_to_next_step();
        form
    }

    #[test]
    fn test_card_number_formatting_and_error() {
        let mut form = form();
        form.update_field(FieldName::CardNumberDisplay, "4111111111111111");
        assert_eq!(form.fields().card_number_display, "4111 1111 1111 1111");
        assert_eq!(form.errors().get(FieldName::CardNumberDisplay), None);
        assert_eq!(form.card_brand(), CardBrand::Visa);

        form.update_field(FieldName::CardNumberDisplay, "4111 1111 1111 1112");
        assert_eq!(
            form.errors().get(FieldName::CardNumberDisplay),
            Some(INVALID_CARD_NUMBER)
        );

        form.update_field(FieldName::CardNumberDisplay, "abc");
        assert_eq!(form.fields().card_number_display, "");
        assert_eq!(form.errors().get(FieldName::CardNumberDisplay), None);
        assert_eq!(form.card_brand(), CardBrand::Unknown);
    }

    #[test]
    fn test_amount_rejects_extra_dot_and_digits() {
        let mut form = form();
        assert!(form.update_field(FieldName::Amount, "10.5"));
        assert_eq!(form.fields().amount, dec!(10.5));

        assert!(!form.update_field(FieldName::Amount, "10.5.1"));
        assert!(!form.update_field(FieldName::Amount, "10.555"));
        assert_eq!(form.fields().amount, dec!(10.5));
        assert_eq!(form.errors().get(FieldName::Amount), None);

        assert!(form.update_field(FieldName::Amount, "$1,250.75"));
        assert_eq!(form.fields().amount, dec!(1250.75));
    }

    #[test]
    fn test_amount_errors() {
        let mut form = form();
        form.update_field(FieldName::Amount, "0");
        assert_eq!(form.errors().get(FieldName::Amount), Some(AMOUNT_NOT_POSITIVE));

        form.update_field(FieldName::Amount, "");
        assert_eq!(form.fields().amount, Decimal::ZERO);
        assert_eq!(form.errors().get(FieldName::Amount), Some(AMOUNT_NOT_POSITIVE));

        form.update_field(FieldName::Amount, ".");
        assert_eq!(form.errors().get(FieldName::Amount), Some(AMOUNT_NOT_POSITIVE));

        form.update_field(FieldName::Amount, ".5");
        assert_eq!(form.fields().amount, dec!(0.5));
        assert_eq!(form.errors().get(FieldName::Amount), Some(AMOUNT_TOO_PRECISE));

        form.update_field(FieldName::Amount, "25.");
        assert_eq!(form.fields().amount, dec!(25));
        assert_eq!(form.errors().get(FieldName::Amount), None);
    }

    #[test]
    fn test_amount_out_of_range_keeps_previous_value() {
        let mut form = form();
        form.update_field(FieldName::Amount, "40.10");

        assert!(form.update_field(FieldName::Amount, "123456789012345678901234567890"));
        assert_eq!(form.fields().amount, dec!(40.10));
        assert_eq!(form.errors().get(FieldName::Amount), Some(AMOUNT_TOO_LARGE));

        form.update_field(FieldName::Amount, "41");
        assert_eq!(form.fields().amount, dec!(41));
        assert_eq!(form.errors().get(FieldName::Amount), None);
    }

    #[test]
    fn test_expiry_formatting() {
        let mut form = form();
        form.update_field(FieldName::Expiry, "1");
        assert_eq!(form.fields().expiry, "1");
        form.update_field(FieldName::Expiry, "12");
        assert_eq!(form.fields().expiry, "12");
        form.update_field(FieldName::Expiry, "122");
        assert_eq!(form.fields().expiry, "12/2");
        form.update_field(FieldName::Expiry, "12/27");
        assert_eq!(form.fields().expiry, "12/27");
        form.update_field(FieldName::Expiry, "122789");
        assert_eq!(form.fields().expiry, "12/27");
        assert_eq!(form.errors().get(FieldName::Expiry), None);
    }

    #[test]
    fn test_expiry_validation() {
        let mut form = form();
        form.update_field(FieldName::Expiry, "13/30");
        assert_eq!(form.errors().get(FieldName::Expiry), Some(INVALID_MONTH));
        form.update_field(FieldName::Expiry, "0");
        assert_eq!(form.errors().get(FieldName::Expiry), Some(INVALID_MONTH));

        form.update_field(FieldName::Expiry, "09/26");
        assert_eq!(form.errors().get(FieldName::Expiry), Some(CARD_EXPIRED));
        form.update_field(FieldName::Expiry, "12/25");
        assert_eq!(form.errors().get(FieldName::Expiry), Some(CARD_EXPIRED));

        // The current month is still valid
        form.update_field(FieldName::Expiry, "10/26");
        assert_eq!(form.errors().get(FieldName::Expiry), None);
        form.update_field(FieldName::Expiry, "01/27");
        assert_eq!(form.errors().get(FieldName::Expiry), None);

        form.update_field(FieldName::Expiry, "");
        assert_eq!(form.errors().get(FieldName::Expiry), None);
    }

    #[test]
    fn test_cvv_depends_on_brand() {
        let mut form = form();
        form.update_field(FieldName::CardNumberDisplay, "4111111111111111");
        form.update_field(FieldName::Cvv, "37");
        assert_eq!(
            form.errors().get(FieldName::Cvv),
            Some("CVV must have 3 digits")
        );
        form.update_field(FieldName::Cvv, "3745");
        assert_eq!(form.fields().cvv, "374");
        assert_eq!(form.errors().get(FieldName::Cvv), None);
        form.update_field(FieldName::Cvv, "123");
        assert_eq!(form.errors().get(FieldName::Cvv), Some(INSECURE_CVV));

        form.update_field(FieldName::CardNumberDisplay, "378282246310005");
        form.update_field(FieldName::Cvv, "374");
        assert_eq!(
            form.errors().get(FieldName::Cvv),
            Some("CVV must have 4 digits")
        );
        form.update_field(FieldName::Cvv, "2589");
        assert_eq!(form.errors().get(FieldName::Cvv), None);

        form.update_field(FieldName::Cvv, "");
        assert_eq!(form.errors().get(FieldName::Cvv), None);
    }

    #[test]
    fn test_phone_formatting() {
        let mut form = form();
        form.update_field(FieldName::PhoneDigits, "9999");
        assert_eq!(form.fields().phone_digits, "9999");
        assert_eq!(form.errors().get(FieldName::PhoneDigits), Some(INVALID_PHONE));

        form.update_field(FieldName::PhoneDigits, "99998888");
        assert_eq!(form.fields().phone_digits, "9999-8888");
        assert_eq!(form.errors().get(FieldName::PhoneDigits), None);

        form.update_field(FieldName::PhoneDigits, "9999-8888");
        assert_eq!(form.fields().phone_digits, "9999-8888");
        assert_eq!(form.errors().get(FieldName::PhoneDigits), None);

        form.update_field(FieldName::PhoneDigits, "999988887");
        assert_eq!(form.fields().phone_digits, "9999-8888");
        assert_eq!(form.errors().get(FieldName::PhoneDigits), Some(INVALID_PHONE));
    }

    #[test]
    fn test_errors_are_per_field() {
        let mut form = form();
        form.update_field(FieldName::PhoneDigits, "12");
        form.update_field(FieldName::CardNumberDisplay, "4111111111111112");
        form.update_field(FieldName::PhoneDigits, "12345678");
        assert_eq!(form.errors().get(FieldName::PhoneDigits), None);
        assert_eq!(
            form.errors().get(FieldName::CardNumberDisplay),
            Some(INVALID_CARD_NUMBER)
        );
    }

    #[test]
    fn test_other_fields_verbatim() {
        let mut form = form();
        form.update_field(FieldName::Email, "  a@b.c ");
        form.update_field(FieldName::HolderName, "  ");
        assert_eq!(form.fields().email, "  a@b.c ");
        assert_eq!(form.fields().holder_name, "  ");
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_update_is_idempotent() {
        let inputs = [
            (FieldName::CardNumberDisplay, "4111-1111-1111-1111"),
            (FieldName::Amount, "99.99"),
            (FieldName::Expiry, "0128"),
            (FieldName::Cvv, "a2b8c6"),
            (FieldName::PhoneDigits, "9999 9999"),
            (FieldName::HolderName, "Test User"),
        ];
        for (name, raw) in inputs {
            let mut once = form();
            once.update_field(name, raw);
            let mut twice = once.clone();
            twice.update_field(name, raw);
            assert_eq!(once.fields(), twice.fields(), "{}", name);
            assert_eq!(once.errors(), twice.errors(), "{}", name);
        }
    }

    #[test]
    fn test_step_one_always_advances() {
        let mut form = form();
        assert!(form.is_form_valid());
        form.update_field(FieldName::CardNumberDisplay, "1234");
        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::PersonalInfo);
    }

    #[test]
    fn test_step_two_requires_valid_fields() {
        let mut form = form_on_step_two();
        assert!(!form.is_form_valid());
        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::PersonalInfo);

        form.update_field(FieldName::HolderName, "Test User");
        form.update_field(FieldName::PhoneDigits, "9999-9999");
        assert!(!form.is_form_valid());
        form.update_field(FieldName::Amount, "100");
        assert!(form.is_form_valid());

        form.update_field(FieldName::PhoneDigits, "9999");
        assert!(!form.is_form_valid());
        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::PersonalInfo);
    }

    #[test]
    fn test_step_navigation_bounds() {
        let mut form = form();
        form.go_to_previous_step();
        assert_eq!(form.step(), WizardStep::IdentityConfirmation);

        form.go_to_next_step();
        form.update_field(FieldName::HolderName, "Test User");
        form.update_field(FieldName::PhoneDigits, "99999999");
        form.update_field(FieldName::Amount, "1");
        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::CardDetails);

        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::CardDetails);

        form.go_to_previous_step();
        assert_eq!(form.step(), WizardStep::PersonalInfo);
        form.go_to_previous_step();
        assert_eq!(form.step(), WizardStep::IdentityConfirmation);
    }

    #[test]
    fn test_full_wizard_walkthrough() {
        let mut form = form();
        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::PersonalInfo);

        form.update_field(FieldName::HolderName, "Test User");
        form.update_field(FieldName::PhoneDigits, "9999-9999");
        form.update_field(FieldName::Amount, "100");
        assert!(form.is_form_valid());

        form.go_to_next_step();
        assert_eq!(form.step(), WizardStep::CardDetails);
        assert!(!form.is_form_valid());

        form.update_field(FieldName::CardNumberDisplay, "4111111111111111");
        assert!(!form.is_form_valid());
        form.update_field(FieldName::Expiry, "12/27");
        assert!(!form.is_form_valid());
        form.update_field(FieldName::Cvv, "374");
        assert!(form.is_form_valid());

        form.update_field(FieldName::Cvv, "111");
        assert!(!form.is_form_valid());
    }
}
