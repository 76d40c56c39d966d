use crate::domain::customer::CustomerProfile;
use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A positive payment amount with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value <= Decimal::ZERO {
            Err(CheckoutError::Validation(
                "Amount must be positive".to_string(),
            ))
        } else if value.normalize().scale() > 2 {
            Err(CheckoutError::Validation(
                "Amount must have at most 2 decimals".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Field values of one checkout session, as displayed to the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFields {
    pub holder_name: String,
    /// Phone as typed, formatted `xxxx-xxxx`.
    pub phone_digits: String,
    /// Card number in blocks of four digits.
    pub card_number_display: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
    /// Zero until a positive amount has been entered.
    pub amount: Decimal,
    pub customer_id: String,
    pub customer_code: String,
    pub email: String,
    pub distribution_center_code: String,
}

impl CardFields {
    /// Seeds a session from a looked-up customer.
    pub fn for_customer(customer: &CustomerProfile) -> Self {
        Self {
            holder_name: customer.name.clone(),
            customer_id: customer.id.to_string(),
            customer_code: customer.customer_code.clone(),
            email: customer.email.clone(),
            distribution_center_code: customer.distribution_center.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    HolderName,
    PhoneDigits,
    CardNumberDisplay,
    Expiry,
    Cvv,
    Amount,
    CustomerId,
    CustomerCode,
    Email,
    DistributionCenterCode,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::HolderName,
        FieldName::PhoneDigits,
        FieldName::CardNumberDisplay,
        FieldName::Expiry,
        FieldName::Cvv,
        FieldName::Amount,
        FieldName::CustomerId,
        FieldName::CustomerCode,
        FieldName::Email,
        FieldName::DistributionCenterCode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HolderName => "holderName",
            Self::PhoneDigits => "phoneDigits",
            Self::CardNumberDisplay => "cardNumberDisplay",
            Self::Expiry => "expiry",
            Self::Cvv => "cvv",
            Self::Amount => "amount",
            Self::CustomerId => "customerId",
            Self::CustomerCode => "customerCode",
            Self::Email => "email",
            Self::DistributionCenterCode => "distributionCenterCode",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = CheckoutError;

    /// Accepts the canonical names and the short names used by form inputs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = match s.trim() {
            "holderName" | "name" => Self::HolderName,
            "phoneDigits" | "phone" => Self::PhoneDigits,
            "cardNumberDisplay" | "cardNumber" => Self::CardNumberDisplay,
            "expiry" | "expiryDate" => Self::Expiry,
            "cvv" => Self::Cvv,
            "amount" | "paymentAmount" => Self::Amount,
            "customerId" => Self::CustomerId,
            "customerCode" => Self::CustomerCode,
            "email" => Self::Email,
            "distributionCenterCode" | "distributionCenter" => Self::DistributionCenterCode,
            other => {
                return Err(CheckoutError::Validation(format!(
                    "Unknown field: {}",
                    other
                )));
            }
        };
        Ok(name)
    }
}

/// One optional message per validated field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl FieldErrors {
    pub fn get(&self, name: FieldName) -> Option<&str> {
        self.slot(name).and_then(|s| s.as_deref())
    }

    /// Sets or clears the message for `name`. Fields without a slot are ignored.
    pub fn set(&mut self, name: FieldName, message: Option<String>) {
        if let Some(slot) = self.slot_mut(name) {
            *slot = message.filter(|m| !m.is_empty());
        }
    }

    pub fn has_error(&self, name: FieldName) -> bool {
        self.get(name).is_some()
    }

    pub fn none_of(&self, names: &[FieldName]) -> bool {
        names.iter().all(|n| !self.has_error(*n))
    }

    pub fn is_empty(&self) -> bool {
        self.none_of(&FieldName::ALL)
    }

    fn slot(&self, name: FieldName) -> Option<&Option<String>> {
        match name {
            FieldName::HolderName => Some(&self.holder_name),
            FieldName::PhoneDigits => Some(&self.phone_digits),
            FieldName::CardNumberDisplay => Some(&self.card_number_display),
            FieldName::Expiry => Some(&self.expiry),
            FieldName::Cvv => Some(&self.cvv),
            FieldName::Amount => Some(&self.amount),
            _ => None,
        }
    }

    fn slot_mut(&mut self, name: FieldName) -> Option<&mut Option<String>> {
        match name {
            FieldName::HolderName => Some(&mut self.holder_name),
            FieldName::PhoneDigits => Some(&mut self.phone_digits),
            FieldName::CardNumberDisplay => Some(&mut self.card_number_display),
            FieldName::Expiry => Some(&mut self.expiry),
            FieldName::Cvv => Some(&mut self.cvv),
            FieldName::Amount => Some(&mut self.amount),
            _ => None,
        }
    }
}

/// Page of the three-step payment wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    #[default]
    IdentityConfirmation = 1,
    PersonalInfo = 2,
    CardDetails = 3,
}

impl WizardStep {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::IdentityConfirmation => Some(Self::PersonalInfo),
            Self::PersonalInfo => Some(Self::CardDetails),
            Self::CardDetails => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::IdentityConfirmation => None,
            Self::PersonalInfo => Some(Self::IdentityConfirmation),
            Self::CardDetails => Some(Self::PersonalInfo),
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = CheckoutError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::IdentityConfirmation),
            2 => Ok(Self::PersonalInfo),
            3 => Ok(Self::CardDetails),
            other => Err(CheckoutError::Validation(format!(
                "Wizard step out of range: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(100)).is_ok());
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(Amount::new(dec!(10.50)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0)),
            Err(CheckoutError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5)),
            Err(CheckoutError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(1.005)),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_field_name_parsing() {
        assert_eq!("name".parse::<FieldName>().unwrap(), FieldName::HolderName);
        assert_eq!(
            "cardNumber".parse::<FieldName>().unwrap(),
            FieldName::CardNumberDisplay
        );
        assert_eq!("paymentAmount".parse::<FieldName>().unwrap(), FieldName::Amount);
        for name in FieldName::ALL {
            assert_eq!(name.as_str().parse::<FieldName>().unwrap(), name);
        }
        assert!("branch".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_field_errors_slots() {
        let mut errors = FieldErrors::default();
        assert!(errors.is_empty());

        errors.set(FieldName::Cvv, Some("bad".to_string()));
        assert_eq!(errors.get(FieldName::Cvv), Some("bad"));
        assert!(!errors.none_of(&[FieldName::Cvv, FieldName::Expiry]));

        errors.set(FieldName::Cvv, Some(String::new()));
        assert!(!errors.has_error(FieldName::Cvv));

        errors.set(FieldName::Email, Some("ignored".to_string()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_wizard_step_moves_by_one() {
        assert_eq!(WizardStep::default(), WizardStep::IdentityConfirmation);
        assert_eq!(
            WizardStep::IdentityConfirmation.next(),
            Some(WizardStep::PersonalInfo)
        );
        assert_eq!(WizardStep::CardDetails.next(), None);
        assert_eq!(WizardStep::IdentityConfirmation.previous(), None);
        assert_eq!(
            WizardStep::CardDetails.previous(),
            Some(WizardStep::PersonalInfo)
        );
        assert_eq!(WizardStep::try_from(3).unwrap(), WizardStep::CardDetails);
        assert!(WizardStep::try_from(4).is_err());
        assert_eq!(serde_json::to_string(&WizardStep::PersonalInfo).unwrap(), "2");
    }

    #[test]
    fn test_fields_for_customer() {
        let customer = CustomerProfile {
            id: 42,
            name: "Ana Perez".to_string(),
            phone_number: "99998888".to_string(),
            business_name: "Tienda Ana".to_string(),
            customer_code: "42".to_string(),
            email: "ana@example.com".to_string(),
            distribution_center: "CD-01".to_string(),
        };
        let fields = CardFields::for_customer(&customer);
        assert_eq!(fields.holder_name, "Ana Perez");
        assert_eq!(fields.customer_id, "42");
        assert_eq!(fields.distribution_center_code, "CD-01");
        assert!(fields.card_number_display.is_empty());
        assert_eq!(fields.amount, Decimal::ZERO);
    }
}
