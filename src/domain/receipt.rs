use crate::domain::attempt::Confirmation;
use crate::domain::card::{CardBrand, last_four};
use crate::domain::form::CardFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Proof of payment handed to the receipt renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub name: String,
    pub phone_number: String,
    pub amount_paid: Decimal,
    pub card_brand: CardBrand,
    pub last_four_digits: String,
    /// Authorization code.
    pub verification: String,
    /// Transaction identifier.
    pub reference: String,
}

impl Receipt {
    pub fn new(fields: &CardFields, brand: CardBrand, confirmation: &Confirmation) -> Self {
        Self {
            name: fields.holder_name.trim().to_string(),
            phone_number: fields.phone_digits.clone(),
            amount_paid: fields.amount,
            card_brand: brand,
            last_four_digits: last_four(&fields.card_number_display),
            verification: confirmation.authorization_code.clone(),
            reference: confirmation.transaction_identifier.clone(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "PAYMENT RECEIPT");
        let _ = writeln!(out, "Name:         {}", self.name);
        let _ = writeln!(out, "Phone:        {}", self.phone_number);
        let _ = writeln!(out, "Amount paid:  {:.2}", self.amount_paid);
        let _ = writeln!(
            out,
            "Card:         {} **** {}",
            self.card_brand, self.last_four_digits
        );
        let _ = writeln!(out, "Verification: {}", self.verification);
        let _ = writeln!(out, "Reference:    {}", self.reference);
        out
    }
}
