use crate::application::alerts::AlertCenter;
use crate::application::checkout::Checkout;
use crate::domain::alert::Alert;
use crate::domain::attempt::PaymentPhase;
use crate::domain::card::CardBrand;
use crate::domain::form::FieldName;
use crate::domain::receipt::Receipt;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Final state of a replayed session. Never carries card data beyond the
/// brand and the receipt's last four digits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub step: u8,
    pub form_valid: bool,
    pub card_brand: CardBrand,
    pub errors: BTreeMap<&'static str, String>,
    pub phase: PaymentPhase,
    pub attempt_id: Option<String>,
    pub payment_error: Option<String>,
    pub paying: bool,
    /// The last alert shown, even if it has since been dismissed.
    pub alert: Option<Alert>,
    pub receipt: Option<Receipt>,
}

impl SessionReport {
    pub fn capture(checkout: &Checkout, alerts: &AlertCenter) -> Self {
        let form = checkout.form();
        let process = checkout.process();
        let attempt = process.attempt();
        let errors = FieldName::ALL
            .iter()
            .filter_map(|&name| {
                form.errors()
                    .get(name)
                    .map(|message| (name.as_str(), message.to_string()))
            })
            .collect();

        Self {
            step: form.step().number(),
            form_valid: form.is_form_valid(),
            card_brand: form.card_brand(),
            errors,
            phase: attempt.phase,
            attempt_id: attempt.attempt_id,
            payment_error: process.payment_error().map(str::to_string),
            paying: process.is_paying(),
            alert: alerts.last(),
            receipt: checkout.receipt().cloned(),
        }
    }

    pub fn write_json<W: Write>(&self, mut out: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)?;
        Ok(())
    }
}
