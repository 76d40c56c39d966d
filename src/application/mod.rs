//! Application layer orchestrating a checkout session.
//!
//! `PaymentForm` owns the wizard and field validation, `PaymentProcess`
//! drives one payment attempt through submission and strong authentication,
//! and `Checkout` ties both to the risk verifier and the receipt. All
//! collaborators are injected as trait objects from `domain::ports`.

pub mod alerts;
pub mod checkout;
pub mod form;
pub mod process;
pub mod strong_auth;
