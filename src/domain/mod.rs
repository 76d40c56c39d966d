//! Domain types and the ports through which the application reaches its
//! external collaborators.

pub mod alert;
pub mod attempt;
pub mod card;
pub mod customer;
pub mod form;
pub mod ports;
pub mod receipt;
pub mod reply;
pub mod risk;
pub mod strong_auth;
