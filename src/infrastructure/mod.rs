//! Adapters behind the domain ports: the HTTP backend, the risk endpoint,
//! and the in-process stand-ins used for simulated runs and tests.

pub mod envelope;
pub mod http;
pub mod in_memory;
pub mod risk;
pub mod simulated;
