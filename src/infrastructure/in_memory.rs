use crate::domain::card::normalize_digits;
use crate::domain::customer::{CenterList, CustomerLookup, CustomerProfile, DistributionCenter};
use crate::domain::ports::CustomerDirectory;
use crate::domain::reply::{BackendError, BackendReply};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const CUSTOMER_NOT_FOUND_TITLE: &str = "Customer not found";
pub const CUSTOMER_NOT_FOUND_MESSAGE: &str =
    "No customer is registered with that phone number in the selected distribution center";

/// A thread-safe in-memory customer directory.
///
/// Customers are keyed by distribution center and phone digits. Used by the
/// simulated backend and in tests.
#[derive(Default, Clone)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<(i64, String), CustomerProfile>>>,
    centers: Arc<RwLock<Vec<DistributionCenter>>>,
}

impl InMemoryCustomerDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a distribution center, replacing one with the same id.
    pub async fn add_center(&self, center: DistributionCenter) {
        let mut centers = self.centers.write().await;
        centers.retain(|c| c.id != center.id);
        centers.push(center);
    }

    /// Registers a customer under `center_id`.
    pub async fn add_customer(&self, center_id: i64, profile: CustomerProfile) {
        let key = (center_id, normalize_digits(&profile.phone_number));
        let mut customers = self.customers.write().await;
        customers.insert(key, profile);
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn lookup(&self, phone: &str, center_id: i64) -> Result<CustomerLookup> {
        let customers = self.customers.read().await;
        let found = customers.get(&(center_id, normalize_digits(phone))).cloned();
        Ok(match found {
            Some(profile) => BackendReply::Ok(profile.with_derived_code()),
            None => BackendReply::Rejected(BackendError::new(
                CUSTOMER_NOT_FOUND_TITLE,
                CUSTOMER_NOT_FOUND_MESSAGE,
            )),
        })
    }

    async fn centers(&self) -> Result<CenterList> {
        let centers = self.centers.read().await;
        let mut list = centers.clone();
        list.sort_by_key(|c| c.id);
        Ok(BackendReply::Ok(list))
    }
}
