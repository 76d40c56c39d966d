use crate::domain::reply::BackendReply;
use serde::{Deserialize, Serialize};

/// Customer identity returned by the lookup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub business_name: String,
    /// The backend does not send this; it is the textual form of `id`.
    #[serde(default)]
    pub customer_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub distribution_center: String,
}

impl CustomerProfile {
    pub fn with_derived_code(mut self) -> Self {
        self.customer_code = self.id.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionCenter {
    pub id: i64,
    pub name: String,
}

pub type CustomerLookup = BackendReply<CustomerProfile>;
pub type CenterList = BackendReply<Vec<DistributionCenter>>;
