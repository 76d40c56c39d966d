//! reqwest client for the payment backend.

use crate::domain::attempt::{ConfirmResponse, SubmitResponse};
use crate::domain::card::normalize_digits;
use crate::domain::customer::{CenterList, CustomerLookup, CustomerProfile};
use crate::domain::form::CardFields;
use crate::domain::ports::{CustomerDirectory, PaymentGateway};
use crate::domain::reply::{BackendError, BackendReply};
use crate::error::{CheckoutError, Result};
use crate::infrastructure::envelope::{SensitiveCardData, encrypt_envelope};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

pub const API_KEY_HEADER: &str = "X-Emsula-Pay-Api-Key";
pub const X_API_KEY_HEADER: &str = "x-api-key";

const PUBLIC_KEY_PATH: &str = "/api/Payment/security/public-key";
const NEW_PAYMENT_PATH: &str = "/api/Payment/NewPayment";
const PAY_ORDER_PATH: &str = "/api/Payment/PayOrder";
const CENTER_LIST_PATH: &str = "/api/DistributionCenters/List";
const CUSTOMER_DETAILS_PATH: &str = "/api/Customer/Details";

const SUBMIT_ERROR_TITLE: &str = "Server error";
const CONFIRM_ERROR_TITLE: &str = "Confirmation error";
const CENTERS_ERROR_TITLE: &str = "Error fetching distribution centers";
const CUSTOMER_ERROR_TITLE: &str = "Error fetching customer information";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPaymentRequest<'a> {
    hash: String,
    customer_name: &'a str,
    customer_code: &'a str,
    distribution_center: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount_pay: Decimal,
    phone_number: &'a str,
    email: &'a str,
    use_luhn_validation: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayOrderRequest<'a> {
    request_id: &'a str,
}

/// Client for the payment backend, implementing both the gateway and the
/// customer directory.
#[derive(Debug, Clone)]
pub struct BackendClient {
    inner: reqwest::Client,
    base_url: Url,
    api_key: String,
    x_api_key: String,
    use_luhn_validation: bool,
}

impl BackendClient {
    pub fn new(base_url: &str, api_key: &str, x_api_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CheckoutError::Config(format!("invalid API base URL {}: {}", base_url, e)))?;
        Ok(Self {
            inner: reqwest::Client::new(),
            base_url,
            api_key: api_key.to_string(),
            x_api_key: x_api_key.to_string(),
            use_luhn_validation: false,
        })
    }

    /// Asks the backend to run its own Luhn check on the decrypted card.
    pub fn with_luhn_validation(mut self, enabled: bool) -> Self {
        self.use_luhn_validation = enabled;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(X_API_KEY_HEADER, &self.x_api_key)
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> reqwest::RequestBuilder {
        self.inner
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(X_API_KEY_HEADER, &self.x_api_key)
            .json(body)
    }

    /// Fetches the base64 DER public key used to seal card data. Fetched per attempt.
    pub async fn public_key(&self) -> Result<String> {
        let response = self.get(PUBLIC_KEY_PATH).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::InvalidResponse(format!(
                "public key request failed: HTTP {}",
                status
            )));
        }
        Ok(response.text().await?)
    }
}

/// Reads a backend answer.
///
/// Non-2xx bodies shaped `{title, message}` are passed through; anything else
/// becomes a generic rejection carrying the HTTP status.
async fn read_reply<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback_title: &str,
) -> Result<BackendReply<T>> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        let value = serde_json::from_str(&body)?;
        return Ok(BackendReply::Ok(value));
    }

    debug!(%status, "backend answered with an error status");
    let err = serde_json::from_str::<BackendError>(&body)
        .unwrap_or_else(|_| BackendError::new(fallback_title, format!("HTTP {}", status)));
    Ok(BackendReply::Rejected(err))
}

#[async_trait]
impl PaymentGateway for BackendClient {
    async fn submit(&self, fields: &CardFields, _risk_token: &str) -> Result<SubmitResponse> {
        let key = self.public_key().await?;
        let hash = encrypt_envelope(&key, &SensitiveCardData::from_fields(fields))?;
        let body = NewPaymentRequest {
            hash,
            customer_name: &fields.holder_name,
            customer_code: &fields.customer_code,
            distribution_center: &fields.distribution_center_code,
            amount_pay: fields.amount,
            phone_number: &fields.phone_digits,
            email: &fields.email,
            use_luhn_validation: self.use_luhn_validation,
        };

        info!(customer = %fields.customer_code, amount = %fields.amount, "submitting payment");
        let response = self.post(NEW_PAYMENT_PATH, &body).send().await?;
        read_reply(response, SUBMIT_ERROR_TITLE).await
    }

    async fn confirm(&self, attempt_id: &str) -> Result<ConfirmResponse> {
        info!(%attempt_id, "confirming order");
        let body = PayOrderRequest {
            request_id: attempt_id,
        };
        let response = self.post(PAY_ORDER_PATH, &body).send().await?;
        read_reply(response, CONFIRM_ERROR_TITLE).await
    }
}

#[async_trait]
impl CustomerDirectory for BackendClient {
    async fn lookup(&self, phone: &str, center_id: i64) -> Result<CustomerLookup> {
        let path = format!(
            "{}/{}/{}",
            CUSTOMER_DETAILS_PATH,
            center_id,
            normalize_digits(phone)
        );
        let response = self.get(&path).send().await?;
        let reply: BackendReply<CustomerProfile> =
            read_reply(response, CUSTOMER_ERROR_TITLE).await?;
        Ok(reply.map(CustomerProfile::with_derived_code))
    }

    async fn centers(&self) -> Result<CenterList> {
        let response = self.get(CENTER_LIST_PATH).send().await?;
        read_reply(response, CENTERS_ERROR_TITLE).await
    }
}
