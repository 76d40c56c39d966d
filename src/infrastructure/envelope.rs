//! Card envelope: the sensitive card fields are serialized to
//! JSON and sealed with RSA-OAEP (SHA-256) under the backend's public key.

use crate::domain::card::normalize_digits;
use crate::domain::form::CardFields;
use crate::error::{CheckoutError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use serde::Serialize;
use sha2::Sha256;

/// The only card data that ever leaves the session, and only encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveCardData {
    pub card_number: String,
    /// `YYMM`.
    pub expiration_date: String,
    pub cvv: String,
    pub owner_name: String,
}

impl SensitiveCardData {
    pub fn from_fields(fields: &CardFields) -> Self {
        Self {
            card_number: normalize_digits(&fields.card_number_display),
            expiration_date: expiry_as_yymm(&fields.expiry),
            cvv: fields.cvv.clone(),
            owner_name: fields.holder_name.trim().to_string(),
        }
    }
}

/// Converts a displayed `MM/YY` expiry to `YYMM`.
pub fn expiry_as_yymm(expiry: &str) -> String {
    match expiry.split_once('/') {
        Some((month, year)) => format!("{}{}", year.trim(), month.trim()),
        None => expiry.to_string(),
    }
}

/// Seals `data` under a base64 DER (SPKI) public key and returns base64 ciphertext.
pub fn encrypt_envelope(public_key_b64: &str, data: &SensitiveCardData) -> Result<String> {
    let cleaned: String = public_key_b64
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let der = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| CheckoutError::Encryption(format!("public key is not base64: {}", e)))?;
    let key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CheckoutError::Encryption(format!("invalid public key: {}", e)))?;

    let plaintext = serde_json::to_vec(data)?;
    let mut rng = rand::thread_rng();
    let sealed = key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), &plaintext)
        .map_err(|e| CheckoutError::Encryption(e.to_string()))?;
    Ok(STANDARD.encode(sealed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::EncodePublicKey;

    fn sample() -> SensitiveCardData {
        SensitiveCardData::from_fields(&CardFields {
            holder_name: " Ana Perez ".to_string(),
            card_number_display: "4111 1111 1111 1111".to_string(),
            expiry: "07/29".to_string(),
            cvv: "852".to_string(),
            ..CardFields::default()
        })
    }

    #[test]
    fn test_sensitive_data_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["cardNumber"], "4111111111111111");
        assert_eq!(json["expirationDate"], "2907");
        assert_eq!(json["cvv"], "852");
        assert_eq!(json["ownerName"], "Ana Perez");
    }

    #[test]
    fn test_envelope_opens_with_private_key() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let der = RsaPublicKey::from(&private).to_public_key_der().unwrap();
        let key_b64 = format!("\"{}\"\n", STANDARD.encode(der.as_bytes()));

        let sealed = encrypt_envelope(&key_b64, &sample()).unwrap();
        let opened = private
            .decrypt(Oaep::new::<Sha256>(), &STANDARD.decode(sealed).unwrap())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&opened).unwrap();
        assert_eq!(value["cardNumber"], "4111111111111111");
    }

    #[test]
    fn test_bad_key_is_an_encryption_error() {
        let err = encrypt_envelope("not-a-key!", &sample()).unwrap_err();
        assert!(matches!(err, CheckoutError::Encryption(_)));
    }
}
