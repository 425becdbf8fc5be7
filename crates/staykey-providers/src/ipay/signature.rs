//! Shared-secret request signing.
//!
//! The vendor signs every request and callback the same way: fields sorted
//! lexicographically by key, joined as `key=value` with `&`, HMAC-SHA256
//! under the merchant secret, uppercase hex. A `BTreeMap` carries the sort
//! order, so signing never depends on caller insertion order.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs the fields under the given secret.
pub fn sign_fields(secret: &str, fields: &BTreeMap<String, String>) -> String {
    let payload = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Verifies a detached signature over the fields.
pub fn verify_fields(secret: &str, fields: &BTreeMap<String, String>, signature: &str) -> bool {
    sign_fields(secret, fields) == signature
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn signature_is_deterministic() {
        let f = fields(&[("merchant_id", "m1"), ("order_id", "DEP-1"), ("amount", "15000")]);
        assert_eq!(sign_fields("secret", &f), sign_fields("secret", &f));
    }

    #[test]
    fn signature_is_uppercase_hex() {
        let f = fields(&[("a", "1")]);
        let sig = sign_fields("secret", &f);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = fields(&[("amount", "100"), ("currency", "GEL"), ("order_id", "X")]);
        let reversed = fields(&[("order_id", "X"), ("currency", "GEL"), ("amount", "100")]);
        assert_eq!(sign_fields("k", &forward), sign_fields("k", &reversed));
    }

    #[test]
    fn roundtrip_verifies() {
        let f = fields(&[("transaction_id", "tx-9"), ("status", "success")]);
        let sig = sign_fields("merchant-secret", &f);
        assert!(verify_fields("merchant-secret", &f, &sig));
    }

    #[test]
    fn tampering_breaks_verification() {
        let f = fields(&[("transaction_id", "tx-9"), ("status", "success")]);
        let sig = sign_fields("merchant-secret", &f);

        let tampered = fields(&[("transaction_id", "tx-9"), ("status", "failed")]);
        assert!(!verify_fields("merchant-secret", &tampered, &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let f = fields(&[("a", "1")]);
        let sig = sign_fields("right", &f);
        assert!(!verify_fields("wrong", &f, &sig));
    }
}
