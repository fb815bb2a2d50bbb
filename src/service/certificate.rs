//! Certificate issuance. The identifier is for display, it grants nothing by itself.

use chrono::Utc;

use crate::model::{Certificate, Timestamp};

const RANDOM_DIGITS: usize = 6;

/// Generates a `CERT-<time>-<random>` identifier, both parts base 36 and uppercased.
pub fn generate_certificate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random = uuid::Uuid::new_v4().as_u128() as u64;

    format_certificate_id(millis, random)
}

fn format_certificate_id(millis: u64, random: u64) -> String {
    let random = base36(random);
    let random = &random[random.len().saturating_sub(RANDOM_DIGITS)..];

    format!("CERT-{}-{}", base36(millis), random).to_uppercase()
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }

    digits.iter().rev().map(|&digit| digit as char).collect()
}

impl Certificate {
    /// Marks the certificate as issued with a fresh identifier.
    ///
    /// Returns `false` without touching anything when a certificate was already issued.
    pub fn issue(&mut self, at: Timestamp) -> bool {
        if self.is_issued {
            return false;
        }

        self.is_issued = true;
        self.issued_at = Some(at);
        self.certificate_id = Some(generate_certificate_id());
        true
    }
}
