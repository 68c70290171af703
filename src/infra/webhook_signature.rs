//! Stripe-style webhook signatures: `t=<unix>,v1=<hex hmac-sha256>`.
//!
//! The MAC covers `"{t}.{raw body}"`. Several `v1` entries may be present
//! during secret rotation; any match is accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

fn mac_for(secret: &str, timestamp: &str, body: &str) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC error".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    Ok(mac)
}

pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> AppResult<String> {
    let mac = mac_for(secret, &timestamp.to_string(), body)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={},v1={}", timestamp, signature))
}

/// Verify against the current clock.
pub fn verify(body: &str, header: &str, secret: &str, tolerance_secs: i64) -> AppResult<()> {
    verify_at(body, header, secret, tolerance_secs, chrono::Utc::now().timestamp())
}

/// Verify a signature header as of `now`.
///
/// Every failure is reported as `InvalidSignature`; the reason is only logged.
pub fn verify_at(
    body: &str,
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        tracing::warn!("Webhook signature header has no timestamp");
        return Err(AppError::InvalidSignature);
    };
    if signatures.is_empty() {
        tracing::warn!("Webhook signature header has no v1 signature");
        return Err(AppError::InvalidSignature);
    }

    let ts: i64 = timestamp.parse().map_err(|_| {
        tracing::warn!(timestamp, "Webhook signature timestamp is not a number");
        AppError::InvalidSignature
    })?;

    let matched = signatures.iter().any(|sig| {
        let Ok(raw) = hex::decode(sig) else {
            return false;
        };
        mac_for(secret, timestamp, body)
            .map(|mac| mac.verify_slice(&raw).is_ok())
            .unwrap_or(false)
    });

    if !matched {
        tracing::warn!("Webhook signature mismatch");
        return Err(AppError::InvalidSignature);
    }

    if (now - ts).abs() > tolerance_secs {
        tracing::warn!(timestamp = ts, now, "Webhook signature timestamp outside tolerance");
        return Err(AppError::InvalidSignature);
    }

    Ok(())
}
