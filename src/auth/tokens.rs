//! Bearer token management
//!
//! Uses HMAC-signed tokens carried in the Authorization header.
//! No server-side token storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::User;
use crate::error::AppError;

/// What a token is good for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, authorizes API requests
    Access,
    /// Long-lived, only exchangeable for a fresh pair
    Refresh,
}

/// Signed token claims
///
/// Serialized to JSON and carried inside the signed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub username: String,
    pub kind: TokenKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Access/refresh token pair returned by login, verification and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issue an access/refresh pair for a user.
pub fn issue_token_pair(
    user: &User,
    secret: &str,
    access_ttl: i64,
    refresh_ttl: i64,
) -> Result<TokenPair, AppError> {
    let now = Utc::now();

    let access = sign_token(
        &TokenClaims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            kind: TokenKind::Access,
            created_at: now,
            expires_at: now + Duration::seconds(access_ttl),
        },
        secret,
    )?;

    let refresh = sign_token(
        &TokenClaims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            kind: TokenKind::Refresh,
            created_at: now,
            expires_at: now + Duration::seconds(refresh_ttl),
        },
        secret,
    )?;

    Ok(TokenPair { access, refresh })
}

/// Create a signed token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn sign_token(claims: &TokenClaims, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize claims to JSON
    let payload = serde_json::to_string(claims).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Token(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a token
///
/// # Errors
/// Returns `Unauthorized` if the signature is invalid, the token is
/// malformed, or it has expired.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(AppError::Unauthorized);
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Token(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| AppError::Unauthorized)?;

    let claims: TokenClaims =
        serde_json::from_str(&payload_str).map_err(|_| AppError::Unauthorized)?;

    // 4. Check expiry
    if claims.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}
