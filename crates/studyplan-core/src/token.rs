//! Bearer tokens identifying a user to the HTTP API.
//!
//! Tokens are HMAC-SHA256 based, bound to a user id.
//! Format: `studyplan_ut_<user_id>_<hmac_hex>`

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify studyplan user tokens.
const TOKEN_PREFIX: &str = "studyplan_ut_";

/// Environment variable holding the hex-encoded secret.
pub const SECRET_ENV: &str = "STUDYPLAN_TOKEN_SECRET";

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("token secret must not be empty")]
    EmptySecret,
}

/// Secret used to sign and verify tokens.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Decode a hex-encoded secret, as stored in the config file.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        let secret = hex::decode(secret_hex.trim())
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        Self::new(secret)
    }

    fn mac(&self) -> HmacSha256 {
        // Construction only fails for fixed-size keys; HMAC accepts any length.
        <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any size"))
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Issue a token for `user_id`.
pub fn issue_token(config: &TokenConfig, user_id: Uuid) -> String {
    let mut mac = config.mac();
    mac.update(signing_message(user_id).as_bytes());
    let hmac_hex = hex::encode(mac.finalize().into_bytes());
    format!("{TOKEN_PREFIX}{user_id}_{hmac_hex}")
}

/// Validate a token and return the user id it names.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<Uuid, TokenError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        TokenError::InvalidFormat(format!("token must start with {TOKEN_PREFIX:?}"))
    })?;

    let (user_id_str, hmac_hex) = rest
        .split_once('_')
        .ok_or_else(|| TokenError::InvalidFormat("expected underscore after user id".into()))?;

    let user_id =
        Uuid::parse_str(user_id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let provided = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    let mut mac = config.mac();
    mac.update(signing_message(user_id).as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| TokenError::HmacMismatch)?;

    Ok(user_id)
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

fn signing_message(user_id: Uuid) -> String {
    format!("user:{user_id}")
}
