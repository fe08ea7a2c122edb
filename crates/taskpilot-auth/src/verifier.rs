// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HS256 token verification.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use taskpilot_core::types::UserIdentity;
use taskpilot_core::{AdapterType, AuthAdapter, HealthStatus, PluginAdapter, TaskpilotError};

type HmacSha256 = Hmac<Sha256>;

/// Claims carried in the token payload.
///
/// `user_id` takes priority; some issuers put the user id in `sub` instead,
/// so both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as a Unix timestamp, if present.
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Verifies HS256 bearer tokens against a shared secret.
pub struct HsTokenVerifier {
    secret: Vec<u8>,
}

impl HsTokenVerifier {
    /// Creates a verifier for the given shared secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn check(&self, token: &str) -> Result<UserIdentity, TaskpilotError> {
        // A well-formed token has exactly 3 segments. Checking up front
        // keeps garbage input from ever reaching the decoder.
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
            debug!("token rejected: wrong segment count");
            return Err(TaskpilotError::Auth(
                "could not validate credentials".into(),
            ));
        };

        let header_bytes = decode_segment(header_b64)?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|_| TaskpilotError::Auth("could not validate credentials".into()))?;
        if header.alg != "HS256" {
            debug!(alg = %header.alg, "token rejected: unsupported algorithm");
            return Err(TaskpilotError::Auth(
                "could not validate credentials".into(),
            ));
        }

        let signature = decode_segment(signature_b64)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TaskpilotError::Auth("could not validate credentials".into()))?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        // Constant-time comparison via the Mac verifier.
        mac.verify_slice(&signature).map_err(|_| {
            debug!("token rejected: bad signature");
            TaskpilotError::Auth("could not validate credentials".into())
        })?;

        let payload_bytes = decode_segment(payload_b64)?;
        let claims: TokenClaims = serde_json::from_slice(&payload_bytes)
            .map_err(|_| TaskpilotError::Auth("could not validate credentials".into()))?;

        if let Some(exp) = claims.exp
            && exp <= chrono::Utc::now().timestamp()
        {
            debug!("token rejected: expired");
            return Err(TaskpilotError::Auth("credentials expired".into()));
        }

        let user_id = claims
            .user_id
            .or(claims.sub)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                TaskpilotError::Auth("could not validate credentials".into())
            })?;

        Ok(UserIdentity {
            user_id,
            email: claims.email.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PluginAdapter for HsTokenVerifier {
    fn name(&self) -> &str {
        "hs256"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, TaskpilotError> {
        if self.secret.is_empty() {
            return Ok(HealthStatus::Unhealthy("empty signing secret".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TaskpilotError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for HsTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, TaskpilotError> {
        self.check(token)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TaskpilotError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TaskpilotError::Auth("could not validate credentials".into()))
}

/// Mints a signed HS256 token for the given claims.
///
/// Used by tests and local tooling; production tokens come from the
/// external identity provider sharing the same secret.
pub fn mint_token(secret: &[u8], claims: &TokenClaims) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(claims).expect("claims serialize to JSON"),
    );
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{header}.{payload}.{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shared-test-secret";

    fn claims(user_id: &str) -> TokenClaims {
        TokenClaims {
            user_id: Some(user_id.to_string()),
            sub: None,
            email: Some(format!("{user_id}@example.com")),
            exp: None,
        }
    }

    #[tokio::test]
    async fn valid_token_resolves_identity() {
        let verifier = HsTokenVerifier::new(SECRET);
        let token = mint_token(SECRET, &claims("u1"));

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.email, "u1@example.com");
    }

    #[tokio::test]
    async fn sub_claim_is_accepted_as_user_id() {
        let verifier = HsTokenVerifier::new(SECRET);
        let token = mint_token(
            SECRET,
            &TokenClaims {
                user_id: None,
                sub: Some("u2".into()),
                email: None,
                exp: None,
            },
        );

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.user_id, "u2");
        assert_eq!(identity.email, "");
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let verifier = HsTokenVerifier::new(SECRET);
        let token = mint_token(b"some-other-secret", &claims("u1"));
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            TaskpilotError::Auth(_)
        ));
    }

    #[tokio::test]
    async fn tampered_payload_is_rejected() {
        let verifier = HsTokenVerifier::new(SECRET);
        let token = mint_token(SECRET, &claims("u1"));

        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"user_id":"u2"}"#);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(verifier.verify(&forged).await.is_err());
    }

    #[tokio::test]
    async fn malformed_tokens_never_panic() {
        let verifier = HsTokenVerifier::new(SECRET);
        for bad in ["", "x", "a.b", "a.b.c.d", "not base64 at all!!", "a.b.c"] {
            assert!(
                verifier.verify(bad).await.is_err(),
                "token {bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let verifier = HsTokenVerifier::new(SECRET);
        let mut c = claims("u1");
        c.exp = Some(chrono::Utc::now().timestamp() - 60);
        let token = mint_token(SECRET, &c);

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn future_expiry_is_accepted() {
        let verifier = HsTokenVerifier::new(SECRET);
        let mut c = claims("u1");
        c.exp = Some(chrono::Utc::now().timestamp() + 3600);
        let token = mint_token(SECRET, &c);
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn missing_user_id_and_sub_is_rejected() {
        let verifier = HsTokenVerifier::new(SECRET);
        let token = mint_token(SECRET, &TokenClaims::default());
        assert!(verifier.verify(&token).await.is_err());
    }
}
