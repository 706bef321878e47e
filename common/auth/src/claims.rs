use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::DecodeConfig;
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;

/// Claims read from a stored token.
///
/// The signature is never verified on the client, so these values only drive
/// navigation and display decisions. The backend remains the authority.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    /// Role tag as issued. Use [`Claims::role`] for the typed value.
    pub role: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw: serde_json::Value,
}

impl Claims {
    /// Typed role, failing for tags outside the recognized set.
    pub fn role(&self) -> AuthResult<Role> {
        self.role.parse()
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
}

fn timestamp(claim: &'static str, value: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(value, 0)
        .single()
        .ok_or_else(|| AuthError::InvalidClaim(claim, value.to_string()))
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let role = value.role.ok_or(AuthError::MissingClaim("role"))?;
        let expires_at = value.exp.map(|exp| timestamp("exp", exp)).transpose()?;
        let issued_at = value.iat.map(|iat| timestamp("iat", iat)).transpose()?;

        Ok(Self {
            subject: value.sub,
            role,
            expires_at,
            issued_at,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}

/// Reads the payload of a JWT without checking its signature.
///
/// Fails for anything that is not a three-part JWT with a JSON payload carrying
/// a `role` claim, and for tokens past `exp` when expiry checking is enabled.
pub fn decode_claims(token: &str, config: &DecodeConfig) -> AuthResult<Claims> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken("token is empty".to_string()));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;
    validation.validate_exp = config.validate_expiry;
    validation.leeway = config.effective_leeway();

    let data = decode::<serde_json::Value>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Claims::try_from(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_LEEWAY_SECONDS;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn mint(payload: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"issuer-secret"),
        )
        .expect("sign token")
    }

    #[test]
    fn decodes_payload_without_signature_key() {
        let exp = Utc::now().timestamp() + 3600;
        let token = mint(json!({ "sub": "a@cafe.test", "role": "admin", "exp": exp, "iat": exp - 60 }));

        let claims = decode_claims(&token, &DecodeConfig::new()).expect("decodes");
        assert_eq!(claims.subject.as_deref(), Some("a@cafe.test"));
        assert_eq!(claims.role().unwrap(), Role::Admin);
        assert_eq!(claims.expires_at.unwrap().timestamp(), exp);
        assert_eq!(claims.raw["role"], "admin");
    }

    #[test]
    fn accepts_tokens_signed_with_other_algorithms() {
        let payload = json!({ "role": "user" });
        let mut header = Header::new(Algorithm::HS512);
        header.kid = Some("other".into());
        let token = encode(&header, &payload, &EncodingKey::from_secret(b"x")).unwrap();

        let claims = decode_claims(&token, &DecodeConfig::new()).expect("decodes");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn rejects_garbage() {
        for token in ["", "   ", "not-a-jwt", "a.b", "a.b.c"] {
            assert!(
                decode_claims(token, &DecodeConfig::new()).is_err(),
                "{token:?} should not decode"
            );
        }
    }

    #[test]
    fn rejects_missing_role() {
        let token = mint(json!({ "sub": "a@cafe.test" }));
        let err = decode_claims(&token, &DecodeConfig::new()).expect_err("no role");
        assert!(matches!(err, AuthError::MissingClaim("role")));
    }

    #[test]
    fn expired_token_respects_config() {
        let token = mint(json!({ "role": "user", "exp": Utc::now().timestamp() - 3600 }));

        let err = decode_claims(&token, &DecodeConfig::new()).expect_err("expired");
        assert!(matches!(err, AuthError::Expired));

        let lenient = DecodeConfig::new().without_expiry_check();
        assert!(decode_claims(&token, &lenient).is_ok());

        let wide_leeway = DecodeConfig::new().with_leeway(7200);
        assert!(decode_claims(&token, &wide_leeway).is_ok());
    }

    #[test]
    fn leeway_is_capped_at_one_day() {
        assert_eq!(
            DecodeConfig::new().with_leeway(u32::MAX).leeway_seconds,
            MAX_LEEWAY_SECONDS
        );

        let unchecked = DecodeConfig {
            leeway_seconds: u32::MAX,
            validate_expiry: true,
        };
        assert_eq!(unchecked.effective_leeway(), u64::from(MAX_LEEWAY_SECONDS));

        let stale = mint(json!({ "role": "user", "exp": Utc::now().timestamp() - 2 * 86_400 }));
        assert!(matches!(
            decode_claims(&stale, &unchecked),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn unknown_role_still_decodes() {
        let token = mint(json!({ "role": "manager" }));
        let claims = decode_claims(&token, &DecodeConfig::new()).expect("decodes");
        assert!(matches!(claims.role(), Err(AuthError::UnknownRole(role)) if role == "manager"));
    }
}
