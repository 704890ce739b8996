use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "x-jwt-token";

/// Only the HMAC family is ever accepted. Anything else in the token header
/// (`none`, RS*, ES*) is rejected before the signature is looked at.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims as they appear on the wire. Decoding fails closed: a missing or
/// mistyped field is a rejected token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    iat: i64,
    exp: i64,
}

/// A validated session, reconstructed entirely from the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Every validation failure. Deliberately carries no reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unauthorized")]
pub struct Unauthorized;

/// Sign a session for `username` valid from `issued_at` for `ttl`.
pub fn issue_token(
    username: &str,
    secret: &[u8],
    ttl: Duration,
    issued_at: DateTime<Utc>,
) -> Result<String, SessionError> {
    let claims = Claims {
        username: username.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + ttl).timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;
    Ok(token)
}

/// Check signature, algorithm, expiry and claim shape, and return the session.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Session, Unauthorized> {
    decode_session(token, &DecodingKey::from_secret(secret), &validation())
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

fn decode_session(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<Session, Unauthorized> {
    let data = decode::<Claims>(token, key, validation).map_err(|e| {
        tracing::debug!("Rejected session token: {:?}", e.kind());
        Unauthorized
    })?;

    let claims = data.claims;
    if claims.username.is_empty() {
        return Err(Unauthorized);
    }
    let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(Unauthorized)?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(Unauthorized)?;

    Ok(Session {
        username: claims.username,
        issued_at,
        expires_at,
    })
}

/// Issues and validates session tokens with one secret and TTL, both fixed at
/// construction.
pub struct SessionManager {
    secret: Vec<u8>,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            secret: secret.to_vec(),
            decoding_key: DecodingKey::from_secret(secret),
            validation: validation(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, username: &str) -> Result<String, SessionError> {
        issue_token(username, &self.secret, self.ttl, Utc::now())
    }

    pub fn validate(&self, token: &str) -> Result<Session, Unauthorized> {
        decode_session(token, &self.decoding_key, &self.validation)
    }

    /// `Set-Cookie` value handing a fresh token to the browser.
    pub fn login_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        )
    }

    /// `Set-Cookie` value overwriting the session cookie with an expired one.
    ///
    /// This only clears the browser's copy. The token itself stays valid
    /// until its `exp`; there is no server-side revocation.
    pub fn logout_cookie() -> String {
        format!(
            "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            SESSION_COOKIE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;

    const SECRET: &[u8] = b"unit-test-secret";

    /// Swap the header of a validly signed token for `header_json`.
    fn with_header(token: &str, header_json: &str) -> String {
        let (_, rest) = token.split_once('.').unwrap();
        format!("{}.{}", B64.encode(header_json), rest)
    }

    #[test]
    fn issued_token_validates_within_ttl() {
        let token = issue_token("alice", SECRET, Duration::minutes(5), Utc::now()).unwrap();
        let session = validate_token(&token, SECRET).unwrap();

        assert_eq!(session.username, "alice");
        assert_eq!(session.expires_at - session.issued_at, Duration::minutes(5));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::minutes(10);
        let token = issue_token("alice", SECRET, Duration::minutes(5), issued).unwrap();

        assert_eq!(validate_token(&token, SECRET), Err(Unauthorized));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = issue_token("alice", SECRET, Duration::minutes(5), Utc::now()).unwrap();

        assert_eq!(validate_token(&token, b"someone-else"), Err(Unauthorized));
    }

    #[test]
    fn non_hmac_algorithms_are_rejected() {
        let token = issue_token("alice", SECRET, Duration::minutes(5), Utc::now()).unwrap();

        let rs = with_header(&token, r#"{"alg":"RS256","typ":"JWT"}"#);
        assert_eq!(validate_token(&rs, SECRET), Err(Unauthorized));

        let none = with_header(&token, r#"{"alg":"none","typ":"JWT"}"#);
        assert_eq!(validate_token(&none, SECRET), Err(Unauthorized));

        // Unsigned token with an empty signature segment
        let (head_and_claims, _) = none.rsplit_once('.').unwrap();
        let unsigned = format!("{}.", head_and_claims);
        assert_eq!(validate_token(&unsigned, SECRET), Err(Unauthorized));
    }

    #[test]
    fn other_hmac_sizes_are_accepted() {
        let claims = Claims {
            username: "alice".into(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(validate_token(&token, SECRET).unwrap().username, "alice");
    }

    #[test]
    fn missing_or_mistyped_username_is_rejected() {
        let key = EncodingKey::from_secret(SECRET);
        let header = Header::new(Algorithm::HS256);
        let exp = (Utc::now() + Duration::minutes(1)).timestamp();
        let iat = Utc::now().timestamp();

        let missing = encode(&header, &serde_json::json!({ "iat": iat, "exp": exp }), &key).unwrap();
        assert_eq!(validate_token(&missing, SECRET), Err(Unauthorized));

        let mistyped =
            encode(&header, &serde_json::json!({ "username": 42, "iat": iat, "exp": exp }), &key)
                .unwrap();
        assert_eq!(validate_token(&mistyped, SECRET), Err(Unauthorized));

        let empty =
            encode(&header, &serde_json::json!({ "username": "", "iat": iat, "exp": exp }), &key)
                .unwrap();
        assert_eq!(validate_token(&empty, SECRET), Err(Unauthorized));

        let no_exp = encode(&header, &serde_json::json!({ "username": "alice", "iat": iat }), &key)
            .unwrap();
        assert_eq!(validate_token(&no_exp, SECRET), Err(Unauthorized));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(validate_token("", SECRET), Err(Unauthorized));
        assert_eq!(validate_token("a.b.c", SECRET), Err(Unauthorized));
    }

    #[test]
    fn manager_round_trip_and_cookies() {
        let manager = SessionManager::new(SECRET, Duration::minutes(120));
        let token = manager.issue("bob").unwrap();

        assert_eq!(manager.validate(&token).unwrap().username, "bob");

        let cookie = manager.login_cookie(&token);
        assert!(cookie.starts_with(&format!("x-jwt-token={};", token)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=7200"));

        let cleared = SessionManager::logout_cookie();
        assert!(cleared.starts_with("x-jwt-token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
