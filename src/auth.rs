//! Bearer-token authentication. Tokens are minted by the external auth
//! service; this module only verifies them and extracts the caller identity.
//! A single `SecurityScheme` guards every route instead of per-route
//! middleware.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use poem::Request;
use poem_openapi::SecurityScheme;
use poem_openapi::auth::Bearer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims shared with the external auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (uuid).
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: u64,
    /// Issued-at timestamp.
    pub iat: u64,
}

/// Authenticated caller identity, as seen by every handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// HS256 verifier around the shared secret. Injected into the route tree via
/// `EndpointExt::data` so the checker below can reach it.
#[derive(Clone)]
pub struct JwtAuthority {
    secret: String,
}

impl JwtAuthority {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<AuthUser> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        let user_id = Uuid::parse_str(&data.claims.sub)?;
        Ok(AuthUser { user_id })
    }

    /// Mint a token the way the auth collaborator does. Used by tests and
    /// local tooling; the service itself never issues tokens.
    pub fn mint(&self, user_id: Uuid, duration_secs: u64) -> anyhow::Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + duration_secs,
            iat: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[derive(SecurityScheme)]
#[oai(ty = "bearer", checker = "bearer_checker")]
pub struct BearerAuth(pub AuthUser);

async fn bearer_checker(req: &Request, bearer: Bearer) -> Option<AuthUser> {
    let authority = req.data::<JwtAuthority>()?;
    match authority.verify(&bearer.token) {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::debug!(error = %err, "rejected bearer token");
            None
        }
    }
}
