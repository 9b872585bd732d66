//! Manage json web tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::config::Token as TokenConfig;
use crate::error::{Result, ServerError};
use crate::user::{Role, User};

/// What a signed token may be exchanged for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: i64,
    /// Identifies the time at which the JWT was issued.
    pub iat: i64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub fullname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub typ: TokenUse,
}

/// Freshly signed access and refresh tokens.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime, in seconds.
    pub expires_in: u64,
}

/// Manage JWT tokens.
///
/// Both halves of a pair are HS256-signed with the server-held secret; no
/// session state is kept server-side.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_lifetime: chrono::Duration,
    refresh_lifetime: chrono::Duration,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(issuer: &str, secret: &str, config: &TokenConfig) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_owned(),
            audience: config
                .audience
                .clone()
                .unwrap_or_else(|| issuer.to_owned()),
            access_lifetime: chrono::Duration::minutes(config.access_minutes),
            refresh_lifetime: chrono::Duration::days(config.refresh_days),
        }
    }

    fn encode(&self, user: &User, usage: TokenUse) -> Result<String> {
        let lifetime = match usage {
            TokenUse::Access => self.access_lifetime,
            TokenUse::Refresh => self.refresh_lifetime,
        };
        let now = chrono::Utc::now();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            sub: user.id.to_string(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            fullname: user.fullname(),
            image: user.image.clone(),
            phone: user.phone.clone(),
            typ: usage,
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Sign a new access token for a verified user.
    pub fn create_access(&self, user: &User) -> Result<String> {
        if !user.verified {
            return Err(ServerError::Unverified);
        }

        self.encode(user, TokenUse::Access)
    }

    /// Sign a new access and refresh token pair for a verified user.
    pub fn create_pair(&self, user: &User) -> Result<TokenPair> {
        if !user.verified {
            return Err(ServerError::Unverified);
        }

        Ok(TokenPair {
            access_token: self.encode(user, TokenUse::Access)?,
            refresh_token: self.encode(user, TokenUse::Refresh)?,
            expires_in: self.access_lifetime.num_seconds() as u64,
        })
    }

    /// Access token lifetime, in seconds.
    pub fn expires_in(&self) -> u64 {
        self.access_lifetime.num_seconds() as u64
    }

    fn decode_use(&self, token: &str, usage: TokenUse) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let claims =
            decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        // An access token must never be replayed as a refresh token, nor the
        // other way around.
        if claims.typ != usage {
            return Err(ServerError::Unauthorized);
        }

        Ok(claims)
    }

    /// Decode and check an access token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        self.decode_use(token, TokenUse::Access)
    }

    /// Decode and check a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims> {
        self.decode_use(token, TokenUse::Refresh)
    }
}
