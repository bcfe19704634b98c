use crate::api::IdentityClaims;

/// Seam between the engine and whatever issues identity assertions.
///
/// The capability resolver only ever sees structured claims; the raw
/// bearer string goes on the wire untouched. A provider that cannot decode
/// its assertion returns `None` from `claims` and the caller behaves as
/// anonymous.
pub trait IdentityProvider: Send + Sync {
    fn claims(&self) -> Option<IdentityClaims>;
    fn bearer(&self) -> Option<String>;
}

/// No identity at all.
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn claims(&self) -> Option<IdentityClaims> {
        None
    }

    fn bearer(&self) -> Option<String> {
        None
    }
}

/// A bearer credential read from the shared client-side key, with claims
/// decoded once at construction.
pub struct BearerIdentity {
    token: String,
    claims: Option<IdentityClaims>,
}

impl BearerIdentity {
    /// Decodes unverified JWT-style claims from the token's payload
    /// segment. The server stays authoritative; these claims only gate
    /// which controls the UI shows. Any malformation yields an identity
    /// with no claims, never an error.
    pub fn new(token: impl Into<String>) -> BearerIdentity {
        let token = token.into();
        let claims = decode_unverified_claims(&token);
        if claims.is_none() {
            tracing::debug!("bearer token carries no decodable claims, treating as anonymous");
        }
        BearerIdentity { token, claims }
    }

    /// For providers that obtain claims out of band.
    pub fn with_claims(token: impl Into<String>, claims: IdentityClaims) -> BearerIdentity {
        BearerIdentity {
            token: token.into(),
            claims: Some(claims),
        }
    }
}

impl IdentityProvider for BearerIdentity {
    fn claims(&self) -> Option<IdentityClaims> {
        self.claims.clone()
    }

    fn bearer(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

fn decode_unverified_claims(token: &str) -> Option<IdentityClaims> {
    let payload = token.split('.').nth(1)?;
    let payload = payload.trim_end_matches('=');
    let bytes = base64::decode_config(payload, base64::URL_SAFE_NO_PAD).ok()?;
    serde_json::from_slice(&bytes).ok()
}
