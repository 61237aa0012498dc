//! Participant identities, conversation identifiers and the per-user
//! application context.

use crate::error::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};

// --- Identity ---

/// An opaque participant name.
///
/// Comparison and hashing ignore case; the original spelling is kept for
/// display and for addressing transports.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a participant name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw name.
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.to_lowercase()
    }

    /// Lowercased form used for equality, hashing and derived ids.
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({:?})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// --- ConversationId ---

static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

/// Identifier scoping a conversation on the service side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Id of the duplex conversation between two identities.
    ///
    /// Independent of argument order and case, so it survives reconnects and
    /// matches whichever side opened the channel.
    pub fn duplex(a: &Identity, b: &Identity) -> Self {
        let (mut first, mut second) = (a.folded(), b.folded());
        if second < first {
            std::mem::swap(&mut first, &mut second);
        }
        Self(format!("dm:{first}:{second}"))
    }

    /// A fresh request/reply token: milliseconds since the Unix epoch, bumped
    /// so that two tokens generated in the same millisecond still differ.
    pub fn generate() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = LAST_TOKEN
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        Self(now.max(previous + 1).to_string())
    }

    /// The raw id as sent to services.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// --- Credential ---

/// A bearer token issued by the authentication service.
#[derive(Clone)]
pub struct Credential {
    token: String,
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
}

impl Credential {
    /// Wrap a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw token for `Authorization: Bearer` headers.
    pub fn bearer(&self) -> &str {
        &self.token
    }

    /// Decode the `sub` claim of the token payload.
    ///
    /// The signature is not checked here; services validate it on every call.
    pub fn subject(&self) -> Result<Identity, AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        let payload = self
            .token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::MalformedToken("expected three segments".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {e}")))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("payload is not JSON: {e}")))?;
        match claims.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(Identity::new(sub)),
            _ => Err(AuthError::MalformedToken("missing sub claim".into())),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// --- AppContext ---

/// The signed-in user, passed explicitly into everything that needs it.
#[derive(Debug, Clone)]
pub struct AppContext {
    identity: Identity,
    credential: Credential,
}

impl AppContext {
    /// Build a context from an already-known identity.
    pub fn new(identity: Identity, credential: Credential) -> Self {
        Self {
            identity,
            credential,
        }
    }

    /// Build a context whose identity is the token's subject.
    pub fn from_token(token: impl Into<String>) -> Result<Self, AuthError> {
        let credential = Credential::new(token);
        let identity = credential.subject()?;
        Ok(Self::new(identity, credential))
    }

    /// The local identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The bearer credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn token_for(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_identity_equality_ignores_case() {
        assert_eq!(Identity::from("Alice"), Identity::from("alice"));
        assert!(Identity::from("BOB").matches("bob"));
        assert_ne!(Identity::from("bob"), Identity::from("bobby"));
    }

    #[test]
    fn test_identity_hash_is_case_insensitive() {
        let mut set = HashSet::new();
        set.insert(Identity::from("Alice"));
        assert!(set.contains(&Identity::from("ALICE")));
    }

    #[test]
    fn test_identity_keeps_original_spelling() {
        assert_eq!(Identity::from("Alice").to_string(), "Alice");
    }

    #[test]
    fn test_duplex_id_is_symmetric_and_case_insensitive() {
        let a = ConversationId::duplex(&"Bob".into(), &"alice".into());
        let b = ConversationId::duplex(&"ALICE".into(), &"bob".into());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "dm:alice:bob");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<_> = (0..100).map(|_| ConversationId::generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_subject_is_read_from_token() {
        let ctx = AppContext::from_token(token_for(r#"{"sub":"bob","exp":1}"#)).unwrap();
        assert_eq!(ctx.identity().as_str(), "bob");
        assert!(ctx.credential().bearer().starts_with("eyJ"));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let token = format!(
            "h.{}==.s",
            URL_SAFE_NO_PAD.encode(r#"{"sub":"carol"}"#)
        );
        assert_eq!(Credential::new(token).subject().unwrap().as_str(), "carol");
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        assert_eq!(
            Credential::new("").subject().unwrap_err(),
            AuthError::MissingToken
        );
        assert!(matches!(
            Credential::new("not-a-jwt").subject(),
            Err(AuthError::MalformedToken(_))
        ));
        assert!(matches!(
            Credential::new(token_for(r#"{"exp":1}"#)).subject(),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("secret-token");
        assert!(!format!("{cred:?}").contains("secret"));
    }
}
