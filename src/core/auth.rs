// src/core/auth.rs

//! Anti-forgery nonces and role capabilities guarding scan and reset.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::core::error::AuthorizationError;

/// Action name a scan step nonce is scoped to.
pub const SCAN_ACTION: &str = "scan_action";
/// Action name a reset nonce is scoped to.
pub const RESET_ACTION: &str = "reset_action";

const NONCE_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Subscriber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    ManageOptions,
    Read,
}

impl Role {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageOptions => matches!(self, Role::Administrator),
            Capability::Read => true,
        }
    }
}

/// The identity a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user: String,
    pub role: Role,
}

/// What a request presents: who it is, plus the nonce it was handed.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub caller: Caller,
    pub nonce: String,
}

/// Issues and verifies nonces bound to an action, a user and a time window.
///
/// A nonce stays valid for the tick it was issued in and the following one,
/// where a tick is half the configured lifetime.
#[derive(Clone)]
pub struct NonceIssuer {
    key: Vec<u8>,
    tick_length: Duration,
}

impl std::fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceIssuer")
            .field("tick_length", &self.tick_length)
            .finish_non_exhaustive()
    }
}

impl NonceIssuer {
    pub fn new(key: impl Into<Vec<u8>>, lifetime: Duration) -> Self {
        let half = lifetime / 2;
        Self {
            key: key.into(),
            tick_length: half.max(Duration::from_secs(1)),
        }
    }

    /// Issuer with a random key; nonces only verify within this process.
    pub fn ephemeral(lifetime: Duration) -> Self {
        Self::new(rand::random::<[u8; 32]>().to_vec(), lifetime)
    }

    fn tick_at(&self, now: SystemTime) -> u64 {
        let elapsed = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        elapsed.as_secs() / self.tick_length.as_secs().max(1)
    }

    fn digest(&self, tick: u64, action: &str, user: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(tick.to_string().as_bytes());
        mac.update(b"|");
        mac.update(action.as_bytes());
        mac.update(b"|");
        mac.update(user.as_bytes());

        let mut encoded = hex::encode(mac.finalize().into_bytes());
        encoded.truncate(NONCE_LEN);
        encoded
    }

    pub fn create(&self, action: &str, caller: &Caller) -> String {
        self.create_at(action, caller, SystemTime::now())
    }

    pub fn create_at(&self, action: &str, caller: &Caller, now: SystemTime) -> String {
        self.digest(self.tick_at(now), action, &caller.user)
    }

    pub fn verify(&self, action: &str, caller: &Caller, nonce: &str) -> bool {
        self.verify_at(action, caller, nonce, SystemTime::now())
    }

    pub fn verify_at(&self, action: &str, caller: &Caller, nonce: &str, now: SystemTime) -> bool {
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let tick = self.tick_at(now);
        [tick, tick.saturating_sub(1)]
            .iter()
            .any(|t| constant_time_eq(self.digest(*t, action, &caller.user).as_bytes(), nonce.as_bytes()))
    }

    /// Checks the nonce for `action`, then the capability. Nothing else runs
    /// unless both pass.
    pub fn authorize(
        &self,
        credentials: &Credentials,
        action: &str,
        capability: Capability,
    ) -> Result<(), AuthorizationError> {
        if !self.verify(action, &credentials.caller, &credentials.nonce) {
            warn!(user = %credentials.caller.user, action, "Rejected request with invalid nonce.");
            return Err(AuthorizationError::InvalidNonce);
        }
        if !credentials.caller.role.has(capability) {
            warn!(user = %credentials.caller.user, role = %credentials.caller.role, %capability, "Rejected request lacking capability.");
            return Err(AuthorizationError::MissingCapability);
        }
        debug!(user = %credentials.caller.user, action, "Request authorized.");
        Ok(())
    }

    /// Convenience for in-process callers: a fresh nonce for `action`.
    pub fn credentials_for(&self, action: &str, caller: &Caller) -> Credentials {
        Credentials {
            caller: caller.clone(),
            nonce: self.create(action, caller),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn admin() -> Caller {
        Caller { user: "admin".into(), role: Role::Administrator }
    }

    fn issuer() -> NonceIssuer {
        NonceIssuer::new("test-key", Duration::from_secs(86_400))
    }

    #[test]
    fn nonce_is_scoped_to_action_and_user() {
        let issuer = issuer();
        let nonce = issuer.create(SCAN_ACTION, &admin());
        assert!(issuer.verify(SCAN_ACTION, &admin(), &nonce));
        assert!(!issuer.verify(RESET_ACTION, &admin(), &nonce));

        let other = Caller { user: "someone".into(), role: Role::Administrator };
        assert!(!issuer.verify(SCAN_ACTION, &other, &nonce));
    }

    #[test]
    fn nonce_expires_after_two_ticks() {
        let issuer = issuer();
        let issued = UNIX_EPOCH + Duration::from_secs(1_000_000 * 43_200);
        let nonce = issuer.create_at(SCAN_ACTION, &admin(), issued);

        let next_tick = issued + Duration::from_secs(43_200);
        assert!(issuer.verify_at(SCAN_ACTION, &admin(), &nonce, next_tick));

        let two_ticks = issued + Duration::from_secs(2 * 43_200);
        assert!(!issuer.verify_at(SCAN_ACTION, &admin(), &nonce, two_ticks));
    }

    #[test]
    fn authorize_checks_nonce_then_capability() {
        let issuer = issuer();
        let editor = Caller { user: "ed".into(), role: Role::Editor };

        let bad_nonce = Credentials { caller: admin(), nonce: "x".repeat(NONCE_LEN) };
        assert_eq!(
            issuer.authorize(&bad_nonce, SCAN_ACTION, Capability::ManageOptions),
            Err(AuthorizationError::InvalidNonce)
        );

        let editor_creds = issuer.credentials_for(SCAN_ACTION, &editor);
        assert_eq!(
            issuer.authorize(&editor_creds, SCAN_ACTION, Capability::ManageOptions),
            Err(AuthorizationError::MissingCapability)
        );

        let admin_creds = issuer.credentials_for(SCAN_ACTION, &admin());
        assert!(issuer.authorize(&admin_creds, SCAN_ACTION, Capability::ManageOptions).is_ok());
    }

    #[test]
    fn roles_parse_from_config_strings() {
        assert_eq!(Role::from_str("administrator").unwrap(), Role::Administrator);
        assert_eq!(Role::Subscriber.to_string(), "subscriber");
        assert!(Role::from_str("root").is_err());
    }
}
