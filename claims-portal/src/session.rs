//! Who is logged in, and the state that goes away at logout.

use claims_view::{RfiNoteCache, Submitter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ApiError, PortalError, Result, StorageError};
use crate::storage::{LocalStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Hospital,
    Patient,
    Insurance,
}

impl Role {
    /// Login probing order.
    pub const LOGIN_ORDER: [Role; 3] = [Role::Hospital, Role::Patient, Role::Insurance];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Patient => "patient",
            Self::Insurance => "insurance",
        }
    }

    pub fn login_path(self) -> String {
        format!("/api/{}-login", self.as_str())
    }

    /// RFI responses are only sent by hospitals and patients.
    pub fn rfi_path(self) -> Option<String> {
        match self {
            Self::Hospital | Self::Patient => Some(format!("/api/rfi-{}", self.as_str())),
            Self::Insurance => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hospital" => Ok(Self::Hospital),
            "patient" => Ok(Self::Patient),
            "insurance" => Ok(Self::Insurance),
            other => Err(PortalError::InvalidRequest(format!("unknown role {:?}", other))),
        }
    }
}

/// The `user` object returned by a login endpoint, kept as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserData(pub Map<String, Value>);

impl UserData {
    /// Field as text; numbers are rendered, blanks are absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.text("username").or_else(|| self.text("name"))
    }

    pub fn role(&self) -> Option<Role> {
        self.text("role").and_then(|r| r.to_lowercase().parse().ok())
    }

    pub fn hospital_id(&self) -> Option<String> {
        self.text("hospitalid")
    }

    pub fn patient_id(&self) -> Option<String> {
        self.text("patient_id")
    }

    /// Name the insurer screens query by: `insurance_name`, then
    /// `insuranceProvider`, then `insurance_id`.
    pub fn insurer_name(&self) -> Option<String> {
        self.text("insurance_name")
            .or_else(|| self.text("insuranceProvider"))
            .or_else(|| self.text("insurance_id"))
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            name: self.display_name().unwrap_or_default(),
            patient_id: self.patient_id().unwrap_or_default(),
        }
    }
}

/// Session state for the single operator of this portal.
///
/// Set at login, cleared at logout. The token is read from the store on
/// every call so a logout elsewhere takes effect immediately.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn LocalStore>,
    rfi_notes: RfiNoteCache,
}

impl SessionContext {
    /// Restore the persisted RFI notes, if any.
    pub async fn load(store: Arc<dyn LocalStore>) -> Result<Self> {
        let rfi_notes = match store.get(keys::RFI_NOTES).await? {
            Some(value) => match serde_json::from_value::<BTreeMap<String, String>>(value) {
                Ok(map) => RfiNoteCache::from_map(map),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed persisted RFI notes");
                    RfiNoteCache::new()
                }
            },
            None => RfiNoteCache::new(),
        };

        Ok(Self { store, rfi_notes })
    }

    /// Store the token and user. The role that accepted the login is
    /// recorded on the user when the server did not send one.
    pub async fn begin(&self, role: Role, token: &str, user: &UserData) -> Result<()> {
        let mut user = user.clone();
        if user.role().is_none() {
            user.0
                .insert("role".to_string(), Value::String(role.as_str().to_string()));
        }

        self.store
            .set(keys::AUTH_TOKEN, Value::String(token.to_string()))
            .await?;
        self.store
            .set(keys::USER_DATA, serde_json::to_value(&user).map_err(StorageError::from)?)
            .await?;
        info!(role = %role, user = ?user.display_name(), "Session started");
        Ok(())
    }

    pub async fn end(&self) -> Result<()> {
        for key in [keys::AUTH_TOKEN, keys::USER_DATA, keys::RFI_NOTES] {
            self.store.remove(key).await?;
        }
        self.rfi_notes.clear();
        info!("Session ended");
        Ok(())
    }

    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(keys::AUTH_TOKEN)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|t| !t.is_empty()))
    }

    pub async fn require_token(&self) -> Result<String> {
        self.token()
            .await?
            .ok_or(PortalError::Api(ApiError::NotAuthenticated))
    }

    pub async fn user(&self) -> Result<Option<UserData>> {
        let Some(value) = self.store.get(keys::USER_DATA).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Stored user data is not an object");
                Ok(None)
            }
        }
    }

    pub async fn require_user(&self) -> Result<UserData> {
        self.user()
            .await?
            .ok_or(PortalError::Api(ApiError::NotAuthenticated))
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token().await?.is_some())
    }

    pub fn rfi_notes(&self) -> &RfiNoteCache {
        &self.rfi_notes
    }

    pub async fn persist_rfi_notes(&self) -> Result<()> {
        let map = serde_json::to_value(self.rfi_notes.to_map())
            .map_err(StorageError::from)?;
        self.store.set(keys::RFI_NOTES, map).await?;
        Ok(())
    }
}
