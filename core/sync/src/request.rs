//! Typed requests and responses for driving the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use vaultsync_api::{validate_status_response, AuthLogEntry, SessionDescriptor, StatusResponse};
use vaultsync_common::{DomainLists, Error, ErrorKind, Result, Revision, ValidationIssue};
use vaultsync_crypto::DerivedKey;
use vaultsync_vault::{Credential, Materializer, VaultHandle};

use crate::engine::{EngineState, SyncOutcome, VaultSyncEngine, VaultUpdate};

/// Text form of a [`VaultUpdate`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePayload {
    #[serde(default)]
    pub blob: Option<String>,
    /// Base64 encoded derived key.
    #[serde(default)]
    pub derived_key: Option<String>,
    #[serde(default)]
    pub domains: Option<DomainLists>,
    #[serde(default)]
    pub revision: Option<Revision>,
}

impl fmt::Debug for StorePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorePayload")
            .field("blob", &self.blob.as_ref().map(|blob| blob.len()))
            .field("derived_key", &self.derived_key.as_ref().map(|_| "[REDACTED]"))
            .field("domains", &self.domains)
            .field("revision", &self.revision)
            .finish()
    }
}

impl TryFrom<StorePayload> for VaultUpdate {
    type Error = Error;

    fn try_from(payload: StorePayload) -> Result<Self> {
        let derived_key = payload
            .derived_key
            .as_deref()
            .map(DerivedKey::from_encoded)
            .transpose()?;

        Ok(VaultUpdate {
            blob: payload.blob,
            derived_key,
            domains: payload.domains,
            revision: payload.revision,
        })
    }
}

/// Every operation a host can ask of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    Store(StorePayload),
    Retrieve,
    Clear,
    Sync,
    PushLocal,
    Status,
    State,
    Logout,
    ListSessions,
    RevokeSession { id: String },
    AuthLogs,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Store(_) => "store",
            Request::Retrieve => "retrieve",
            Request::Clear => "clear",
            Request::Sync => "sync",
            Request::PushLocal => "pushLocal",
            Request::Status => "status",
            Request::State => "state",
            Request::Logout => "logout",
            Request::ListSessions => "listSessions",
            Request::RevokeSession { .. } => "revokeSession",
            Request::AuthLogs => "authLogs",
        }
    }
}

/// Decrypted vault contents as returned to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultView {
    pub credentials: Vec<Credential>,
    pub domains: DomainLists,
    pub revision: Revision,
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Done,
    Vault(VaultView),
    Synced { outcome: SyncOutcome },
    Uploaded { revision: Revision },
    Status {
        status: StatusResponse,
        issue: Option<ValidationIssue>,
    },
    State { state: EngineState },
    Sessions { sessions: Vec<SessionDescriptor> },
    AuthLogs { entries: Vec<AuthLogEntry> },
    Error { kind: ErrorKind, message: String },
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Response::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl<M: Materializer> VaultSyncEngine<M> {
    /// Run one request. Failures become [`Response::Error`].
    pub async fn dispatch(&self, request: Request) -> Response {
        let name = request.name();
        debug!("Dispatching {}", name);

        match self.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!("{} failed: {}", name, err);
                err.into()
            }
        }
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let response = match request {
            Request::Store(payload) => {
                self.store(payload.try_into()?).await?;
                Response::Done
            }
            Request::Retrieve => {
                let retrieved = self.retrieve().await?;
                Response::Vault(VaultView {
                    credentials: retrieved.database.credentials()?,
                    domains: retrieved.domains,
                    revision: retrieved.revision,
                })
            }
            Request::Clear => {
                self.clear().await?;
                Response::Done
            }
            Request::Sync => Response::Synced {
                outcome: self.sync().await?,
            },
            Request::PushLocal => Response::Uploaded {
                revision: self.push_local().await?,
            },
            Request::Status => {
                let status = self.gateway().get_status().await?;
                let issue = validate_status_response(&status, self.gateway().config());
                Response::Status { status, issue }
            }
            Request::State => Response::State {
                state: self.state().await?,
            },
            Request::Logout => {
                self.logout().await?;
                Response::Done
            }
            Request::ListSessions => Response::Sessions {
                sessions: self.gateway().list_sessions().await?,
            },
            Request::RevokeSession { id } => {
                self.gateway().revoke_session(&id).await?;
                Response::Done
            }
            Request::AuthLogs => Response::AuthLogs {
                entries: self.gateway().auth_logs().await?,
            },
        };
        Ok(response)
    }
}
