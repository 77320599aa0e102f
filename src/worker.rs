//! Backend requests executed off the UI loop.
//!
//! The event loop hands a [`Request`] to [`spawn`]; the outcome comes back
//! as a [`Response`] on the channel and is applied in arrival order.

use crate::api::{ApiError, Backend};
use crate::form::Mutation;
use crate::model::ErrorRecord;
use crate::store;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

/// Work requested by the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Full-set refresh
    Load,

    /// Create, update or delete a record
    Mutate(Mutation),

    /// Open an admin session
    Login { password: String },

    Logout,
}

/// Outcome of a [`Request`]
#[derive(Debug)]
pub enum Response {
    Loaded(Result<Vec<ErrorRecord>, ApiError>),

    Mutated {
        mutation: Mutation,
        result: Result<(), ApiError>,
    },

    LoggedIn(Result<(), ApiError>),

    LoggedOut(Result<(), ApiError>),
}

/// Run one request against the backend.
pub async fn perform<B: Backend>(backend: &B, request: Request) -> Response {
    match request {
        Request::Load => Response::Loaded(store::fetch(backend).await),
        Request::Mutate(mutation) => {
            tracing::info!(verb = mutation.verb(), code = mutation.code(), "submitting mutation");
            let result = match &mutation {
                Mutation::Create(record) => backend.create(record).await,
                Mutation::Update { code, record } => backend.update(code, record).await,
                Mutation::Delete { code } => backend.delete(code).await,
            };
            if let Err(e) = &result {
                tracing::warn!(verb = mutation.verb(), code = mutation.code(), error = %e, "mutation failed");
            }
            Response::Mutated { mutation, result }
        }
        Request::Login { password } => Response::LoggedIn(backend.login(&password).await),
        Request::Logout => Response::LoggedOut(backend.logout().await),
    }
}

/// Channels between the TUI loop and request tasks.
pub struct WorkerChannels {
    pub response_tx: Sender<Response>,
    pub response_rx: Receiver<Response>,
}

impl WorkerChannels {
    pub fn new() -> Self {
        let (response_tx, response_rx) = std::sync::mpsc::channel();
        Self {
            response_tx,
            response_rx,
        }
    }
}

impl Default for WorkerChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute `request` on the tokio runtime; no de-duplication, no cancellation.
pub fn spawn<B: Backend>(backend: Arc<B>, request: Request, tx: Sender<Response>) {
    tokio::spawn(async move {
        let response = perform(backend.as_ref(), request).await;
        // The receiver only disappears when the app is shutting down.
        let _ = tx.send(response);
    });
}
