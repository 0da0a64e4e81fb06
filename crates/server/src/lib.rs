use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use ledger::LedgerError;
use normalizer::NormalizeError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod expenses;
mod participants;
pub mod ports;
mod server;

pub mod types {
    pub mod expense {
        pub use api_types::expense::{ExpenseCreated, ExpenseNew, ShareView};
    }

    pub mod roster {
        pub use api_types::roster::{Participant, Roster};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Normalizer(NormalizeError),
    Ledger(LedgerError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidRequest(_) | EngineError::UnbalancedSplit(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Server { status, .. } if *status == StatusCode::NOT_FOUND => {
            StatusCode::NOT_FOUND
        }
        LedgerError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Network(_) | LedgerError::Server { .. } | LedgerError::Malformed(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Rejected(detail) => detail,
        LedgerError::Server { status, message } if status == StatusCode::NOT_FOUND => {
            tracing::warn!("ledger lookup failed: {message}");
            "expense not found".to_string()
        }
        other => {
            tracing::error!("ledger call failed: {other}");
            "ledger service unavailable".to_string()
        }
    }
}

fn message_for_normalize_error(err: NormalizeError) -> String {
    tracing::error!("normalization failed: {err}");
    "could not understand the expense description".to_string()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), err.to_string()),
            ServerError::Normalizer(err) => {
                (StatusCode::BAD_GATEWAY, message_for_normalize_error(err))
            }
            ServerError::Ledger(err) => {
                (status_for_ledger_error(&err), message_for_ledger_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<NormalizeError> for ServerError {
    fn from(value: NormalizeError) -> Self {
        Self::Normalizer(value)
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
