//! Participants API endpoints

use api_types::roster::Roster;
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Roster>, ServerError> {
    let roster = state.ledger.roster().await?;
    Ok(Json(roster))
}
