use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::ports::{ExpenseLedger, ExpenseNormalizer};
use crate::{expenses, participants};

#[derive(Clone)]
pub struct ServerState {
    pub normalizer: Arc<dyn ExpenseNormalizer>,
    pub ledger: Arc<dyn ExpenseLedger>,
    api_token: Arc<str>,
}

impl ServerState {
    #[must_use]
    pub fn new(
        normalizer: Arc<dyn ExpenseNormalizer>,
        ledger: Arc<dyn ExpenseLedger>,
        api_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            normalizer,
            ledger,
            api_token: api_token.into(),
        }
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if header.token() != state.api_token.as_ref() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/expenses", post(expenses::create))
        .route("/expenses/{id}", axum::routing::delete(expenses::remove))
        .route("/participants", get(participants::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(
    normalizer: Arc<dyn ExpenseNormalizer>,
    ledger: Arc<dyn ExpenseLedger>,
    api_token: String,
) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(normalizer, ledger, api_token, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    normalizer: Arc<dyn ExpenseNormalizer>,
    ledger: Arc<dyn ExpenseLedger>,
    api_token: String,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(normalizer, ledger, api_token);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    normalizer: Arc<dyn ExpenseNormalizer>,
    ledger: Arc<dyn ExpenseLedger>,
    api_token: String,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(normalizer, ledger, api_token, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
