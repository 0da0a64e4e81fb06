//! Client for the remote Splitwise-style ledger service.
//!
//! The ledger owns the participant roster and the persisted expenses; this
//! crate only reads the roster, submits finished allocations, and deletes
//! expenses by id. Amounts cross this wire as two-decimal strings, the
//! format the service expects.

use std::fmt;

use api_types::roster::{Participant, Roster};
use chrono::{DateTime, FixedOffset};
use engine::{Allocation, Money};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Hosted API of the ledger service; override for tests or mirrors.
pub const DEFAULT_ENDPOINT: &str = "https://secure.splitwise.com/api/v3.0";

/// Identifier the ledger assigns to a created expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExpenseId(i64);

impl ExpenseId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for ExpenseId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An expense as acknowledged by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedExpense {
    pub id: ExpenseId,
    pub description: String,
    /// Total cost echoed back by the service.
    pub cost: Money,
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    /// The service answered 200 but refused the operation; the detail comes
    /// from its `errors` envelope.
    #[error("ledger rejected the request: {0}")]
    Rejected(String),
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug)]
pub struct SplitwiseLedger {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl RawUser {
    fn into_participant(self) -> Participant {
        let name = format!(
            "{} {}",
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default()
        );
        Participant {
            id: self.id,
            name: name.trim().to_string(),
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentUserEnvelope {
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct FriendsEnvelope {
    friends: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawExpense {
    id: i64,
    description: Option<String>,
    cost: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateExpenseEnvelope {
    #[serde(default)]
    expenses: Vec<RawExpense>,
    #[serde(default)]
    errors: Value,
}

#[derive(Debug, Deserialize)]
struct DeleteExpenseEnvelope {
    success: bool,
    #[serde(default)]
    errors: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    errors: Value,
}

impl SplitwiseLedger {
    /// `client` should already carry the service's bearer token as a default
    /// header; the app builds it that way.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, LedgerError> {
        let resp = self.client.get(self.url(path)).send().await?;
        read_json(resp).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, LedgerError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        read_json(resp).await
    }

    pub async fn current_user(&self) -> Result<Participant, LedgerError> {
        let envelope: CurrentUserEnvelope = self.get_json("get_current_user").await?;
        Ok(envelope.user.into_participant())
    }

    pub async fn friends(&self) -> Result<Vec<Participant>, LedgerError> {
        let envelope: FriendsEnvelope = self.get_json("get_friends").await?;
        Ok(envelope
            .friends
            .into_iter()
            .map(RawUser::into_participant)
            .collect())
    }

    /// Fetches the current user and their friends as one roster.
    pub async fn roster(&self) -> Result<Roster, LedgerError> {
        let current_user = self.current_user().await?;
        let friends = self.friends().await?;
        Ok(Roster {
            current_user,
            friends,
        })
    }

    /// Submits a finished allocation as one expense.
    ///
    /// Shares go out in the service's indexed form (`users__0__user_id`,
    /// `users__0__paid_share`, ...), every amount as a two-decimal string.
    /// A 200 whose `errors` object is non-empty is a rejection, not a
    /// success; the service uses that envelope for validation failures.
    pub async fn create_expense(
        &self,
        allocation: &Allocation,
        description: &str,
    ) -> Result<CreatedExpense, LedgerError> {
        let body = expense_body(allocation, description);
        let envelope: CreateExpenseEnvelope = self
            .post_json("create_expense", &Value::Object(body))
            .await?;

        if let Some(rejection) = flatten_errors(&envelope.errors) {
            return Err(LedgerError::Rejected(rejection));
        }

        let expense = envelope
            .expenses
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::Malformed("response carries no expense".to_string()))?;
        tracing::debug!(expense_id = expense.id, "ledger accepted expense");

        let cost = match expense.cost {
            Some(ref raw) => raw
                .parse()
                .map_err(|_| LedgerError::Malformed(format!("unparsable cost: {raw:?}")))?,
            None => allocation.total(),
        };
        let created_at = expense
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());

        Ok(CreatedExpense {
            id: ExpenseId::new(expense.id),
            description: expense
                .description
                .unwrap_or_else(|| description.to_string()),
            cost,
            created_at,
        })
    }

    /// Deletes a previously created expense.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), LedgerError> {
        let envelope: DeleteExpenseEnvelope = self
            .post_json(&format!("delete_expense/{id}"), &json!({}))
            .await?;

        if !envelope.success {
            let detail =
                flatten_errors(&envelope.errors).unwrap_or_else(|| "deletion refused".to_string());
            return Err(LedgerError::Rejected(detail));
        }
        tracing::debug!(expense_id = id.value(), "ledger deleted expense");
        Ok(())
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
) -> Result<T, LedgerError> {
    let status = resp.status();
    if !status.is_success() {
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body
                .error
                .or_else(|| flatten_errors(&body.errors))
                .unwrap_or_else(|| "ledger error".to_string()),
            Err(_) => "ledger error".to_string(),
        };
        return Err(LedgerError::Server { status, message });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map_err(|err| LedgerError::Malformed(format!("unexpected response shape: {err}")))
}

fn expense_body(allocation: &Allocation, description: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("cost".to_string(), json!(allocation.total().to_string()));
    body.insert("description".to_string(), json!(description));
    for (index, share) in allocation.shares().iter().enumerate() {
        body.insert(
            format!("users__{index}__user_id"),
            json!(share.participant_id.value()),
        );
        body.insert(
            format!("users__{index}__paid_share"),
            json!(share.paid.to_string()),
        );
        body.insert(
            format!("users__{index}__owed_share"),
            json!(share.owed.to_string()),
        );
    }
    body
}

/// Flattens the service's `errors` object (`{"base": ["msg", ...]}`) into
/// one line; `None` when the envelope carries no error.
fn flatten_errors(errors: &Value) -> Option<String> {
    let fields = errors.as_object()?;
    if fields.is_empty() {
        return None;
    }

    let mut messages = Vec::new();
    for (field, value) in fields {
        match value {
            Value::Array(items) => {
                messages.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            Value::String(text) => messages.push(text.clone()),
            other => messages.push(format!("{field}: {other}")),
        }
    }
    if messages.is_empty() {
        messages.push(errors.to_string());
    }
    Some(messages.join("; "))
}
