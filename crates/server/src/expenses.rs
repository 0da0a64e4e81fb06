//! Expenses API endpoints

use api_types::expense::{ExpenseCreated, ExpenseNew, ShareView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    Allocation, AllocationRequest, EngineError, Money, Participant, ParticipantId, SplitPolicy,
    SplitValue, allocate,
};
use ledger::{CreatedExpense, ExpenseId};
use normalizer::DraftExpense;

use crate::{ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ServerError::Generic("message is required".to_string()));
    }

    let roster = state.ledger.roster().await?;
    let draft = state.normalizer.draft(message, &roster).await?;
    tracing::debug!(
        amount = draft.amount,
        split_type = %draft.split_type,
        participants = draft.split_with.len(),
        "draft normalized"
    );

    let request = allocation_request(&draft)?;
    let allocation = allocate(&request)?;
    let created = state
        .ledger
        .create_expense(&allocation, &draft.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(expense_created(created, allocation)),
    ))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete_expense(ExpenseId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the engine request from a draft. The payer fronts the whole
/// amount; every `split_with` entry becomes a participant in draft order,
/// including a repeated payer, whose declared split the engine picks up.
fn allocation_request(draft: &DraftExpense) -> Result<AllocationRequest, EngineError> {
    let policy = SplitPolicy::try_from(draft.split_type.as_str())?;
    let total = Money::from_major_f64(draft.amount)?;
    let payer_id = ParticipantId::new(draft.paid_by.user_id);

    let mut request = AllocationRequest::new(total, policy, payer_id);
    for share in &draft.split_with {
        let split = match (policy, share.split_value) {
            (SplitPolicy::Equal, _) | (_, None) => None,
            (SplitPolicy::Percentage, Some(value)) => Some(SplitValue::percent_from_f64(value)?),
            (SplitPolicy::Exact, Some(value)) => Some(SplitValue::amount_from_f64(value)?),
        };

        let mut participant = Participant::new(ParticipantId::new(share.user_id));
        if let Some(split) = split {
            participant = participant.split(split);
        }
        request = request.participant(participant);
    }

    Ok(request)
}

fn expense_created(created: CreatedExpense, allocation: Allocation) -> ExpenseCreated {
    let shares = allocation
        .into_shares()
        .into_iter()
        .map(|share| ShareView {
            participant_id: share.participant_id.value(),
            paid_minor: share.paid.cents(),
            owed_minor: share.owed.cents(),
        })
        .collect();

    ExpenseCreated {
        id: created.id.value(),
        description: created.description,
        cost_minor: created.cost.cents(),
        shares,
        created_at: created.created_at,
    }
}

#[cfg(test)]
mod tests {
    use normalizer::{DraftParticipant, DraftShare};

    use super::*;

    fn draft(split_type: &str, split_values: &[Option<f64>]) -> DraftExpense {
        let split_with = split_values
            .iter()
            .enumerate()
            .map(|(i, value)| DraftShare {
                user_id: 200 + i as i64,
                name: format!("Friend {i}"),
                split_value: *value,
            })
            .collect();

        DraftExpense {
            amount: 30.0,
            description: "Pizza".to_string(),
            split_type: split_type.to_string(),
            paid_by: DraftParticipant {
                user_id: 100,
                name: "Payer".to_string(),
            },
            split_with,
        }
    }

    #[test]
    fn equal_draft_ignores_split_values() {
        let request = allocation_request(&draft("equal", &[Some(99.0), None])).unwrap();

        assert_eq!(request.policy, SplitPolicy::Equal);
        assert_eq!(request.total, Money::new(3000));
        assert_eq!(request.payer_id, ParticipantId::new(100));
        assert_eq!(request.participants.len(), 2);
        assert!(request.participants.iter().all(|p| p.split.is_none()));
    }

    #[test]
    fn percentage_draft_quantizes_to_basis_points() {
        let request = allocation_request(&draft("percentage", &[Some(40.0)])).unwrap();

        assert_eq!(
            request.participants[0].split,
            Some(SplitValue::Percent(4000))
        );
    }

    #[test]
    fn exact_draft_quantizes_to_cents() {
        let request = allocation_request(&draft("exact", &[Some(12.5)])).unwrap();

        assert_eq!(
            request.participants[0].split,
            Some(SplitValue::Amount(Money::new(1250)))
        );
    }

    #[test]
    fn unknown_split_type_is_rejected() {
        let err = allocation_request(&draft("proportional", &[None])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }
}
