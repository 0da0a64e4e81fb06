//! Share allocation: the one write operation the engine exposes.
//!
//! [`allocate`] is a pure function from an [`AllocationRequest`] to an
//! [`Allocation`]. Same request, same result; no clock, no randomness, no
//! I/O. Anything wrong with the request comes back as an error and nothing
//! is ever partially applied.

use std::collections::HashSet;

use crate::policy::{FULL_PERCENT_BP, format_bp};
use crate::{
    AllocationRequest, EngineError, Money, Participant, ParticipantId, ResultEngine, SplitPolicy,
    SplitValue,
};

/// Accepted drift between declared percentages and 100%, in basis points.
const PERCENT_TOLERANCE_BP: i64 = 1;
/// Accepted drift between declared exact amounts and the total, in cents.
const EXACT_TOLERANCE_CENTS: i64 = 1;

/// One participant's slice of an [`Allocation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShareEntry {
    pub participant_id: ParticipantId,
    /// Amount this participant fronted. The payer's equals the request
    /// total, everyone else's is zero.
    pub paid: Money,
    /// Amount this participant is responsible for.
    pub owed: Money,
}

/// Result of [`allocate`]: one entry per person, payer first, then the
/// other participants in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    total: Money,
    shares: Vec<ShareEntry>,
}

impl Allocation {
    /// The request total the shares were computed from.
    #[must_use]
    pub fn total(&self) -> Money {
        self.total
    }

    #[must_use]
    pub fn shares(&self) -> &[ShareEntry] {
        &self.shares
    }

    #[must_use]
    pub fn into_shares(self) -> Vec<ShareEntry> {
        self.shares
    }
}

/// Splits `request.total` among the payer and the other participants under
/// the request's policy.
///
/// The payer always pays the full total and owes their own share. Under
/// `Equal` every share is the half-up rounding of `total / n` except the
/// last participant's, which is adjusted so the shares sum to the total
/// exactly. Under `Percentage` and `Exact` the declared values are applied
/// verbatim (after half-up rounding to cents for percentages); a rounding
/// drift of up to 0.01 against the total is accepted and left in place.
///
/// A missing split value for the payer is inferred: the rest of 100% under
/// `Percentage`, the rest of the total under `Exact`.
///
/// # Errors
///
/// [`EngineError::InvalidRequest`] when a structural precondition fails:
/// non-positive total, fewer than two people, duplicate participant ids,
/// missing or ill-typed split values, values out of range, or an inferred
/// payer share below zero. [`EngineError::UnbalancedSplit`] when the
/// declared shares do not reconcile with the total within the tolerance.
pub fn allocate(request: &AllocationRequest) -> ResultEngine<Allocation> {
    if !request.total.is_positive() {
        return Err(EngineError::InvalidRequest(format!(
            "total must be positive, got {}",
            request.total
        )));
    }

    let (payer_split, others) = partition_participants(request)?;
    if others.is_empty() {
        return Err(EngineError::InvalidRequest(
            "at least one participant besides the payer is required".to_string(),
        ));
    }

    // Owed amounts in canonical order: payer first, then the others as given.
    let owed = match request.policy {
        SplitPolicy::Equal => equal_shares(request.total, 1 + others.len())?,
        SplitPolicy::Percentage => {
            percentage_shares(request.total, request.payer_id, payer_split, &others)?
        }
        SplitPolicy::Exact => exact_shares(request.total, request.payer_id, payer_split, &others)?,
    };

    let mut shares = Vec::with_capacity(1 + others.len());
    shares.push(ShareEntry {
        participant_id: request.payer_id,
        paid: request.total,
        owed: owed[0],
    });
    for (participant, owed) in others.iter().zip(&owed[1..]) {
        shares.push(ShareEntry {
            participant_id: participant.id,
            paid: Money::ZERO,
            owed: *owed,
        });
    }

    Ok(Allocation {
        total: request.total,
        shares,
    })
}

/// Separates the payer's declared split from the other participants,
/// rejecting duplicate ids. The payer may be absent from the list.
fn partition_participants(
    request: &AllocationRequest,
) -> ResultEngine<(Option<SplitValue>, Vec<Participant>)> {
    let mut seen: HashSet<ParticipantId> = HashSet::with_capacity(request.participants.len());
    let mut payer_split = None;
    let mut others = Vec::with_capacity(request.participants.len());

    for participant in &request.participants {
        if !seen.insert(participant.id) {
            return Err(EngineError::InvalidRequest(format!(
                "duplicate participant id: {}",
                participant.id
            )));
        }
        if participant.id == request.payer_id {
            payer_split = participant.split;
        } else {
            others.push(*participant);
        }
    }

    Ok((payer_split, others))
}

/// Even shares for `participants` people, payer first. Every entry is the
/// half-up rounding of `total / participants` except the last, which takes
/// whatever keeps the sum equal to the total.
fn equal_shares(total: Money, participants: usize) -> ResultEngine<Vec<Money>> {
    let overflow = || EngineError::InvalidRequest("amount too large".to_string());

    let count = i64::try_from(participants).map_err(|_| overflow())?;
    let base = total.div_round_half_up(count).ok_or_else(overflow)?;
    let consumed = base.checked_mul(count - 1).ok_or_else(overflow)?;
    let last = total.checked_sub(consumed).ok_or_else(overflow)?;

    let mut owed = vec![base; participants - 1];
    owed.push(last);
    Ok(owed)
}

fn percentage_shares(
    total: Money,
    payer_id: ParticipantId,
    payer_split: Option<SplitValue>,
    others: &[Participant],
) -> ResultEngine<Vec<Money>> {
    let overflow = || EngineError::InvalidRequest("amount too large".to_string());

    let mut others_bp = Vec::with_capacity(others.len());
    let mut declared: i64 = 0;
    for participant in others {
        let bp = percent_value(participant.split, participant.id)?;
        declared = declared.checked_add(bp).ok_or_else(overflow)?;
        others_bp.push(bp);
    }

    let payer_bp = match payer_split {
        Some(_) => percent_value(payer_split, payer_id)?,
        None => {
            let inferred = FULL_PERCENT_BP - declared;
            if inferred < 0 {
                return Err(EngineError::InvalidRequest(format!(
                    "percentages besides the payer's sum to {}, leaving the payer a negative share",
                    format_bp(declared)
                )));
            }
            inferred
        }
    };

    let resolved = payer_bp.checked_add(declared).ok_or_else(overflow)?;
    if (resolved - FULL_PERCENT_BP).abs() > PERCENT_TOLERANCE_BP {
        return Err(EngineError::UnbalancedSplit(format!(
            "percentages sum to {}, expected 100.00",
            format_bp(resolved)
        )));
    }

    let mut owed = Vec::with_capacity(1 + others.len());
    owed.push(total.percent_bp(payer_bp).ok_or_else(overflow)?);
    for bp in others_bp {
        owed.push(total.percent_bp(bp).ok_or_else(overflow)?);
    }
    Ok(owed)
}

fn exact_shares(
    total: Money,
    payer_id: ParticipantId,
    payer_split: Option<SplitValue>,
    others: &[Participant],
) -> ResultEngine<Vec<Money>> {
    let overflow = || EngineError::InvalidRequest("amount too large".to_string());

    let mut others_amounts = Vec::with_capacity(others.len());
    let mut declared = Money::ZERO;
    for participant in others {
        let amount = amount_value(participant.split, participant.id)?;
        declared = declared.checked_add(amount).ok_or_else(overflow)?;
        others_amounts.push(amount);
    }

    let payer_amount = match payer_split {
        Some(_) => amount_value(payer_split, payer_id)?,
        None => {
            let inferred = total.checked_sub(declared).ok_or_else(overflow)?;
            if inferred.is_negative() {
                return Err(EngineError::InvalidRequest(format!(
                    "amounts besides the payer's sum to {declared}, more than the total {total}"
                )));
            }
            inferred
        }
    };

    let resolved = payer_amount.checked_add(declared).ok_or_else(overflow)?;
    if (resolved.cents() - total.cents()).abs() > EXACT_TOLERANCE_CENTS {
        return Err(EngineError::UnbalancedSplit(format!(
            "amounts sum to {resolved}, expected {total}"
        )));
    }

    let mut owed = Vec::with_capacity(1 + others.len());
    owed.push(payer_amount);
    owed.extend(others_amounts);
    Ok(owed)
}

fn percent_value(split: Option<SplitValue>, id: ParticipantId) -> ResultEngine<i64> {
    match split {
        Some(SplitValue::Percent(bp)) => {
            if !(0..=FULL_PERCENT_BP).contains(&bp) {
                return Err(EngineError::InvalidRequest(format!(
                    "percentage for participant {id} must be between 0 and 100, got {}",
                    format_bp(bp)
                )));
            }
            Ok(bp)
        }
        Some(SplitValue::Amount(_)) => Err(EngineError::InvalidRequest(format!(
            "participant {id} declares an exact amount, expected a percentage"
        ))),
        None => Err(EngineError::InvalidRequest(format!(
            "missing split value for participant {id}"
        ))),
    }
}

fn amount_value(split: Option<SplitValue>, id: ParticipantId) -> ResultEngine<Money> {
    match split {
        Some(SplitValue::Amount(amount)) => {
            if amount.is_negative() {
                return Err(EngineError::InvalidRequest(format!(
                    "amount for participant {id} must not be negative, got {amount}"
                )));
            }
            Ok(amount)
        }
        Some(SplitValue::Percent(_)) => Err(EngineError::InvalidRequest(format!(
            "participant {id} declares a percentage, expected an exact amount"
        ))),
        None => Err(EngineError::InvalidRequest(format!(
            "missing split value for participant {id}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(total: i64, policy: SplitPolicy, payer: i64) -> AllocationRequest {
        AllocationRequest::new(Money::new(total), policy, ParticipantId::new(payer))
    }

    fn person(id: i64) -> Participant {
        Participant::new(ParticipantId::new(id))
    }

    #[test]
    fn rejects_non_positive_total() {
        for total in [0, -100] {
            let request = request(total, SplitPolicy::Equal, 1).participant(person(2));
            let err = allocate(&request).unwrap_err();
            assert!(matches!(err, EngineError::InvalidRequest(_)), "{err}");
        }
    }

    #[test]
    fn rejects_payer_alone() {
        let empty = request(1000, SplitPolicy::Equal, 1);
        assert!(allocate(&empty).is_err());

        let only_payer = request(1000, SplitPolicy::Equal, 1).participant(person(1));
        assert!(allocate(&only_payer).is_err());
    }

    #[test]
    fn rejects_duplicate_participants() {
        let request = request(1000, SplitPolicy::Equal, 1)
            .participant(person(2))
            .participant(person(2));
        let err = allocate(&request).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest("duplicate participant id: 2".to_string())
        );

        let payer_twice = AllocationRequest::new(
            Money::new(1000),
            SplitPolicy::Equal,
            ParticipantId::new(1),
        )
        .participants([person(1), person(2), person(1)]);
        assert!(allocate(&payer_twice).is_err());
    }

    #[test]
    fn rejects_missing_split_value() {
        let request = request(1000, SplitPolicy::Percentage, 1).participant(person(2));
        let err = allocate(&request).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest("missing split value for participant 2".to_string())
        );
    }

    #[test]
    fn rejects_mismatched_split_kinds() {
        let amount_under_percentage = request(1000, SplitPolicy::Percentage, 1)
            .participant(person(2).split(SplitValue::Amount(Money::new(500))));
        assert!(matches!(
            allocate(&amount_under_percentage).unwrap_err(),
            EngineError::InvalidRequest(_)
        ));

        let percent_under_exact = request(1000, SplitPolicy::Exact, 1)
            .participant(person(2).split(SplitValue::Percent(5000)));
        assert!(matches!(
            allocate(&percent_under_exact).unwrap_err(),
            EngineError::InvalidRequest(_)
        ));
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        for bp in [-1, 10_001] {
            let request = request(1000, SplitPolicy::Percentage, 1)
                .participant(person(2).split(SplitValue::Percent(bp)));
            assert!(matches!(
                allocate(&request).unwrap_err(),
                EngineError::InvalidRequest(_)
            ));
        }
    }

    #[test]
    fn rejects_negative_exact_amount() {
        let request = request(1000, SplitPolicy::Exact, 1)
            .participant(person(2).split(SplitValue::Amount(Money::new(-1))));
        assert!(matches!(
            allocate(&request).unwrap_err(),
            EngineError::InvalidRequest(_)
        ));
    }

    #[test]
    fn rejects_inferred_negative_payer_share() {
        let percentages = request(1000, SplitPolicy::Percentage, 1)
            .participant(person(2).split(SplitValue::Percent(6000)))
            .participant(person(3).split(SplitValue::Percent(5000)));
        assert!(matches!(
            allocate(&percentages).unwrap_err(),
            EngineError::InvalidRequest(_)
        ));

        let amounts = request(1000, SplitPolicy::Exact, 1)
            .participant(person(2).split(SplitValue::Amount(Money::new(1100))));
        assert!(matches!(
            allocate(&amounts).unwrap_err(),
            EngineError::InvalidRequest(_)
        ));
    }

    #[test]
    fn unbalanced_percentages_name_the_sum() {
        let request = request(1000, SplitPolicy::Percentage, 1)
            .participant(person(1).split(SplitValue::Percent(6000)))
            .participant(person(2).split(SplitValue::Percent(4500)));
        assert_eq!(
            allocate(&request).unwrap_err(),
            EngineError::UnbalancedSplit(
                "percentages sum to 105.00, expected 100.00".to_string()
            )
        );
    }

    #[test]
    fn unbalanced_amounts_name_the_sum() {
        let request = request(5000, SplitPolicy::Exact, 1)
            .participant(person(1).split(SplitValue::Amount(Money::new(3000))))
            .participant(person(2).split(SplitValue::Amount(Money::new(2500))));
        assert_eq!(
            allocate(&request).unwrap_err(),
            EngineError::UnbalancedSplit("amounts sum to 55.00, expected 50.00".to_string())
        );
    }

    #[test]
    fn equal_split_ignores_declared_values() {
        let request = request(3000, SplitPolicy::Equal, 1)
            .participant(person(2).split(SplitValue::Percent(9000)));
        let allocation = allocate(&request).unwrap();
        assert_eq!(allocation.shares()[0].owed, Money::new(1500));
        assert_eq!(allocation.shares()[1].owed, Money::new(1500));
    }

    #[test]
    fn payer_may_be_listed_or_omitted() {
        let listed = request(3000, SplitPolicy::Equal, 1)
            .participants([person(1), person(2)]);
        let omitted = request(3000, SplitPolicy::Equal, 1).participant(person(2));
        assert_eq!(allocate(&listed).unwrap(), allocate(&omitted).unwrap());
    }
}
