//! Request struct for the allocation operation.
//!
//! Groups every input of [`crate::allocate`] behind a small builder so call
//! sites stay readable and new optional fields never ripple through
//! signatures.

use crate::{Money, Participant, ParticipantId, SplitPolicy};

/// Input to [`crate::allocate`]. Build it once, then hand it over; the
/// engine never mutates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Amount fronted by the payer. Must be positive.
    pub total: Money,
    pub policy: SplitPolicy,
    pub payer_id: ParticipantId,
    /// The people sharing the expense, with or without the payer. Order is
    /// preserved and decides who absorbs the rounding remainder under
    /// `Equal`.
    pub participants: Vec<Participant>,
}

impl AllocationRequest {
    #[must_use]
    pub fn new(total: Money, policy: SplitPolicy, payer_id: ParticipantId) -> Self {
        Self {
            total,
            policy,
            payer_id,
            participants: Vec::new(),
        }
    }

    /// Appends one participant, keeping the order given.
    #[must_use]
    pub fn participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    /// Appends several participants at once, keeping the order given.
    #[must_use]
    pub fn participants(mut self, participants: impl IntoIterator<Item = Participant>) -> Self {
        self.participants.extend(participants);
        self
    }
}
