//! Transfer between envelopes

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Envelope};
use crate::domain::{Amount, DomainError, DomainEvent};

#[derive(Debug, Clone)]
pub struct EnvelopeTransfer {
    pub source: Envelope,
    pub target: Envelope,
    pub amount: Amount,
    pub events: Vec<DomainEvent>,
}

pub struct TransferBetweenEnvelopes;

impl TransferBetweenEnvelopes {
    /// Move allocated money from `source` to `target`, both inside `budget_id`.
    ///
    /// The source must hold the amount and the target must stay within its
    /// monthly limit; neither envelope is changed when either check fails.
    pub fn execute(
        source: &Envelope,
        target: &Envelope,
        amount_cents: i64,
        budget_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EnvelopeTransfer, DomainError> {
        let amount =
            Amount::new(amount_cents).map_err(|_| DomainError::InvalidTransferAmount(amount_cents))?;
        if source.id() == target.id() {
            return Err(DomainError::SameEnvelopeTransfer);
        }
        if source.budget_id() != budget_id || target.budget_id() != budget_id {
            return Err(DomainError::EnvelopesFromDifferentBudgets);
        }

        let (source_after, transferred_out) = source.transfer_out(target.id(), &amount, now)?;
        let (target_after, transferred_in) = target.transfer_in(source.id(), &amount, now)?;

        Ok(EnvelopeTransfer {
            source: source_after,
            target: target_after,
            amount,
            events: vec![transferred_out.into(), transferred_in.into()],
        })
    }
}
