use std::fmt;

/// Lifecycle status of a cross-chain message.
///
/// Variants are declared in lifecycle order so that "at least this far" is a
/// plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageStatus {
    UnconfirmedL1ToL2Message,
    FailedL1ToL2Message,
    StateRootNotPublished,
    ReadyToProve,
    InChallengePeriod,
    ReadyForRelay,
    Relayed,
}

impl MessageStatus {
    /// True once `self` has reached `target` or gone past it.
    pub fn has_reached(self, target: Self) -> bool {
        self >= target
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnconfirmedL1ToL2Message => "UNCONFIRMED_L1_TO_L2_MESSAGE",
            Self::FailedL1ToL2Message => "FAILED_L1_TO_L2_MESSAGE",
            Self::StateRootNotPublished => "STATE_ROOT_NOT_PUBLISHED",
            Self::ReadyToProve => "READY_TO_PROVE",
            Self::InChallengePeriod => "IN_CHALLENGE_PERIOD",
            Self::ReadyForRelay => "READY_FOR_RELAY",
            Self::Relayed => "RELAYED",
        };
        f.write_str(s)
    }
}

/// On-chain facts about an L2→L1 withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawalFacts {
    /// Portal `finalizedWithdrawals`
    pub finalized: bool,
    /// L1 messenger `successfulMessages`, for messenger-routed withdrawals
    pub relay_succeeded: bool,
    /// L1 messenger `failedMessages`, for messenger-routed withdrawals
    pub relay_failed: bool,
    /// Oracle has published an output at or after the withdrawal block
    pub output_published: bool,
    /// Portal proof timestamp, if proven
    pub proven_at: Option<u64>,
    pub finalization_period: u64,
    /// Latest L1 block timestamp
    pub now: u64,
}

pub fn derive_withdrawal_status(facts: &WithdrawalFacts) -> MessageStatus {
    if facts.relay_succeeded {
        return MessageStatus::Relayed;
    }
    // finalized on the portal but the messenger call reverted: replayable
    if facts.relay_failed {
        return MessageStatus::ReadyForRelay;
    }
    if facts.finalized {
        return MessageStatus::Relayed;
    }
    if !facts.output_published {
        return MessageStatus::StateRootNotPublished;
    }

    match facts.proven_at {
        None => MessageStatus::ReadyToProve,
        Some(proven_at) if facts.now < proven_at.saturating_add(facts.finalization_period) => {
            MessageStatus::InChallengePeriod
        }
        Some(_) => MessageStatus::ReadyForRelay,
    }
}

/// Status of an L1→L2 deposit from the L2 messenger's relay records.
pub const fn derive_deposit_status(relay_succeeded: bool, relay_failed: bool) -> MessageStatus {
    if relay_succeeded {
        MessageStatus::Relayed
    } else if relay_failed {
        MessageStatus::FailedL1ToL2Message
    } else {
        MessageStatus::UnconfirmedL1ToL2Message
    }
}
