//! L2→L1 withdrawal domain.
//!
//! Everything needed to identify a withdrawal, prove it against an L2 output
//! published by the output oracle, and reason about the delay windows on L1.

pub mod hash;
pub mod proof;
pub mod state;
pub mod status;
pub mod timing;
pub mod types;

pub use status::MessageStatus;
pub use types::{InitiatedWithdrawal, WithdrawalHash, WithdrawalRequest};
