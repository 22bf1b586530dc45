//! Contract bindings for all external contracts.
//!
//! This crate consolidates all Solidity contract interfaces used across the project:
//! - OP Stack contracts (OptimismPortal, L2OutputOracle, L2ToL1MessagePasser,
//!   cross-domain messengers and standard bridges)
//! - The FastWithdraw helper contract deployed on the devnet L1
//! - ERC20 tokens
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod fast_withdraw;
pub mod opstack;
pub mod token;
