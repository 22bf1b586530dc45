//! FastWithdraw helper contract bindings.
//!
//! The contract pays out a proven withdrawal on L1 ahead of the challenge
//! window and later claims the withdrawal itself. Requests identify the
//! withdrawal by the 4-field [`WithdrawalTx`] tuple; sender and target are
//! implied by the caller and the contract.

use alloy_sol_types::sol;

sol! {
    /// Fast withdrawal request, a subset of the portal withdrawal tuple
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTx {
        uint256 nonce;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }

    #[sol(rpc)]
    interface IFastWithdraw {
        /// Request an early ETH payout for a proven withdrawal
        function requestFWETH(WithdrawalTx calldata _tx) external;

        /// Request an early ERC20 payout for a proven withdrawal
        function requestFWERC20(WithdrawalTx calldata _tx) external;
    }
}
