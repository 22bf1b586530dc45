//! OP Stack contract bindings.
//!
//! Targets the output-oracle flavour of the bridge used by the local devnet:
//! - L2ToL1MessagePasser (L2 predeploy)
//! - L2CrossDomainMessenger / L1CrossDomainMessenger
//! - L2StandardBridge / L1StandardBridge
//! - OptimismPortal (L1 contract)
//! - L2OutputOracle (L1 contract)

use alloy_primitives::{address, Address, B256};
use alloy_sol_types::sol;

/// L2ToL1MessagePasser predeploy address (same on all OP Stack chains).
pub const MESSAGE_PASSER_ADDRESS: Address = address!("4200000000000000000000000000000000000016");

/// L2CrossDomainMessenger predeploy address.
pub const L2_CROSS_DOMAIN_MESSENGER_ADDRESS: Address =
    address!("4200000000000000000000000000000000000007");

/// L2StandardBridge predeploy address.
pub const L2_STANDARD_BRIDGE_ADDRESS: Address =
    address!("4200000000000000000000000000000000000010");

/// Output root version 0.
pub const OUTPUT_VERSION_V0: B256 = B256::ZERO;

sol! {
    /// L2ToL1MessagePasser - L2 predeploy contract for initiating withdrawals
    #[sol(rpc)]
    interface IL2ToL1MessagePasser {
        /// Emitted when a withdrawal is initiated on L2
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        /// Initiate a withdrawal from L2 to L1
        function initiateWithdrawal(
            address _target,
            uint256 _gasLimit,
            bytes calldata _data
        ) external payable;

        /// Check if a withdrawal message has been sent
        function sentMessages(bytes32) external view returns (bool);

        /// Get the current message nonce (with version encoded in top 2 bytes)
        function messageNonce() external view returns (uint256);
    }

    /// CrossDomainMessenger - shared ABI of the L1 and L2 messengers
    #[sol(rpc, all_derives)]
    interface ICrossDomainMessenger {
        /// Emitted whenever a message is sent to the other chain
        event SentMessage(
            address indexed target,
            address sender,
            bytes message,
            uint256 messageNonce,
            uint256 gasLimit
        );

        /// Emitted right after SentMessage, carries the value sent along
        event SentMessageExtension1(address indexed sender, uint256 value);

        /// Emitted when a message is successfully relayed
        event RelayedMessage(bytes32 indexed msgHash);

        /// Emitted when a relayed message fails and is stored for replay
        event FailedRelayedMessage(bytes32 indexed msgHash);

        /// Relay (or replay) a message sent from the other domain
        function relayMessage(
            uint256 _nonce,
            address _sender,
            address _target,
            uint256 _value,
            uint256 _minGasLimit,
            bytes calldata _message
        ) external payable;

        /// Whether a message hash was relayed but failed
        function failedMessages(bytes32) external view returns (bool);

        /// Whether a message hash was successfully relayed
        function successfulMessages(bytes32) external view returns (bool);

        /// Current outbound message nonce
        function messageNonce() external view returns (uint256);
    }

    /// L1StandardBridge - deposits ETH and ERC20 from L1 into L2
    #[sol(rpc)]
    interface IL1StandardBridge {
        function depositETHTo(
            address _to,
            uint32 _minGasLimit,
            bytes calldata _extraData
        ) external payable;

        function depositERC20To(
            address _l1Token,
            address _l2Token,
            address _to,
            uint256 _amount,
            uint32 _minGasLimit,
            bytes calldata _extraData
        ) external;
    }

    /// L2StandardBridge - withdraws ETH and ERC20 from L2 to L1
    #[sol(rpc)]
    interface IL2StandardBridge {
        function withdrawTo(
            address _l2Token,
            address _to,
            uint256 _amount,
            uint32 _minGasLimit,
            bytes calldata _extraData
        ) external payable;
    }

    /// OptimismPortal - L1 contract for deposits and withdrawal proving/finalization
    #[sol(rpc)]
    interface IOptimismPortal {
        /// Emitted when a withdrawal is proven on L1
        event WithdrawalProven(
            bytes32 indexed withdrawalHash,
            address indexed from,
            address indexed to
        );

        /// Emitted when a withdrawal is finalized on L1
        event WithdrawalFinalized(
            bytes32 indexed withdrawalHash,
            bool success
        );

        /// Query a proven withdrawal by hash
        function provenWithdrawals(bytes32 withdrawalHash)
            external view returns (bytes32 outputRoot, uint128 timestamp, uint128 l2OutputIndex);

        /// Query if a withdrawal has been finalized
        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Prove a withdrawal transaction against an L2 output
        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _l2OutputIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;

        /// Finalize a proven withdrawal transaction
        function finalizeWithdrawalTransaction(WithdrawalTransaction calldata _tx) external;

        /// Deposit a transaction (and mint ETH) into L2
        function depositTransaction(
            address _to,
            uint256 _value,
            uint64 _gasLimit,
            bool _isCreation,
            bytes calldata _data
        ) external payable;

        /// Semver of the deployed portal
        function version() external view returns (string memory);
    }

    /// L2OutputOracle - L1 contract storing proposed L2 output roots
    #[sol(rpc)]
    interface IL2OutputOracle {
        /// Index of the first output covering the given L2 block
        function getL2OutputIndexAfter(uint256 _l2BlockNumber) external view returns (uint256);

        /// Output proposal at an index
        function getL2Output(uint256 _l2OutputIndex) external view returns (OutputProposal memory);

        /// Index of the most recent output
        function latestOutputIndex() external view returns (uint256);

        /// L2 block number of the most recent output, or the starting block
        /// before the first proposal
        function latestBlockNumber() external view returns (uint256);

        /// Index the next proposed output will take; zero until the first proposal
        function nextOutputIndex() external view returns (uint256);

        /// Number of L2 blocks between outputs
        function SUBMISSION_INTERVAL() external view returns (uint256);

        /// L2 block time in seconds
        function L2_BLOCK_TIME() external view returns (uint256);

        /// Challenge window after which a proven withdrawal may be finalized
        function FINALIZATION_PERIOD_SECONDS() external view returns (uint256);
    }

    /// Output proposal as stored by the L2OutputOracle
    #[derive(Debug, PartialEq, Eq)]
    struct OutputProposal {
        bytes32 outputRoot;
        uint128 timestamp;
        uint128 l2BlockNumber;
    }

    /// Output root proof structure (used in proving withdrawals)
    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    /// Withdrawal transaction structure (shared across contracts)
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }
}
