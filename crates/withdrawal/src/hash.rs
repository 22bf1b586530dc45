use crate::types::WithdrawalHash;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use binding::opstack::{ICrossDomainMessenger::relayMessageCall, WithdrawalTransaction};

/// Message version the messengers emit on the devnet.
pub const MESSAGE_VERSION_V1: u16 = 1;

pub fn compute_withdrawal_hash(tx: &WithdrawalTransaction) -> WithdrawalHash {
    // keccak256(abi.encode(nonce, sender, target, value, gasLimit, data)) as a
    // flat sequence, without the outer tuple offset
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    keccak256(encoded)
}

/// Calldata of the `relayMessage` call a version 1 cross-domain message
/// resolves to. This is also the payload the L2 messenger hands to the
/// message passer.
pub fn encode_cross_domain_message_v1(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    min_gas_limit: U256,
    message: Bytes,
) -> Bytes {
    relayMessageCall {
        _nonce: nonce,
        _sender: sender,
        _target: target,
        _value: value,
        _minGasLimit: min_gas_limit,
        _message: message,
    }
    .abi_encode()
    .into()
}

/// Hash a cross-domain message, the key of `successfulMessages` and
/// `failedMessages` on the receiving messenger.
pub fn hash_cross_domain_message_v1(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    min_gas_limit: U256,
    message: Bytes,
) -> eyre::Result<B256> {
    let version = nonce_version(nonce);
    if version != MESSAGE_VERSION_V1 {
        eyre::bail!("Unsupported cross-domain message version {}", version);
    }

    let encoded =
        encode_cross_domain_message_v1(nonce, sender, target, value, min_gas_limit, message);
    Ok(keccak256(encoded))
}

/// Version stored in the top two bytes of a message nonce.
pub fn nonce_version(nonce: U256) -> u16 {
    let bytes = nonce.to_be_bytes::<32>();
    u16::from_be_bytes([bytes[0], bytes[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_compute_withdrawal_hash_known_value() {
        // MessagePassed event from a public OP Stack chain
        let tx = WithdrawalTransaction {
            nonce: U256::from_be_bytes(hex!(
                "0001000000000000000000000000000000000000000000000000000000000818"
            )),
            sender: Address::from_slice(&hex!("000040D6c85A13a1AA74565FDe87e499dC023C6f")),
            target: Address::from_slice(&hex!("B03eEF386A61b5b462051636001485FFfdD3d843")),
            value: U256::ZERO,
            gasLimit: U256::from(200_000),
            data: Bytes::from(hex!(
                "095ea7b3000000000000000000000000000040d6c85a13a1aa74565fde87e499dc023c6fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            )),
        };

        let expected = B256::from_slice(&hex!(
            "49c43b60ec99e99046b54aec4c90419ff194300e567de63423c3b974ae46bd28"
        ));

        assert_eq!(compute_withdrawal_hash(&tx), expected);
    }

    #[test]
    fn test_withdrawal_hash_distinguishes_nonces() {
        let mut hashes = std::collections::HashSet::new();
        for i in 100..110 {
            let tx = WithdrawalTransaction {
                nonce: U256::from(i),
                sender: Address::from([0x01; 20]),
                target: Address::from([0x02; 20]),
                value: U256::from(1_000_000),
                gasLimit: U256::from(100_000),
                data: Bytes::new(),
            };
            assert!(hashes.insert(compute_withdrawal_hash(&tx)));
        }
    }

    #[test]
    fn test_cross_domain_message_encoding_round_trips() {
        let nonce = U256::from(1) << 240 | U256::from(7);
        let encoded = encode_cross_domain_message_v1(
            nonce,
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0xbb),
            U256::from(5),
            U256::from(200_000),
            Bytes::from(vec![0xde, 0xad]),
        );

        assert_eq!(&encoded[..4], relayMessageCall::SELECTOR.as_slice());

        let decoded = relayMessageCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded._nonce, nonce);
        assert_eq!(decoded._sender, Address::repeat_byte(0xaa));
        assert_eq!(decoded._target, Address::repeat_byte(0xbb));
        assert_eq!(decoded._minGasLimit, U256::from(200_000));
        assert_eq!(decoded._message, Bytes::from(vec![0xde, 0xad]));
    }

    #[test]
    fn test_hash_cross_domain_message_rejects_legacy_version() {
        let result = hash_cross_domain_message_v1(
            U256::from(3),
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            U256::ZERO,
            Bytes::new(),
        );
        assert!(result.is_err());

        let nonce = U256::from(1) << 240;
        let hash = hash_cross_domain_message_v1(
            nonce,
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            U256::ZERO,
            Bytes::new(),
        )
        .unwrap();
        assert_ne!(hash, B256::ZERO);
    }

    #[test]
    fn test_nonce_version() {
        assert_eq!(nonce_version(U256::from(1) << 240 | U256::from(99)), 1);
        assert_eq!(nonce_version(U256::from(99)), 0);
    }
}
