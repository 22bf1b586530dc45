//! Prefunded accounts of the local devnet.
//!
//! The devnet genesis funds the standard `test test ... junk` mnemonic
//! accounts on both layers. These keys are public and must never hold value
//! outside a local network.

use crate::{parse_private_key, ClientError};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;

const DEV_PRIVATE_KEYS: [&str; 10] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "0x47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
    "0x8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba",
    "0x92db14e403b83dfe3df233f83dfa3a0d7096f21ca9b0d6d6b8d88b2b4ec1564e",
    "0x4bbbf85ce3377467afe5d46f804f221813b2bb87f24d81f60f1fcdbf7cbf4356",
    "0xdbda1821b80551c9d65939329250298aa3472ba22feea921c0cf5d620ea67b97",
    "0x2a871d0798f97d79848a013d4936a73bf4cc922c825d33c1cf7073dff6d409c6",
];

/// Number of prefunded dev accounts.
pub const DEV_ACCOUNT_COUNT: usize = DEV_PRIVATE_KEYS.len();

/// Private key of the dev account at `index`.
pub fn dev_private_key(index: usize) -> Result<&'static str, ClientError> {
    DEV_PRIVATE_KEYS
        .get(index)
        .copied()
        .ok_or(ClientError::UnknownDevAccount(index))
}

/// Signer for the dev account at `index`, bound to `chain_id`.
pub fn dev_signer(index: usize, chain_id: u64) -> Result<PrivateKeySigner, ClientError> {
    let signer = parse_private_key(dev_private_key(index)?)?;
    Ok(signer.with_chain_id(Some(chain_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_first_dev_accounts() {
        let signer = dev_signer(0, 900).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(signer.chain_id(), Some(900));

        let signer = dev_signer(1, 901).unwrap();
        assert_eq!(
            signer.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_unknown_dev_account() {
        assert!(matches!(
            dev_private_key(DEV_ACCOUNT_COUNT),
            Err(ClientError::UnknownDevAccount(10))
        ));
    }

    #[test]
    fn test_all_dev_keys_parse() {
        for index in 0..DEV_ACCOUNT_COUNT {
            assert!(dev_signer(index, 900).is_ok(), "dev key {index} failed to parse");
        }
    }
}
