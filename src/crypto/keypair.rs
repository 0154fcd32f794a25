//! Ethereum keypair generation.

use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, SignOnly, Signing};
use tiny_keccak::{Hasher, Keccak};

use super::Address;

/// A key generation attempt that produced no usable key.
///
/// Workers treat this as transient and retry.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("secret key out of range: {0}")]
    InvalidSecretKey(#[from] secp256k1::Error),
}

/// Anything that can hand out fresh keypairs to search workers.
pub trait KeySource: Send + Sync {
    /// Produces one new keypair, or a transient failure.
    fn generate(&self) -> Result<Keypair, KeyError>;
}

/// Represents an Ethereum keypair (private key + derived address).
#[derive(Debug, Clone)]
pub struct Keypair {
    secret_key: [u8; 32],
    address: Address,
}

impl Keypair {
    /// Builds a keypair from 32 secret bytes.
    ///
    /// Fails when the bytes are zero or not below the curve order.
    pub fn from_secret_key<C: Signing>(
        secp: &Secp256k1<C>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: Self::derive_address(&public_key),
        })
    }

    /// Derives an Ethereum address from a secp256k1 public key.
    ///
    /// Process:
    /// 1. Serialize the public key in uncompressed form (65 bytes)
    /// 2. Remove the first byte (0x04 prefix)
    /// 3. Hash the remaining 64 bytes with Keccak-256
    /// 4. Take the last 20 bytes of the hash
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);

        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);

        Address::from_bytes(address_bytes)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Draws secret keys from the thread-local CSPRNG.
pub struct Secp256k1Source {
    secp: Secp256k1<SignOnly>,
}

impl Secp256k1Source {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }
}

impl Default for Secp256k1Source {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for Secp256k1Source {
    #[inline]
    fn generate(&self) -> Result<Keypair, KeyError> {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Keypair::from_secret_key(&self.secp, secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_keypair_generation() {
        let source = Secp256k1Source::new();
        let keypair = source.generate().unwrap();
        assert_eq!(keypair.private_key_hex().len(), 64);
        assert_eq!(keypair.address().to_hex().len(), 40);
    }

    #[test]
    fn test_deterministic_address() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let keypair = Keypair::from_secret_key(&Secp256k1::signing_only(), secret).unwrap();

        assert_eq!(
            keypair.address().to_hex(),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_checksummed_address_from_key() {
        let secret = key("4c0883a69102937d6231471b5dbb6204fe5129617082799f7ed2a5abf85f7f4f");
        let keypair = Keypair::from_secret_key(&Secp256k1::signing_only(), secret).unwrap();

        assert_eq!(
            keypair.address().render(true),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
        assert_eq!(
            keypair.address().render(false),
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
    }

    #[test]
    fn test_zero_secret_is_rejected() {
        let result = Keypair::from_secret_key(&Secp256k1::signing_only(), [0u8; 32]);
        assert!(matches!(result, Err(KeyError::InvalidSecretKey(_))));
    }
}
