// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0
use crate::digests::TransactionDigest;
use crate::error::{UpgradeError, UpgradeResult};
use crate::upgrade_serde::Readable;
use fastcrypto::encoding::Hex;
use fastcrypto::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use fastcrypto::hash::{Blake2b256, HashFunction};
use fastcrypto::traits::{KeyPair as KeypairTraits, Signer, ToFromBytes, VerifyingKey};
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

pub type DefaultHash = Blake2b256;

pub const SIGNER_KEY_LENGTH: usize = 32;

/// Public key bytes of a participant or notary. Kept as raw bytes so keys can be ordered,
/// deduplicated and hashed without parsing the curve point.
#[serde_as]
#[derive(Eq, Default, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct SignerKey(#[serde_as(as = "Readable<Hex, Bytes>")] [u8; SIGNER_KEY_LENGTH]);

impl SignerKey {
    pub const fn new(bytes: [u8; SIGNER_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn to_public_key(&self) -> UpgradeResult<Ed25519PublicKey> {
        Ed25519PublicKey::from_bytes(&self.0).map_err(|e| UpgradeError::InvalidSignature {
            error: format!("Invalid public key {:?}: {}", self, e),
        })
    }
}

impl AsRef<[u8]> for SignerKey {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<&Ed25519PublicKey> for SignerKey {
    fn from(pk: &Ed25519PublicKey) -> Self {
        let mut bytes = [0u8; SIGNER_KEY_LENGTH];
        bytes.copy_from_slice(pk.as_bytes());
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for SignerKey {
    type Error = UpgradeError;

    fn try_from(bytes: &[u8]) -> Result<Self, UpgradeError> {
        let arr: [u8; SIGNER_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| UpgradeError::InvalidSignature {
                    error: format!("Invalid public key length {}", bytes.len()),
                })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k#{}", hex::encode(self.0))
    }
}

impl fmt::Display for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct SignerKeyPair(Ed25519KeyPair);

impl SignerKeyPair {
    pub fn public(&self) -> SignerKey {
        SignerKey::from(self.0.public())
    }

    fn sign_bytes(&self, message: &[u8]) -> Ed25519Signature {
        self.0.sign(message)
    }
}

impl fmt::Debug for SignerKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignerKeyPair").field(&self.public()).finish()
    }
}

pub fn get_key_pair() -> (SignerKey, SignerKeyPair) {
    get_key_pair_from_rng(&mut OsRng)
}

/// Generate a key pair from the given rng. Tests pass a seeded `StdRng` to get stable keys.
pub fn get_key_pair_from_rng<R>(csprng: &mut R) -> (SignerKey, SignerKeyPair)
where
    R: CryptoRng + RngCore,
{
    let mut seed = [0u8; 32];
    csprng.fill_bytes(&mut seed);
    let keypair = Ed25519KeyPair::generate(&mut StdRng::from_seed(seed));
    let signer = SignerKey::from(keypair.public());
    (signer, SignerKeyPair(keypair))
}

/// Something that we know how to hash and sign.
pub trait Signable<W> {
    fn write(&self, writer: &mut W);
}

/// Activate the blanket implementation of `Signable` based on serde and BCS.
/// * We use `serde_name` to extract a seed from the name of structs and enums.
/// * We use `BCS` to generate canonical bytes suitable for hashing and signing.
pub trait BcsSignable: Serialize + serde::de::DeserializeOwned {}

impl<T, W> Signable<W> for T
where
    T: BcsSignable,
    W: std::io::Write,
{
    fn write(&self, writer: &mut W) {
        let name = serde_name::trace_name::<Self>().expect("Self must be a struct or an enum");
        // Note: This assumes that names never contain the separator `::`.
        write!(writer, "{}::", name).expect("Hasher should not fail");
        bcs::serialize_into(writer, &self).expect("Message serialization should not fail");
    }
}

pub fn default_hash<S: Signable<DefaultHash>>(signable: &S) -> [u8; 32] {
    let mut digest = DefaultHash::default();
    signable.write(&mut digest);
    let hash = digest.finalize();
    hash.into()
}

/// Hash of raw bytes, used to content-address attachments.
pub fn content_hash(bytes: &[u8]) -> [u8; 32] {
    let mut digest = DefaultHash::default();
    digest.update(bytes);
    digest.finalize().into()
}

impl BcsSignable for TransactionDigest {}

/// A random value mixed into the hidden components of a transaction so that their digest cannot
/// be brute forced from a guess of their contents.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivacySalt(#[serde_as(as = "Readable<Hex, Bytes>")] [u8; 32]);

impl PrivacySalt {
    pub fn new(bytes: [u8; 32]) -> UpgradeResult<Self> {
        tx_ensure!(
            bytes.iter().any(|b| *b != 0),
            UpgradeError::invalid_structure("Privacy salt should not be all zeros")
        );
        Ok(Self(bytes))
    }

    /// A fresh salt drawn from the operating system's CSPRNG.
    pub fn random() -> Self {
        Self::generate(&mut OsRng)
    }

    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Ok(salt) = Self::new(bytes) {
                return salt;
            }
        }
    }

    pub const fn inner(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrivacySalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivacySalt({})", hex::encode(self.0))
    }
}

/// A signature over a transaction digest, together with the key that produced it.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: SignerKey,
    #[serde_as(as = "Bytes")]
    signature: Vec<u8>,
}

impl TransactionSignature {
    pub fn new(digest: &TransactionDigest, secret: &SignerKeyPair) -> Self {
        let mut message = Vec::new();
        digest.write(&mut message);
        let signature = secret.sign_bytes(&message);
        Self {
            by: secret.public(),
            signature: signature.as_ref().to_vec(),
        }
    }

    pub fn verify(&self, digest: &TransactionDigest) -> UpgradeResult {
        let mut message = Vec::new();
        digest.write(&mut message);
        let public_key = self.by.to_public_key()?;
        let signature = Ed25519Signature::from_bytes(&self.signature).map_err(|e| {
            UpgradeError::InvalidSignature {
                error: format!("Malformed signature by {:?}: {}", self.by, e),
            }
        })?;
        public_key
            .verify(&message, &signature)
            .map_err(|e| UpgradeError::InvalidSignature {
                error: format!("Signature by {:?} over {}: {}", self.by, digest, e),
            })
    }
}

impl fmt::Debug for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionSignature")
            .field("by", &self.by)
            .field("signature", &hex::encode(&self.signature))
            .finish()
    }
}

#[cfg(test)]
#[path = "unit_tests/crypto_tests.rs"]
mod crypto_tests;
