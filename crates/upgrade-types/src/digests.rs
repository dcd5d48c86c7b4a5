// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::upgrade_serde::Readable;
use fastcrypto::encoding::{Base58, Encoding};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A representation of a 32 byte digest
#[serde_as]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(#[serde_as(as = "Readable<Base58, Bytes>")] [u8; 32]);

impl Digest {
    pub const ZERO: Self = Digest([0; 32]);

    pub const fn new(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    pub fn generate<R: rand::RngCore + rand::CryptoRng>(mut rng: R) -> Self {
        let mut bytes = [0; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn random() -> Self {
        Self::generate(rand::thread_rng())
    }

    pub const fn inner(&self) -> &[u8; 32] {
        &self.0
    }

    pub const fn into_inner(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(digest: [u8; 32]) -> Self {
        Self::new(digest)
    }
}

impl From<Digest> for [u8; 32] {
    fn from(digest: Digest) -> Self {
        digest.into_inner()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Base58::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::LowerHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }

        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl fmt::UpperHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }

        for byte in self.0 {
            write!(f, "{:02X}", byte)?;
        }

        Ok(())
    }
}

impl std::str::FromStr for Digest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 32] = Base58::decode(s)
            .map_err(|e| anyhow::anyhow!(e))?
            .try_into()
            .map_err(|_| anyhow::anyhow!("Invalid digest length"))?;
        Ok(Digest::new(bytes))
    }
}

/// Declares a named wrapper around [`Digest`] with the same encodings.
macro_rules! named_digest {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(Digest);

        impl $name {
            pub const ZERO: Self = Self(Digest::ZERO);

            pub const fn new(digest: [u8; 32]) -> Self {
                Self(Digest::new(digest))
            }

            pub fn generate<R: rand::RngCore + rand::CryptoRng>(rng: R) -> Self {
                Self(Digest::generate(rng))
            }

            pub fn random() -> Self {
                Self(Digest::random())
            }

            pub const fn inner(&self) -> &[u8; 32] {
                self.0.inner()
            }

            pub const fn into_inner(self) -> [u8; 32] {
                self.0.into_inner()
            }

            pub fn base58_encode(&self) -> String {
                Base58::encode(self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_ref()
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(digest: [u8; 32]) -> Self {
                Self::new(digest)
            }
        }

        impl From<$name> for [u8; 32] {
            fn from(digest: $name) -> Self {
                digest.into_inner()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl fmt::UpperHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::UpperHex::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

named_digest!(
    /// Identifier of a transaction. Upgrade transactions derive it from their components, see
    /// [`UnresolvedUpgradeTransaction`](crate::transaction::UnresolvedUpgradeTransaction).
    TransactionDigest
);

named_digest!(
    /// Content hash of an attachment holding contract code.
    ContractCodeId
);

named_digest!(
    /// Digest of a group of transaction components.
    ComponentDigest
);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn digest_display_and_parse() {
        let digest = TransactionDigest::generate(StdRng::from_seed([7; 32]));
        let encoded = digest.to_string();
        assert_eq!(encoded, digest.base58_encode());
        assert_eq!(encoded.parse::<TransactionDigest>().unwrap(), digest);
        assert!("not-base58!".parse::<TransactionDigest>().is_err());
    }

    #[test]
    fn digest_hex() {
        let digest = ContractCodeId::new([0xab; 32]);
        assert_eq!(format!("{:x}", digest), "ab".repeat(32));
        assert_eq!(format!("{:#X}", digest), format!("0x{}", "AB".repeat(32)));
    }
}
