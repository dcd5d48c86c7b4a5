// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::SignerKey;
use crate::digests::TransactionDigest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points at an output of a previous transaction: the digest of the transaction that created the
/// state and the index of the state among that transaction's outputs.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct StateRef {
    pub txhash: TransactionDigest,
    pub index: u32,
}

impl StateRef {
    pub const fn new(txhash: TransactionDigest, index: u32) -> Self {
        Self { txhash, index }
    }

    // for testing
    pub fn random() -> Self {
        Self::new(TransactionDigest::random(), 0)
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}

/// The stable name of a contract program.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct ContractName(String);

impl ContractName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A well-known network identity. Upgrade transactions use it for the notary that attests the
/// inputs have not been consumed elsewhere.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub owning_key: SignerKey,
}

impl Party {
    pub fn new(name: impl Into<String>, owning_key: SignerKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.owning_key)
    }
}
