// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::transaction_digest;
use crate::base_types::{Party, StateRef};
use crate::digests::{ComponentDigest, TransactionDigest};
use crate::error::{UpgradeError, UpgradeResult};
use crate::state::TransactionState;
use serde::{Deserialize, Serialize};

/// An upgrade transaction with everything but its inputs and notary replaced by a digest.
///
/// This is what a non-validating notary receives. It can check that the inputs are unspent and
/// that the digest matches the one that was signed, but it never learns the outputs.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct FilteredUpgradeTransaction {
    pub inputs: Vec<StateRef>,
    pub notary: Party,
    /// Digest of the hidden components.
    pub rest: ComponentDigest,
}

impl FilteredUpgradeTransaction {
    pub fn new(inputs: Vec<StateRef>, notary: Party, rest: ComponentDigest) -> Self {
        Self {
            inputs,
            notary,
            rest,
        }
    }

    pub fn digest(&self) -> TransactionDigest {
        transaction_digest(&self.inputs, &self.notary, self.rest)
    }

    pub fn outputs(&self) -> &[TransactionState] {
        &[]
    }

    pub fn check_digest(&self, expected: &TransactionDigest) -> UpgradeResult {
        let actual = self.digest();
        tx_ensure!(
            actual == *expected,
            UpgradeError::InvalidTransactionDigest {
                expected: *expected,
                actual,
            }
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../unit_tests/filtered_tests.rs"]
mod filtered_tests;
