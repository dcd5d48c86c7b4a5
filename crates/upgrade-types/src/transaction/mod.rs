// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The three forms of a contract upgrade transaction, and how their digest is derived.
//!
//! The digest is hashed in two levels,
//!
//! ```text
//! digest = H(H(inputs, notary), H(legacy attachment id, upgraded contract name, privacy salt))
//! ```
//!
//! so that a [`FilteredUpgradeTransaction`] can reveal the inputs and the notary while carrying
//! only the digest of the remaining components.

use crate::base_types::{ContractName, Party, StateRef};
use crate::crypto::{default_hash, BcsSignable, PrivacySalt};
use crate::digests::{ComponentDigest, ContractCodeId, TransactionDigest};
use serde::{Deserialize, Serialize};

mod builder;
mod filtered;
mod resolved;
mod unresolved;

pub use builder::UpgradeTransactionBuilder;
pub use filtered::FilteredUpgradeTransaction;
pub use resolved::ResolvedUpgradeTransaction;
pub use unresolved::{UnresolvedUpgradeTransaction, UpgradeTransactionData};

/// The components a notary always sees.
#[derive(Serialize, Deserialize)]
struct InputsAndNotary {
    inputs: Vec<StateRef>,
    notary: Party,
}

impl BcsSignable for InputsAndNotary {}

/// The components a non-validating notary only sees the digest of.
// The upgraded contract attachment id is not one of them, so it does not feed the digest.
#[derive(Serialize, Deserialize)]
struct HiddenComponents {
    legacy_contract_attachment_id: ContractCodeId,
    upgraded_contract_name: ContractName,
    privacy_salt: PrivacySalt,
}

impl BcsSignable for HiddenComponents {}

#[derive(Serialize, Deserialize)]
struct DigestComponents {
    inputs_and_notary: ComponentDigest,
    hidden: ComponentDigest,
}

impl BcsSignable for DigestComponents {}

fn hidden_components_digest(
    legacy_contract_attachment_id: ContractCodeId,
    upgraded_contract_name: &ContractName,
    privacy_salt: PrivacySalt,
) -> ComponentDigest {
    ComponentDigest::new(default_hash(&HiddenComponents {
        legacy_contract_attachment_id,
        upgraded_contract_name: upgraded_contract_name.clone(),
        privacy_salt,
    }))
}

fn transaction_digest(
    inputs: &[StateRef],
    notary: &Party,
    hidden: ComponentDigest,
) -> TransactionDigest {
    let inputs_and_notary = ComponentDigest::new(default_hash(&InputsAndNotary {
        inputs: inputs.to_vec(),
        notary: notary.clone(),
    }));
    TransactionDigest::new(default_hash(&DigestComponents {
        inputs_and_notary,
        hidden,
    }))
}
