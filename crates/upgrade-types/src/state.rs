// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{ContractName, Party, StateRef};
use crate::constraints::AttachmentConstraint;
use crate::crypto::SignerKey;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Contract-defined data of a ledger state. The payload is opaque to this crate; only the
/// contract's own upgrade logic interprets it.
#[serde_as]
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ContractState {
    pub participants: Vec<SignerKey>,
    #[serde_as(as = "Bytes")]
    pub data: Vec<u8>,
}

impl ContractState {
    pub fn new(participants: Vec<SignerKey>, data: Vec<u8>) -> Self {
        Self { participants, data }
    }
}

/// A ledger state as recorded by the transaction that created it.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct TransactionState {
    pub data: ContractState,
    /// The contract that governs this state.
    pub contract: ContractName,
    pub notary: Party,
    /// Index of another output that must be consumed together with this one.
    pub encumbrance: Option<u32>,
    /// Decides which attachments may implement `contract` for this state.
    pub constraint: AttachmentConstraint,
}

impl TransactionState {
    pub fn new(
        data: ContractState,
        contract: ContractName,
        notary: Party,
        constraint: AttachmentConstraint,
    ) -> Self {
        Self {
            data,
            contract,
            notary,
            encumbrance: None,
            constraint,
        }
    }

    pub fn participants(&self) -> &[SignerKey] {
        &self.data.participants
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct StateAndRef {
    pub state: TransactionState,
    pub state_ref: StateRef,
}

impl StateAndRef {
    pub fn new(state: TransactionState, state_ref: StateRef) -> Self {
        Self { state, state_ref }
    }
}
