// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{ContractName, StateRef};
use crate::constraints::ConstraintKind;
use crate::crypto::SignerKey;
use crate::digests::{ContractCodeId, TransactionDigest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[macro_export]
macro_rules! tx_bail {
    ($e:expr) => {
        return Err($e)
    };
}

#[macro_export(local_inner_macros)]
macro_rules! tx_ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            tx_bail!($e);
        }
    };
}
pub(crate) use tx_ensure;

/// Errors produced while building, filtering, resolving or verifying an upgrade transaction.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Error, Hash)]
pub enum UpgradeError {
    #[error("Invalid upgrade transaction: {error}")]
    InvalidStructure { error: String },

    // Resolution
    #[error("Could not resolve input state {state_ref}")]
    StateResolutionFailure { state_ref: StateRef },
    #[error("Could not resolve attachment {attachment_id}")]
    AttachmentResolutionFailure { attachment_id: ContractCodeId },
    #[error("Storage error: {error}")]
    StorageError { error: String },
    #[error("Attachment {attachment_id} does not declare contract {contract}")]
    AttachmentContractMissing {
        attachment_id: ContractCodeId,
        contract: ContractName,
    },

    // Verification
    #[error("No upgrade logic is available for contract {contract}")]
    UpgradeLogicUnavailable { contract: ContractName },
    #[error(
        "Input state {state_ref} is governed by contract {actual}, but the legacy attachment implements {expected}"
    )]
    ContractMismatch {
        state_ref: StateRef,
        expected: ContractName,
        actual: ContractName,
    },
    #[error(
        "The {kind} constraint of input state {state_ref} is not satisfied by legacy attachment {attachment_id}"
    )]
    ConstraintViolation {
        state_ref: StateRef,
        attachment_id: ContractCodeId,
        kind: ConstraintKind,
    },
    #[error(
        "Upgrade to {upgraded_contract} expects legacy contract {declared_legacy}, but the legacy attachment implements {legacy}"
    )]
    UpgradeIncompatible {
        upgraded_contract: ContractName,
        declared_legacy: ContractName,
        legacy: ContractName,
    },
    #[error("Legacy attachment {attachment_id} does not satisfy the {kind} legacy constraint")]
    LegacyConstraintViolation {
        attachment_id: ContractCodeId,
        kind: ConstraintKind,
    },
    #[error("Input state {state_ref} has a {kind} constraint, which cannot be upgraded")]
    UnsupportedConstraintKind {
        state_ref: StateRef,
        kind: ConstraintKind,
    },
    #[error("Upgrading input state {state_ref} failed: {error}")]
    StateUpgradeFailure { state_ref: StateRef, error: String },

    // Digests and signatures
    #[error("Transaction digest mismatch: expected {expected}, found {actual}")]
    InvalidTransactionDigest {
        expected: TransactionDigest,
        actual: TransactionDigest,
    },
    #[error("Signature is not valid: {error}")]
    InvalidSignature { error: String },
    #[error("Missing signatures from {missing:?}")]
    SignaturesMissing { missing: Vec<SignerKey> },
}

pub type UpgradeResult<T = ()> = Result<T, UpgradeError>;

impl UpgradeError {
    /// Whether the failure may go away on its own, e.g. because an input state or attachment has
    /// not reached local storage yet. Everything else means the transaction itself is invalid.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpgradeError::StateResolutionFailure { .. }
                | UpgradeError::AttachmentResolutionFailure { .. }
                | UpgradeError::StorageError { .. }
        )
    }

    pub fn invalid_structure(error: impl Into<String>) -> Self {
        UpgradeError::InvalidStructure {
            error: error.into(),
        }
    }
}
