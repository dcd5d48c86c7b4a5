// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::attachment::ContractAttachment;
use crate::base_types::{Party, StateRef};
use crate::constraints::AttachmentConstraint;
use crate::crypto::{PrivacySalt, SignerKey, TransactionSignature};
use crate::digests::TransactionDigest;
use crate::error::{UpgradeError, UpgradeResult};
use crate::network_parameters::NetworkParameters;
use crate::state::{StateAndRef, TransactionState};
use crate::upgrade::{UpgradeLogicLoader, UpgradedContract};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{instrument, trace};

/// An upgrade transaction whose inputs and attachments have been loaded and checked.
///
/// A value of this type only exists if every upgrade rule holds. The outputs and the required
/// signers are derived once, during construction, and cannot be set from outside.
#[derive(Clone, Debug)]
pub struct ResolvedUpgradeTransaction {
    inputs: Vec<StateAndRef>,
    notary: Party,
    legacy_contract_attachment: ContractAttachment,
    upgraded_contract_attachment: ContractAttachment,
    digest: TransactionDigest,
    privacy_salt: PrivacySalt,
    signatures: Vec<TransactionSignature>,
    network_parameters: Arc<NetworkParameters>,
    outputs: Vec<TransactionState>,
    required_signers: BTreeSet<SignerKey>,
}

static_assertions::assert_impl_all!(ResolvedUpgradeTransaction: Send, Sync);

impl ResolvedUpgradeTransaction {
    /// Checks the upgrade and derives its outputs. The stages run in order and the first failure
    /// is returned:
    ///
    /// 1. the upgrade logic of the upgraded contract is available;
    /// 2. every input is governed by the legacy contract;
    /// 3. every input constraint accepts the legacy attachment;
    /// 4. the upgrade logic expects the legacy contract;
    /// 5. the legacy attachment satisfies the legacy constraint of the upgrade logic;
    /// 6. every input upgrades to an output, in order;
    /// 7. the required signers are collected.
    ///
    /// `digest` is taken from the unresolved form as is.
    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip_all, fields(tx_digest = ?digest))]
    pub fn new(
        inputs: Vec<StateAndRef>,
        notary: Party,
        legacy_contract_attachment: ContractAttachment,
        upgraded_contract_attachment: ContractAttachment,
        digest: TransactionDigest,
        privacy_salt: PrivacySalt,
        signatures: Vec<TransactionSignature>,
        network_parameters: Arc<NetworkParameters>,
        upgrades: &dyn UpgradeLogicLoader,
    ) -> UpgradeResult<Self> {
        tx_ensure!(
            !inputs.is_empty(),
            UpgradeError::invalid_structure("An upgrade transaction must have inputs")
        );

        let upgraded_contract = upgraded_contract_attachment.contract();
        let upgrade = upgrades.load_upgrade_logic(upgraded_contract).ok_or_else(|| {
            UpgradeError::UpgradeLogicUnavailable {
                contract: upgraded_contract.clone(),
            }
        })?;

        let legacy_contract = legacy_contract_attachment.contract();
        for input in &inputs {
            tx_ensure!(
                input.state.contract == *legacy_contract,
                UpgradeError::ContractMismatch {
                    state_ref: input.state_ref,
                    expected: legacy_contract.clone(),
                    actual: input.state.contract.clone(),
                }
            );
        }

        for input in &inputs {
            let constraint = &input.state.constraint;
            tx_ensure!(
                constraint.is_satisfied_by(&legacy_contract_attachment, &network_parameters),
                UpgradeError::ConstraintViolation {
                    state_ref: input.state_ref,
                    attachment_id: legacy_contract_attachment.id(),
                    kind: constraint.kind(),
                }
            );
        }

        let declared_legacy = upgrade.legacy_contract();
        tx_ensure!(
            declared_legacy == *legacy_contract,
            UpgradeError::UpgradeIncompatible {
                upgraded_contract: upgraded_contract.clone(),
                declared_legacy,
                legacy: legacy_contract.clone(),
            }
        );

        let legacy_constraint = upgrade
            .legacy_contract_constraint()
            .unwrap_or(AttachmentConstraint::AllowlistedByZone);
        tx_ensure!(
            legacy_constraint.is_satisfied_by(&legacy_contract_attachment, &network_parameters),
            UpgradeError::LegacyConstraintViolation {
                attachment_id: legacy_contract_attachment.id(),
                kind: legacy_constraint.kind(),
            }
        );
        trace!("Upgrade checks passed");

        let outputs = upgrade_outputs(&inputs, &upgraded_contract_attachment, upgrade.as_ref())?;

        let required_signers = inputs
            .iter()
            .flat_map(|input| input.state.participants().iter().copied())
            .chain(std::iter::once(notary.owning_key))
            .collect();

        Ok(Self {
            inputs,
            notary,
            legacy_contract_attachment,
            upgraded_contract_attachment,
            digest,
            privacy_salt,
            signatures,
            network_parameters,
            outputs,
            required_signers,
        })
    }

    pub fn inputs(&self) -> &[StateAndRef] {
        &self.inputs
    }

    /// One output per input, in input order.
    pub fn outputs(&self) -> &[TransactionState] {
        &self.outputs
    }

    /// The participants of every input, and the notary.
    pub fn required_signers(&self) -> &BTreeSet<SignerKey> {
        &self.required_signers
    }

    pub fn digest(&self) -> &TransactionDigest {
        &self.digest
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn legacy_contract_attachment(&self) -> &ContractAttachment {
        &self.legacy_contract_attachment
    }

    pub fn upgraded_contract_attachment(&self) -> &ContractAttachment {
        &self.upgraded_contract_attachment
    }

    pub fn privacy_salt(&self) -> PrivacySalt {
        self.privacy_salt
    }

    pub fn signatures(&self) -> &[TransactionSignature] {
        &self.signatures
    }

    pub fn network_parameters(&self) -> &NetworkParameters {
        &self.network_parameters
    }

    pub fn out_ref(&self, index: u32) -> StateRef {
        StateRef::new(self.digest, index)
    }

    pub fn output_states_and_refs(&self) -> Vec<StateAndRef> {
        self.outputs
            .iter()
            .zip(0u32..)
            .map(|(state, index)| StateAndRef::new(state.clone(), self.out_ref(index)))
            .collect()
    }

    /// Verifies every attached signature against the digest, then checks that every required
    /// signer outside `allowed_to_be_missing` has signed.
    pub fn verify_signatures_except(
        &self,
        allowed_to_be_missing: &BTreeSet<SignerKey>,
    ) -> UpgradeResult {
        for signature in &self.signatures {
            signature.verify(&self.digest)?;
        }
        let signed: BTreeSet<_> = self.signatures.iter().map(|s| s.by).collect();
        let missing: Vec<_> = self
            .required_signers
            .iter()
            .filter(|key| !signed.contains(key) && !allowed_to_be_missing.contains(key))
            .copied()
            .collect();
        tx_ensure!(
            missing.is_empty(),
            UpgradeError::SignaturesMissing { missing }
        );
        Ok(())
    }

    pub fn verify_required_signatures(&self) -> UpgradeResult {
        self.verify_signatures_except(&BTreeSet::new())
    }
}

fn upgrade_outputs(
    inputs: &[StateAndRef],
    upgraded_contract_attachment: &ContractAttachment,
    upgrade: &dyn UpgradedContract,
) -> UpgradeResult<Vec<TransactionState>> {
    inputs
        .iter()
        .map(|input| {
            let state_ref = input.state_ref;
            let constraint = input
                .state
                .constraint
                .upgraded_for(upgraded_contract_attachment)
                .map_err(|kind| UpgradeError::UnsupportedConstraintKind { state_ref, kind })?;
            let data = upgrade.upgrade(&input.state.data).map_err(|e| {
                UpgradeError::StateUpgradeFailure {
                    state_ref,
                    error: e.to_string(),
                }
            })?;
            Ok(TransactionState {
                data,
                contract: upgraded_contract_attachment.contract().clone(),
                notary: input.state.notary.clone(),
                encumbrance: input.state.encumbrance,
                constraint,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../unit_tests/resolved_tests.rs"]
mod resolved_tests;
