// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{hidden_components_digest, transaction_digest};
use super::{FilteredUpgradeTransaction, ResolvedUpgradeTransaction};
use crate::attachment::{Attachment, ContractAttachment};
use crate::base_types::{ContractName, Party, StateRef};
use crate::crypto::{PrivacySalt, TransactionSignature};
use crate::digests::{ComponentDigest, ContractCodeId, TransactionDigest};
use crate::error::{UpgradeError, UpgradeResult};
use crate::state::StateAndRef;
use crate::storage::ResolutionContext;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

/// The fields of an upgrade transaction as they travel on the wire.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct UpgradeTransactionData {
    pub inputs: Vec<StateRef>,
    pub notary: Party,
    pub legacy_contract_attachment_id: ContractCodeId,
    pub upgraded_contract_name: ContractName,
    pub upgraded_contract_attachment_id: ContractCodeId,
    pub privacy_salt: PrivacySalt,
}

/// An upgrade transaction that names its inputs and attachments by reference only.
///
/// Always consumes at least one state, and never the same state twice. Deserialization checks the
/// same rules as [`UnresolvedUpgradeTransaction::new`].
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UpgradeTransactionData", into = "UpgradeTransactionData")]
pub struct UnresolvedUpgradeTransaction {
    data: UpgradeTransactionData,
    hidden_digest: ComponentDigest,
    digest: TransactionDigest,
}

impl UnresolvedUpgradeTransaction {
    pub fn new(
        inputs: Vec<StateRef>,
        notary: Party,
        legacy_contract_attachment_id: ContractCodeId,
        upgraded_contract_name: ContractName,
        upgraded_contract_attachment_id: ContractCodeId,
        privacy_salt: PrivacySalt,
    ) -> UpgradeResult<Self> {
        Self::from_data(UpgradeTransactionData {
            inputs,
            notary,
            legacy_contract_attachment_id,
            upgraded_contract_name,
            upgraded_contract_attachment_id,
            privacy_salt,
        })
    }

    pub fn from_data(data: UpgradeTransactionData) -> UpgradeResult<Self> {
        tx_ensure!(
            !data.inputs.is_empty(),
            UpgradeError::invalid_structure("An upgrade transaction must have inputs")
        );
        tx_ensure!(
            data.inputs.iter().all_unique(),
            UpgradeError::invalid_structure("An upgrade transaction must not have duplicate inputs")
        );
        let hidden_digest = hidden_components_digest(
            data.legacy_contract_attachment_id,
            &data.upgraded_contract_name,
            data.privacy_salt,
        );
        let digest = transaction_digest(&data.inputs, &data.notary, hidden_digest);
        Ok(Self {
            data,
            hidden_digest,
            digest,
        })
    }

    pub fn data(&self) -> &UpgradeTransactionData {
        &self.data
    }

    pub fn into_data(self) -> UpgradeTransactionData {
        self.data
    }

    pub fn digest(&self) -> &TransactionDigest {
        &self.digest
    }

    /// Digest of the components a [`FilteredUpgradeTransaction`] does not reveal.
    pub fn hidden_components_digest(&self) -> ComponentDigest {
        self.hidden_digest
    }

    pub fn inputs(&self) -> &[StateRef] {
        &self.data.inputs
    }

    pub fn notary(&self) -> &Party {
        &self.data.notary
    }

    pub fn legacy_contract_attachment_id(&self) -> ContractCodeId {
        self.data.legacy_contract_attachment_id
    }

    pub fn upgraded_contract_name(&self) -> &ContractName {
        &self.data.upgraded_contract_name
    }

    pub fn upgraded_contract_attachment_id(&self) -> ContractCodeId {
        self.data.upgraded_contract_attachment_id
    }

    pub fn privacy_salt(&self) -> PrivacySalt {
        self.data.privacy_salt
    }

    /// The projection shown to a non-validating notary. It has the same digest as `self`.
    pub fn filter(&self) -> FilteredUpgradeTransaction {
        FilteredUpgradeTransaction::new(
            self.data.inputs.clone(),
            self.data.notary.clone(),
            self.hidden_digest,
        )
    }

    /// Loads the inputs and both attachments and verifies the upgrade.
    ///
    /// Each attachment is bound to a contract it declares. The legacy attachment prefers the
    /// legacy contract named by the upgrade logic and the upgraded attachment must declare
    /// [`Self::upgraded_contract_name`]. Every other rule is checked by
    /// [`ResolvedUpgradeTransaction::new`].
    #[instrument(level = "debug", skip_all, fields(tx_digest = ?self.digest))]
    pub fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signatures: Vec<TransactionSignature>,
    ) -> UpgradeResult<ResolvedUpgradeTransaction> {
        let inputs = self
            .data
            .inputs
            .iter()
            .map(|state_ref| {
                ctx.states
                    .get_state(state_ref)?
                    .map(|state| StateAndRef::new(state, *state_ref))
                    .ok_or(UpgradeError::StateResolutionFailure {
                        state_ref: *state_ref,
                    })
            })
            .collect::<UpgradeResult<Vec<_>>>()?;
        trace!(num_inputs = inputs.len(), "Resolved input states");

        let legacy = load_attachment(ctx, self.data.legacy_contract_attachment_id)?;
        let upgraded = load_attachment(ctx, self.data.upgraded_contract_attachment_id)?;

        let upgraded_contract = &self.data.upgraded_contract_name;
        let upgrade = ctx.upgrades.load_upgrade_logic(upgraded_contract).ok_or_else(|| {
            UpgradeError::UpgradeLogicUnavailable {
                contract: upgraded_contract.clone(),
            }
        })?;
        let legacy_contract = bind_legacy_contract(&legacy, upgrade.legacy_contract())?;
        tx_ensure!(
            upgraded.declares(upgraded_contract),
            UpgradeError::AttachmentContractMissing {
                attachment_id: upgraded.id(),
                contract: upgraded_contract.clone(),
            }
        );
        trace!(%legacy_contract, "Bound legacy attachment");
        let legacy = ContractAttachment::new(legacy, legacy_contract);
        let upgraded = ContractAttachment::new(upgraded, upgraded_contract.clone());

        let resolved = ResolvedUpgradeTransaction::new(
            inputs,
            self.data.notary.clone(),
            legacy,
            upgraded,
            self.digest,
            self.data.privacy_salt,
            signatures,
            ctx.network_parameters.clone(),
            ctx.upgrades,
        )?;
        debug!(
            num_inputs = resolved.inputs().len(),
            num_signers = resolved.required_signers().len(),
            "Resolved upgrade transaction"
        );
        Ok(resolved)
    }
}

fn load_attachment(
    ctx: &ResolutionContext<'_>,
    attachment_id: ContractCodeId,
) -> UpgradeResult<Attachment> {
    let attachment = ctx
        .attachments
        .get_attachment(&attachment_id)?
        .ok_or(UpgradeError::AttachmentResolutionFailure { attachment_id })?;
    if attachment.id() != attachment_id {
        warn!(
            requested = %attachment_id,
            returned = %attachment.id(),
            "Attachment store returned a different attachment"
        );
        return Err(UpgradeError::AttachmentResolutionFailure { attachment_id });
    }
    Ok(attachment)
}

/// Picks the contract the legacy attachment is checked against. A declared contract that the
/// upgrade accepts wins, otherwise the first declared one.
fn bind_legacy_contract(
    legacy: &Attachment,
    declared_legacy: ContractName,
) -> UpgradeResult<ContractName> {
    if legacy.declares(&declared_legacy) {
        return Ok(declared_legacy);
    }
    legacy
        .contracts()
        .first()
        .cloned()
        .ok_or(UpgradeError::AttachmentContractMissing {
            attachment_id: legacy.id(),
            contract: declared_legacy,
        })
}

impl TryFrom<UpgradeTransactionData> for UnresolvedUpgradeTransaction {
    type Error = UpgradeError;

    fn try_from(data: UpgradeTransactionData) -> UpgradeResult<Self> {
        Self::from_data(data)
    }
}

impl From<UnresolvedUpgradeTransaction> for UpgradeTransactionData {
    fn from(tx: UnresolvedUpgradeTransaction) -> Self {
        tx.data
    }
}

#[cfg(test)]
#[path = "../unit_tests/unresolved_tests.rs"]
mod unresolved_tests;
