// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::UnresolvedUpgradeTransaction;
use crate::base_types::{ContractName, Party};
use crate::crypto::PrivacySalt;
use crate::digests::ContractCodeId;
use crate::error::{UpgradeError, UpgradeResult};
use crate::state::StateAndRef;

/// Assembles an [`UnresolvedUpgradeTransaction`] from the states it upgrades.
#[derive(Debug, Clone)]
pub struct UpgradeTransactionBuilder {
    notary: Party,
    inputs: Vec<StateAndRef>,
    legacy_contract_attachment_id: Option<ContractCodeId>,
    upgraded_contract_name: ContractName,
    upgraded_contract_attachment_id: ContractCodeId,
}

impl UpgradeTransactionBuilder {
    pub fn new(
        notary: Party,
        upgraded_contract_name: ContractName,
        upgraded_contract_attachment_id: ContractCodeId,
    ) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            legacy_contract_attachment_id: None,
            upgraded_contract_name,
            upgraded_contract_attachment_id,
        }
    }

    pub fn add_input(&mut self, input: StateAndRef) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn legacy_contract_attachment_id(&mut self, attachment_id: ContractCodeId) -> &mut Self {
        self.legacy_contract_attachment_id = Some(attachment_id);
        self
    }

    /// Builds the transaction with a fresh random privacy salt.
    pub fn build(self) -> UpgradeResult<UnresolvedUpgradeTransaction> {
        self.build_with_salt(PrivacySalt::random())
    }

    pub fn build_with_salt(
        self,
        privacy_salt: PrivacySalt,
    ) -> UpgradeResult<UnresolvedUpgradeTransaction> {
        let legacy_contract_attachment_id = self.legacy_contract_attachment_id.ok_or_else(|| {
            UpgradeError::invalid_structure("The legacy contract attachment is not set")
        })?;

        if let Some(first) = self.inputs.first() {
            let contract = &first.state.contract;
            for input in &self.inputs {
                tx_ensure!(
                    input.state.contract == *contract,
                    UpgradeError::invalid_structure(format!(
                        "Input {} is governed by {}, expected {}",
                        input.state_ref, input.state.contract, contract
                    ))
                );
                tx_ensure!(
                    input.state.notary == self.notary,
                    UpgradeError::invalid_structure(format!(
                        "Input {} is notarised by {}, expected {}",
                        input.state_ref, input.state.notary, self.notary
                    ))
                );
            }
        }

        UnresolvedUpgradeTransaction::new(
            self.inputs.iter().map(|input| input.state_ref).collect(),
            self.notary,
            legacy_contract_attachment_id,
            self.upgraded_contract_name,
            self.upgraded_contract_attachment_id,
            privacy_salt,
        )
    }
}
