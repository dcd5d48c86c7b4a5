// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{ContractName, Party};
use crate::config::Config;
use crate::digests::ContractCodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type EpochId = u64;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct NotaryInfo {
    pub identity: Party,
    pub validating: bool,
}

/// Snapshot of the parameters every node on the network agrees on. Upgrade verification only
/// reads the allowlist of contract implementations.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkParameters {
    pub epoch: EpochId,
    pub minimum_platform_version: u32,
    #[serde(default)]
    pub notaries: Vec<NotaryInfo>,
    /// Attachments the zone operator accepts as implementations of each contract.
    #[serde(default)]
    pub allowlisted_contract_implementations: BTreeMap<ContractName, Vec<ContractCodeId>>,
}

impl Config for NetworkParameters {}

impl Default for NetworkParameters {
    fn default() -> Self {
        Self {
            epoch: 0,
            minimum_platform_version: 1,
            notaries: Vec::new(),
            allowlisted_contract_implementations: BTreeMap::new(),
        }
    }
}

impl NetworkParameters {
    pub fn is_allowlisted(&self, contract: &ContractName, attachment_id: &ContractCodeId) -> bool {
        self.allowlisted_contract_implementations
            .get(contract)
            .is_some_and(|ids| ids.contains(attachment_id))
    }

    /// Adds `attachment_id` to the allowlist of `contract`.
    pub fn allowlist(mut self, contract: ContractName, attachment_id: ContractCodeId) -> Self {
        let ids = self
            .allowlisted_contract_implementations
            .entry(contract)
            .or_default();
        if !ids.contains(&attachment_id) {
            ids.push(attachment_id);
        }
        self
    }

    pub fn with_notary(mut self, identity: Party, validating: bool) -> Self {
        self.notaries.push(NotaryInfo {
            identity,
            validating,
        });
        self
    }
}

#[cfg(test)]
#[path = "unit_tests/network_parameters_tests.rs"]
mod network_parameters_tests;
