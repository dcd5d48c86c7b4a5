// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::ContractName;
use crate::constraints::AttachmentConstraint;
use crate::state::ContractState;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Logic that migrates states of a legacy contract to the contract implementing it.
pub trait UpgradedContract: Send + Sync {
    /// The contract whose states this upgrade accepts.
    fn legacy_contract(&self) -> ContractName;

    /// The constraint the legacy attachment must satisfy. `None` falls back to the zone allowlist.
    fn legacy_contract_constraint(&self) -> Option<AttachmentConstraint> {
        None
    }

    fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState>;
}

/// Finds the upgrade logic of a contract by name.
pub trait UpgradeLogicLoader: Send + Sync {
    fn load_upgrade_logic(&self, contract: &ContractName) -> Option<Arc<dyn UpgradedContract>>;
}

/// Upgrade logic registered up front, keyed by the name of the upgraded contract.
#[derive(Default, Clone)]
pub struct UpgradeRegistry {
    upgrades: BTreeMap<ContractName, Arc<dyn UpgradedContract>>,
}

impl UpgradeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `upgrade` as the logic of `contract`, replacing any previous registration.
    pub fn register(
        &mut self,
        contract: ContractName,
        upgrade: Arc<dyn UpgradedContract>,
    ) -> &mut Self {
        trace!(
            %contract,
            legacy_contract = %upgrade.legacy_contract(),
            "Registering upgrade logic"
        );
        self.upgrades.insert(contract, upgrade);
        self
    }

    pub fn with(mut self, contract: ContractName, upgrade: Arc<dyn UpgradedContract>) -> Self {
        self.register(contract, upgrade);
        self
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractName> {
        self.upgrades.keys()
    }
}

impl UpgradeLogicLoader for UpgradeRegistry {
    fn load_upgrade_logic(&self, contract: &ContractName) -> Option<Arc<dyn UpgradedContract>> {
        self.upgrades.get(contract).cloned()
    }
}

impl fmt::Debug for UpgradeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.upgrades.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{legacy_contract, upgraded_contract, TestUpgrade};

    #[test]
    fn registry_loads_by_upgraded_contract() {
        let registry =
            UpgradeRegistry::new().with(upgraded_contract(), Arc::new(TestUpgrade::new()));
        let upgrade = registry.load_upgrade_logic(&upgraded_contract()).unwrap();
        assert_eq!(upgrade.legacy_contract(), legacy_contract());
        assert_eq!(upgrade.legacy_contract_constraint(), None);
        assert!(registry.load_upgrade_logic(&legacy_contract()).is_none());
        assert_eq!(
            registry.contracts().collect::<Vec<_>>(),
            vec![&upgraded_contract()]
        );
    }

    #[test]
    fn register_replaces_previous_logic() {
        let mut registry = UpgradeRegistry::new();
        registry.register(upgraded_contract(), Arc::new(TestUpgrade::new()));
        registry.register(
            upgraded_contract(),
            Arc::new(TestUpgrade {
                legacy_contract: ContractName::new("com.example.Other"),
                legacy_constraint: Some(AttachmentConstraint::AlwaysAccept),
            }),
        );
        let upgrade = registry.load_upgrade_logic(&upgraded_contract()).unwrap();
        assert_eq!(
            upgrade.legacy_contract(),
            ContractName::new("com.example.Other")
        );
        assert_eq!(
            format!("{:?}", registry),
            format!("{{{:?}}}", upgraded_contract())
        );
    }
}
