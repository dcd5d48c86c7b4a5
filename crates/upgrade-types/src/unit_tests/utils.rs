// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::attachment::Attachment;
use crate::base_types::{ContractName, Party, StateRef};
use crate::constraints::AttachmentConstraint;
use crate::crypto::{get_key_pair_from_rng, PrivacySalt, SignerKey, SignerKeyPair};
use crate::digests::{ContractCodeId, TransactionDigest};
use crate::network_parameters::NetworkParameters;
use crate::state::{ContractState, StateAndRef, TransactionState};
use crate::storage::{InMemoryStore, ResolutionContext};
use crate::transaction::{UnresolvedUpgradeTransaction, UpgradeTransactionBuilder};
use crate::upgrade::{UpgradeRegistry, UpgradedContract};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const LEGACY_CONTRACT: &str = "com.example.TokenContract";
pub const UPGRADED_CONTRACT: &str = "com.example.TokenContractV2";

pub const LEGACY_CODE: &[u8] = b"legacy token contract code";
pub const UPGRADED_CODE: &[u8] = b"upgraded token contract code";

/// Data that makes [`TestUpgrade`] fail.
pub const POISON: &[u8] = b"poison";

pub fn init_for_testing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn key_pair(seed: u8) -> (SignerKey, SignerKeyPair) {
    get_key_pair_from_rng(&mut StdRng::from_seed([seed; 32]))
}

pub fn salt(seed: u8) -> PrivacySalt {
    PrivacySalt::generate(&mut StdRng::from_seed([seed; 32]))
}

pub fn legacy_contract() -> ContractName {
    ContractName::new(LEGACY_CONTRACT)
}

pub fn upgraded_contract() -> ContractName {
    ContractName::new(UPGRADED_CONTRACT)
}

/// Appends `-v2` to the state data.
pub struct TestUpgrade {
    pub legacy_contract: ContractName,
    pub legacy_constraint: Option<AttachmentConstraint>,
}

impl TestUpgrade {
    pub fn new() -> Self {
        Self {
            legacy_contract: legacy_contract(),
            legacy_constraint: None,
        }
    }
}

impl UpgradedContract for TestUpgrade {
    fn legacy_contract(&self) -> ContractName {
        self.legacy_contract.clone()
    }

    fn legacy_contract_constraint(&self) -> Option<AttachmentConstraint> {
        self.legacy_constraint.clone()
    }

    fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState> {
        anyhow::ensure!(state.data != POISON, "cannot upgrade poisoned state");
        let mut data = state.data.clone();
        data.extend_from_slice(b"-v2");
        Ok(ContractState::new(state.participants.clone(), data))
    }
}

/// A store holding both contract attachments, a registry with [`TestUpgrade`] and network
/// parameters that allowlist the legacy attachment.
pub struct UpgradeFixture {
    pub store: InMemoryStore,
    pub registry: UpgradeRegistry,
    pub network_parameters: Arc<NetworkParameters>,
    pub notary: Party,
    pub notary_key: SignerKeyPair,
    pub legacy_id: ContractCodeId,
    pub upgraded_id: ContractCodeId,
}

impl UpgradeFixture {
    pub fn new() -> Self {
        Self::with_upgrade(TestUpgrade::new())
    }

    pub fn with_upgrade(upgrade: TestUpgrade) -> Self {
        let (notary_pk, notary_key) = key_pair(100);
        let (attachment_signer, _) = key_pair(101);
        let store = InMemoryStore::new();
        let legacy_id = store.insert_attachment(Attachment::new(
            LEGACY_CODE.to_vec(),
            vec![legacy_contract()],
            vec![attachment_signer],
        ));
        let upgraded_id = store.insert_attachment(Attachment::new(
            UPGRADED_CODE.to_vec(),
            vec![upgraded_contract()],
            vec![attachment_signer],
        ));
        let registry = UpgradeRegistry::new().with(upgraded_contract(), Arc::new(upgrade));
        let network_parameters =
            Arc::new(NetworkParameters::default().allowlist(legacy_contract(), legacy_id));
        Self {
            store,
            registry,
            network_parameters,
            notary: Party::new("Notary", notary_pk),
            notary_key,
            legacy_id,
            upgraded_id,
        }
    }

    pub fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext::new(
            &self.store,
            &self.store,
            &self.registry,
            self.network_parameters.clone(),
        )
    }

    /// Stores a state of `contract` and returns it with its reference.
    pub fn add_state(
        &self,
        contract: ContractName,
        participants: Vec<SignerKey>,
        data: &[u8],
        constraint: AttachmentConstraint,
    ) -> StateAndRef {
        let index = self.store.num_states() as u32;
        let state_ref = StateRef::new(TransactionDigest::new([7; 32]), index);
        let state = TransactionState::new(
            ContractState::new(participants, data.to_vec()),
            contract,
            self.notary.clone(),
            constraint,
        );
        self.store.insert_state(state_ref, state.clone());
        StateAndRef::new(state, state_ref)
    }

    /// Stores an allowlisted state of the legacy contract.
    pub fn add_legacy_state(&self, participants: Vec<SignerKey>) -> StateAndRef {
        self.add_state(
            legacy_contract(),
            participants,
            b"balance",
            AttachmentConstraint::AllowlistedByZone,
        )
    }

    pub fn builder(&self) -> UpgradeTransactionBuilder {
        let mut builder = UpgradeTransactionBuilder::new(
            self.notary.clone(),
            upgraded_contract(),
            self.upgraded_id,
        );
        builder.legacy_contract_attachment_id(self.legacy_id);
        builder
    }

    pub fn unresolved(&self, inputs: &[StateAndRef]) -> UnresolvedUpgradeTransaction {
        let mut builder = self.builder();
        for input in inputs {
            builder.add_input(input.clone());
        }
        builder.build_with_salt(salt(1)).unwrap()
    }
}
