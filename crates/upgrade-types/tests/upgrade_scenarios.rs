// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use upgrade_types::attachment::Attachment;
use upgrade_types::base_types::{ContractName, Party, StateRef};
use upgrade_types::constraints::{AttachmentConstraint, ConstraintKind};
use upgrade_types::crypto::{
    get_key_pair_from_rng, PrivacySalt, SignerKey, TransactionSignature,
};
use upgrade_types::digests::{ContractCodeId, TransactionDigest};
use upgrade_types::error::{UpgradeError, UpgradeResult};
use upgrade_types::network_parameters::NetworkParameters;
use upgrade_types::state::{ContractState, StateAndRef, TransactionState};
use upgrade_types::storage::{AttachmentStore, InMemoryStore, ResolutionContext};
use upgrade_types::transaction::{UnresolvedUpgradeTransaction, UpgradeTransactionBuilder};
use upgrade_types::upgrade::{UpgradeRegistry, UpgradedContract};

const P1: &str = "com.example.cash.Cash";
const P2: &str = "com.example.cash.Obligation";
const P1_V2: &str = "com.example.cash.CashV2";

/// Doubles every byte of the state data.
struct CashUpgrade;

impl UpgradedContract for CashUpgrade {
    fn legacy_contract(&self) -> ContractName {
        ContractName::new(P1)
    }

    fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState> {
        Ok(ContractState::new(
            state.participants.clone(),
            state.data.iter().map(|b| b.wrapping_mul(2)).collect(),
        ))
    }
}

struct Network {
    store: InMemoryStore,
    registry: UpgradeRegistry,
    parameters: Arc<NetworkParameters>,
    notary: Party,
    legacy_id: ContractCodeId,
    upgraded_id: ContractCodeId,
    rng: StdRng,
}

impl Network {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut rng = StdRng::from_seed([0; 32]);
        let (notary_key, _) = get_key_pair_from_rng(&mut rng);
        let store = InMemoryStore::new();
        let legacy_id = store.insert_attachment(Attachment::new(
            b"cash v1".to_vec(),
            vec![ContractName::new(P1)],
            vec![],
        ));
        let upgraded_id = store.insert_attachment(Attachment::new(
            b"cash v2".to_vec(),
            vec![ContractName::new(P1_V2)],
            vec![],
        ));
        let registry =
            UpgradeRegistry::new().with(ContractName::new(P1_V2), Arc::new(CashUpgrade));
        let parameters =
            Arc::new(NetworkParameters::default().allowlist(ContractName::new(P1), legacy_id));
        Self {
            store,
            registry,
            parameters,
            notary: Party::new("Notary", notary_key),
            legacy_id,
            upgraded_id,
            rng,
        }
    }

    fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext::new(
            &self.store,
            &self.store,
            &self.registry,
            self.parameters.clone(),
        )
    }

    fn participant(&mut self) -> SignerKey {
        get_key_pair_from_rng(&mut self.rng).0
    }

    fn issue(
        &self,
        contract: &str,
        participants: Vec<SignerKey>,
        constraint: AttachmentConstraint,
    ) -> StateAndRef {
        let index = self.store.num_states() as u32;
        let state_ref = StateRef::new(TransactionDigest::new([1; 32]), index);
        let state = TransactionState::new(
            ContractState::new(participants, vec![1, 2, 3]),
            ContractName::new(contract),
            self.notary.clone(),
            constraint,
        );
        self.store.insert_state(state_ref, state.clone());
        StateAndRef::new(state, state_ref)
    }

    fn upgrade_of(&self, inputs: Vec<StateAndRef>) -> UnresolvedUpgradeTransaction {
        let mut builder = UpgradeTransactionBuilder::new(
            self.notary.clone(),
            ContractName::new(P1_V2),
            self.upgraded_id,
        );
        builder.legacy_contract_attachment_id(self.legacy_id);
        for input in inputs {
            builder.add_input(input);
        }
        builder.build().unwrap()
    }
}

#[test]
fn allowlisted_state_upgrades() {
    let mut network = Network::new();
    let owner = network.participant();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let tx = network.upgrade_of(vec![input]);

    let resolved = tx.resolve(&network.context(), vec![]).unwrap();
    assert_eq!(resolved.outputs().len(), 1);
    let output = &resolved.outputs()[0];
    assert_eq!(output.contract, ContractName::new(P1_V2));
    assert_eq!(output.constraint, AttachmentConstraint::AllowlistedByZone);
    assert_eq!(output.data.data, vec![2, 4, 6]);
    assert_eq!(resolved.digest(), tx.digest());
}

#[test]
fn input_of_another_contract_is_rejected() {
    let mut network = Network::new();
    let owner = network.participant();
    let cash = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let obligation = network.issue(P2, vec![owner], AttachmentConstraint::AllowlistedByZone);
    // The builder refuses mixed contracts, so assemble the wire form directly.
    let tx = UnresolvedUpgradeTransaction::new(
        vec![cash.state_ref, obligation.state_ref],
        network.notary.clone(),
        network.legacy_id,
        ContractName::new(P1_V2),
        network.upgraded_id,
        PrivacySalt::random(),
    )
    .unwrap();
    let err = tx.resolve(&network.context(), vec![]).unwrap_err();
    assert_eq!(
        err,
        UpgradeError::ContractMismatch {
            state_ref: obligation.state_ref,
            expected: ContractName::new(P1),
            actual: ContractName::new(P2),
        }
    );

    // The legacy attachment declares only the cash contract, so a lone obligation still mismatches.
    let only_obligation = network.upgrade_of(vec![obligation.clone()]);
    assert_eq!(
        only_obligation.resolve(&network.context(), vec![]).unwrap_err(),
        UpgradeError::ContractMismatch {
            state_ref: obligation.state_ref,
            expected: ContractName::new(P1),
            actual: ContractName::new(P2),
        }
    );
}

#[test]
fn attachment_must_declare_upgraded_contract() {
    let mut network = Network::new();
    let owner = network.participant();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let anonymous = network.store.insert_attachment(Attachment::new(
        b"cash v2, undeclared".to_vec(),
        vec![],
        vec![],
    ));
    network.upgraded_id = anonymous;
    let tx = network.upgrade_of(vec![input]);
    let err = tx.resolve(&network.context(), vec![]).unwrap_err();
    assert_eq!(
        err,
        UpgradeError::AttachmentContractMissing {
            attachment_id: anonymous,
            contract: ContractName::new(P1_V2),
        }
    );
    assert!(!err.is_retryable());
}

/// Serves `substitute` whatever attachment is asked for.
struct SubstitutingStore {
    inner: InMemoryStore,
    substitute: Attachment,
}

impl AttachmentStore for SubstitutingStore {
    fn get_attachment(&self, _id: &ContractCodeId) -> UpgradeResult<Option<Attachment>> {
        Ok(Some(self.substitute.clone()))
    }
}

#[test]
fn attachment_with_wrong_id_is_rejected() {
    let mut network = Network::new();
    let owner = network.participant();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let tx = network.upgrade_of(vec![input]);

    let substitute = Attachment::new(b"other code".to_vec(), vec![ContractName::new(P1)], vec![]);
    let parameters = Arc::new(
        NetworkParameters::default()
            .allowlist(ContractName::new(P1), network.legacy_id)
            .allowlist(ContractName::new(P1), substitute.id()),
    );
    let store = SubstitutingStore {
        inner: network.store,
        substitute,
    };
    let ctx = ResolutionContext::new(&store.inner, &store, &network.registry, parameters);
    let err = tx.resolve(&ctx, vec![]).unwrap_err();
    assert_eq!(
        err,
        UpgradeError::AttachmentResolutionFailure {
            attachment_id: network.legacy_id
        }
    );
}

#[test]
fn missing_legacy_attachment_is_reported() {
    let mut network = Network::new();
    let owner = network.participant();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let tx = network.upgrade_of(vec![input]);
    network.store.remove_attachment(&network.legacy_id);

    let err = tx.resolve(&network.context(), vec![]).unwrap_err();
    assert_eq!(
        err,
        UpgradeError::AttachmentResolutionFailure {
            attachment_id: network.legacy_id
        }
    );
    assert!(err.is_retryable());
}

#[test]
fn constraint_without_upgrade_rule_is_rejected() {
    let mut network = Network::new();
    let owner = network.participant();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AlwaysAccept);
    let tx = network.upgrade_of(vec![input.clone()]);
    let err = tx.resolve(&network.context(), vec![]).unwrap_err();
    assert_eq!(
        err,
        UpgradeError::UnsupportedConstraintKind {
            state_ref: input.state_ref,
            kind: ConstraintKind::AlwaysAccept,
        }
    );
}

#[test]
fn unsupported_constraint_fails_whole_transaction() {
    let mut network = Network::new();
    let owner = network.participant();
    let inputs = vec![
        network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone),
        network.issue(P1, vec![owner], AttachmentConstraint::HashPinned(network.legacy_id)),
        network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone),
        network.issue(P1, vec![owner], AttachmentConstraint::AlwaysAccept),
    ];
    let last = inputs[3].state_ref;
    let tx = network.upgrade_of(inputs);
    assert_eq!(
        tx.resolve(&network.context(), vec![]).unwrap_err(),
        UpgradeError::UnsupportedConstraintKind {
            state_ref: last,
            kind: ConstraintKind::AlwaysAccept,
        }
    );
}

#[test]
fn hash_pin_moves_to_upgraded_attachment() {
    let mut network = Network::new();
    let owner = network.participant();
    let constraint = AttachmentConstraint::HashPinned(network.legacy_id);
    let pinned = network.issue(P1, vec![owner], constraint);
    let tx = network.upgrade_of(vec![pinned]);
    let resolved = tx.resolve(&network.context(), vec![]).unwrap();
    assert_eq!(
        resolved.outputs()[0].constraint,
        AttachmentConstraint::HashPinned(network.upgraded_id)
    );
}

#[test]
fn signers_are_deduplicated() {
    let mut network = Network::new();
    let alice = network.participant();
    let bob = network.participant();
    let carol = network.participant();
    let inputs = vec![
        network.issue(P1, vec![alice, bob], AttachmentConstraint::AllowlistedByZone),
        network.issue(P1, vec![bob], AttachmentConstraint::AllowlistedByZone),
        network.issue(P1, vec![carol, alice], AttachmentConstraint::AllowlistedByZone),
    ];
    let tx = network.upgrade_of(inputs);
    let resolved = tx.resolve(&network.context(), vec![]).unwrap();
    let expected: BTreeSet<_> = [alice, bob, carol, network.notary.owning_key]
        .into_iter()
        .collect();
    assert_eq!(resolved.required_signers(), &expected);
    assert_eq!(resolved.outputs().len(), 3);
}

#[test]
fn resolution_is_deterministic_across_threads() {
    let mut network = Network::new();
    let owners: Vec<_> = (0..4).map(|_| network.participant()).collect();
    let inputs = owners
        .iter()
        .map(|owner| network.issue(P1, vec![*owner], AttachmentConstraint::AllowlistedByZone))
        .collect();
    let tx = network.upgrade_of(inputs);

    let first = tx.resolve(&network.context(), vec![]).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| tx.resolve(&network.context(), vec![]).unwrap()))
            .collect();
        for handle in handles {
            let resolved = handle.join().unwrap();
            assert_eq!(resolved.outputs(), first.outputs());
            assert_eq!(resolved.required_signers(), first.required_signers());
        }
    });
}

#[test]
fn notary_sees_filtered_form_and_signs() {
    let mut rng = StdRng::from_seed([9; 32]);
    let (owner, owner_key) = get_key_pair_from_rng(&mut rng);
    let network = Network::new();
    let input = network.issue(P1, vec![owner], AttachmentConstraint::AllowlistedByZone);
    let tx = network.upgrade_of(vec![input]);

    let filtered = tx.filter();
    filtered.check_digest(tx.digest()).unwrap();
    assert!(filtered.outputs().is_empty());

    let signatures = vec![TransactionSignature::new(tx.digest(), &owner_key)];
    let resolved = tx.resolve(&network.context(), signatures).unwrap();
    let notary: BTreeSet<_> = [network.notary.owning_key].into_iter().collect();
    resolved.verify_signatures_except(&notary).unwrap();
    assert!(matches!(
        resolved.verify_required_signatures(),
        Err(UpgradeError::SignaturesMissing { .. })
    ));
}
