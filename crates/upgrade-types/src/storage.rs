// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read interfaces the upgrade resolution depends on, plus an in-memory implementation.
//!
//! A lookup that finds nothing returns `Ok(None)`. `Err` is reserved for the store itself failing,
//! which callers may retry.

use crate::attachment::Attachment;
use crate::base_types::StateRef;
use crate::digests::ContractCodeId;
use crate::error::UpgradeResult;
use crate::network_parameters::NetworkParameters;
use crate::state::TransactionState;
use crate::upgrade::UpgradeLogicLoader;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait StateStore: Send + Sync {
    fn get_state(&self, state_ref: &StateRef) -> UpgradeResult<Option<TransactionState>>;
}

pub trait AttachmentStore: Send + Sync {
    fn get_attachment(&self, attachment_id: &ContractCodeId) -> UpgradeResult<Option<Attachment>>;
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn get_state(&self, state_ref: &StateRef) -> UpgradeResult<Option<TransactionState>> {
        self.as_ref().get_state(state_ref)
    }
}

impl<T: AttachmentStore + ?Sized> AttachmentStore for Arc<T> {
    fn get_attachment(&self, attachment_id: &ContractCodeId) -> UpgradeResult<Option<Attachment>> {
        self.as_ref().get_attachment(attachment_id)
    }
}

/// Everything [`UnresolvedUpgradeTransaction::resolve`] reads from the outside world.
///
/// [`UnresolvedUpgradeTransaction::resolve`]: crate::transaction::UnresolvedUpgradeTransaction::resolve
#[derive(Clone)]
pub struct ResolutionContext<'a> {
    pub states: &'a dyn StateStore,
    pub attachments: &'a dyn AttachmentStore,
    pub upgrades: &'a dyn UpgradeLogicLoader,
    pub network_parameters: Arc<NetworkParameters>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        states: &'a dyn StateStore,
        attachments: &'a dyn AttachmentStore,
        upgrades: &'a dyn UpgradeLogicLoader,
        network_parameters: Arc<NetworkParameters>,
    ) -> Self {
        Self {
            states,
            attachments,
            upgrades,
            network_parameters,
        }
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    states: BTreeMap<StateRef, TransactionState>,
    attachments: BTreeMap<ContractCodeId, Attachment>,
}

/// Map backed store for states and attachments. Reads take a shared lock, so concurrent
/// resolutions do not block each other.
#[derive(Default)]
pub struct InMemoryStore(RwLock<InMemoryStoreInner>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_state(&self, state_ref: StateRef, state: TransactionState) {
        self.0.write().states.insert(state_ref, state);
    }

    /// Stores `attachment` under its content hash and returns that hash.
    pub fn insert_attachment(&self, attachment: Attachment) -> ContractCodeId {
        let id = attachment.id();
        self.0.write().attachments.insert(id, attachment);
        id
    }

    pub fn remove_attachment(&self, attachment_id: &ContractCodeId) -> Option<Attachment> {
        self.0.write().attachments.remove(attachment_id)
    }

    pub fn num_states(&self) -> usize {
        self.0.read().states.len()
    }
}

impl StateStore for InMemoryStore {
    fn get_state(&self, state_ref: &StateRef) -> UpgradeResult<Option<TransactionState>> {
        Ok(self.0.read().states.get(state_ref).cloned())
    }
}

impl AttachmentStore for InMemoryStore {
    fn get_attachment(&self, attachment_id: &ContractCodeId) -> UpgradeResult<Option<Attachment>> {
        Ok(self.0.read().attachments.get(attachment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_types::ContractName;
    use crate::digests::TransactionDigest;
    use crate::test_utils::{key_pair, UpgradeFixture};

    #[test]
    fn missing_entries_are_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_state(&StateRef::random()).unwrap(), None);
        assert_eq!(store.get_attachment(&ContractCodeId::random()).unwrap(), None);
    }

    #[test]
    fn attachments_are_keyed_by_content() {
        let store = InMemoryStore::new();
        let contract = ContractName::new("com.example.Token");
        let attachment = Attachment::new(b"code".to_vec(), vec![contract], vec![]);
        let id = store.insert_attachment(attachment.clone());
        assert_eq!(id, attachment.id());
        assert_eq!(store.get_attachment(&id).unwrap(), Some(attachment.clone()));
        assert_eq!(store.remove_attachment(&id), Some(attachment));
        assert_eq!(store.get_attachment(&id).unwrap(), None);
    }

    #[test]
    fn concurrent_reads() {
        let fixture = UpgradeFixture::new();
        let inputs: Vec<_> = (0..8)
            .map(|i| fixture.add_legacy_state(vec![key_pair(i).0]))
            .collect();
        let store: Arc<InMemoryStore> = Arc::new(fixture.store);
        std::thread::scope(|s| {
            for input in &inputs {
                let store = store.clone();
                s.spawn(move || {
                    let state = store.get_state(&input.state_ref).unwrap();
                    assert_eq!(state.as_ref(), Some(&input.state));
                });
            }
        });
        assert_eq!(store.num_states(), inputs.len());
        let absent = StateRef::new(TransactionDigest::new([1; 32]), 0);
        assert_eq!(store.get_state(&absent).unwrap(), None);
    }
}
