// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::attachment::ContractAttachment;
use crate::crypto::SignerKey;
use crate::digests::ContractCodeId;
use crate::network_parameters::NetworkParameters;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Policy attached to a state that decides which attachments are acceptable implementations of
/// the state's contract.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub enum AttachmentConstraint {
    /// Any attachment is accepted.
    AlwaysAccept,
    /// Only the attachment with exactly this content hash is accepted.
    HashPinned(ContractCodeId),
    /// Any attachment the network parameters allowlist for the contract is accepted.
    AllowlistedByZone,
    /// Any attachment signed by this key is accepted.
    SignedBy(SignerKey),
    /// Stands in for a real constraint until the transaction builder picks one. Never satisfied.
    AutomaticPlaceholder,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash, Display)]
pub enum ConstraintKind {
    AlwaysAccept,
    HashPinned,
    AllowlistedByZone,
    SignedBy,
    AutomaticPlaceholder,
}

impl AttachmentConstraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            AttachmentConstraint::AlwaysAccept => ConstraintKind::AlwaysAccept,
            AttachmentConstraint::HashPinned(_) => ConstraintKind::HashPinned,
            AttachmentConstraint::AllowlistedByZone => ConstraintKind::AllowlistedByZone,
            AttachmentConstraint::SignedBy(_) => ConstraintKind::SignedBy,
            AttachmentConstraint::AutomaticPlaceholder => ConstraintKind::AutomaticPlaceholder,
        }
    }

    pub fn is_satisfied_by(
        &self,
        attachment: &ContractAttachment,
        network_parameters: &NetworkParameters,
    ) -> bool {
        match self {
            AttachmentConstraint::AlwaysAccept => true,
            AttachmentConstraint::HashPinned(id) => *id == attachment.id(),
            AttachmentConstraint::AllowlistedByZone => {
                network_parameters.is_allowlisted(attachment.contract(), &attachment.id())
            }
            AttachmentConstraint::SignedBy(key) => attachment.signer_keys().contains(key),
            AttachmentConstraint::AutomaticPlaceholder => false,
        }
    }

    /// The constraint an upgraded output carries when its input carried `self`. A hash pin moves
    /// to the upgraded attachment, the zone allowlist carries over as is. Any other kind has no
    /// upgrade rule and is returned as the error.
    pub fn upgraded_for(&self, upgraded: &ContractAttachment) -> Result<Self, ConstraintKind> {
        match self {
            AttachmentConstraint::HashPinned(_) => {
                Ok(AttachmentConstraint::HashPinned(upgraded.id()))
            }
            AttachmentConstraint::AllowlistedByZone => Ok(AttachmentConstraint::AllowlistedByZone),
            AttachmentConstraint::AlwaysAccept
            | AttachmentConstraint::SignedBy(_)
            | AttachmentConstraint::AutomaticPlaceholder => Err(self.kind()),
        }
    }
}

#[cfg(test)]
#[path = "unit_tests/constraints_tests.rs"]
mod constraints_tests;
