// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::ContractName;
use crate::crypto::{content_hash, SignerKey};
use crate::digests::ContractCodeId;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// An immutable blob of contract code, addressed by the hash of its contents.
///
/// The id is never read from the wire: deserialization recomputes it from the data.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
#[serde(from = "AttachmentData", into = "AttachmentData")]
pub struct Attachment {
    id: ContractCodeId,
    data: Vec<u8>,
    contracts: Vec<ContractName>,
    signer_keys: Vec<SignerKey>,
}

/// The serialized form of an [`Attachment`].
#[serde_as]
#[derive(Serialize, Deserialize)]
pub struct AttachmentData {
    #[serde_as(as = "Bytes")]
    data: Vec<u8>,
    contracts: Vec<ContractName>,
    signer_keys: Vec<SignerKey>,
}

impl Attachment {
    pub fn new(data: Vec<u8>, contracts: Vec<ContractName>, signer_keys: Vec<SignerKey>) -> Self {
        Self {
            id: ContractCodeId::new(content_hash(&data)),
            data,
            contracts,
            signer_keys,
        }
    }

    pub fn id(&self) -> ContractCodeId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Contracts whose code this attachment carries.
    pub fn contracts(&self) -> &[ContractName] {
        &self.contracts
    }

    pub fn declares(&self, contract: &ContractName) -> bool {
        self.contracts.contains(contract)
    }

    /// Keys that signed the attachment when it was built.
    pub fn signer_keys(&self) -> &[SignerKey] {
        &self.signer_keys
    }
}

impl From<AttachmentData> for Attachment {
    fn from(data: AttachmentData) -> Self {
        Self::new(data.data, data.contracts, data.signer_keys)
    }
}

impl From<Attachment> for AttachmentData {
    fn from(attachment: Attachment) -> Self {
        Self {
            data: attachment.data,
            contracts: attachment.contracts,
            signer_keys: attachment.signer_keys,
        }
    }
}

/// An attachment bound to the contract it is expected to implement.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ContractAttachment {
    attachment: Attachment,
    contract: ContractName,
}

impl ContractAttachment {
    pub fn new(attachment: Attachment, contract: ContractName) -> Self {
        Self {
            attachment,
            contract,
        }
    }

    pub fn id(&self) -> ContractCodeId {
        self.attachment.id()
    }

    pub fn contract(&self) -> &ContractName {
        &self.contract
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn signer_keys(&self) -> &[SignerKey] {
        self.attachment.signer_keys()
    }
}
