//! Federation membership.

use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use std::collections::BTreeSet;

/// Public keys of the federation members allowed to sign blocks and vote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyring {
    members: BTreeSet<PublicKey>,
}

impl Keyring {
    pub fn new(members: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublicKey> {
        self.members.iter()
    }
}

impl FromIterator<PublicKey> for Keyring {
    fn from_iter<I: IntoIterator<Item = PublicKey>>(iter: I) -> Self {
        Self::new(iter)
    }
}
