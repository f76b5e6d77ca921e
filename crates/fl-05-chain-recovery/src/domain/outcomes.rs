//! Expected, non-fatal outcomes of startup operations.

use shared_types::{BlockId, Height};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyExists,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    DoesNotExist,
}

/// Result of inserting the height-0 block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenesisOutcome {
    Created(BlockId),
    /// A genesis block was already stored; nothing was written.
    AlreadyExists,
}

/// What one recovery run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryReport {
    pub database: InitOutcome,
    pub zombies_deleted: usize,
    pub blocks_rolled_back: u64,
    pub genesis: GenesisOutcome,
    pub final_height: Option<Height>,
}
