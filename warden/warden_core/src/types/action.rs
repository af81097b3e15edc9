//! Action kinds.
//!
//! Every permission query names the kind of operation being attempted.
//! Authorities use [`ActionKind::is_block_action`] to decide whether they
//! have an opinion at all.

use std::fmt;
use serde::{Serialize, Deserialize};

/// The kind of operation a principal is attempting at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Generic block interaction.
    BlockAction,

    /// Opening or modifying a container (chest, furnace, ...).
    ContainerAction,

    /// Breaking a block.
    BreakBlock,

    /// Placing a block.
    PlaceBlock,

    /// Using a block without changing it (buttons, doors, levers).
    InteractBlock,

    /// Attacking another player.
    AttackPlayer,

    /// Attacking a non-player entity.
    AttackEntity,

    /// Moving into the location.
    Movement,

    /// Anything else.
    Other,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [ActionKind; 9] = [
        Self::BlockAction,
        Self::ContainerAction,
        Self::BreakBlock,
        Self::PlaceBlock,
        Self::InteractBlock,
        Self::AttackPlayer,
        Self::AttackEntity,
        Self::Movement,
        Self::Other,
    ];

    /// Whether this action affects the block at the target location.
    ///
    /// Containers are blocks, so container access counts.
    pub fn is_block_action(&self) -> bool {
        matches!(
            self,
            Self::BlockAction
                | Self::ContainerAction
                | Self::BreakBlock
                | Self::PlaceBlock
                | Self::InteractBlock
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::BlockAction => "block_action",
            Self::ContainerAction => "container_action",
            Self::BreakBlock => "break_block",
            Self::PlaceBlock => "place_block",
            Self::InteractBlock => "interact_block",
            Self::AttackPlayer => "attack_player",
            Self::AttackEntity => "attack_entity",
            Self::Movement => "movement",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
