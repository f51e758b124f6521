//! The opportunity descriptor returned by every evaluation.

use std::collections::BTreeSet;
use std::fmt;

use crate::AllocationChannelId;

/// Plain tag of an [`Opportunity`], for logging and counting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpportunityKind {
    None,
    SlottedAloha,
    Crdsa,
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpportunityKind::None         => f.write_str("none"),
            OpportunityKind::SlottedAloha => f.write_str("slotted-aloha"),
            OpportunityKind::Crdsa        => f.write_str("crdsa"),
        }
    }
}

/// What the terminal may do this block.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opportunity {
    /// No opportunistic transmission this block.
    None,

    /// Wait `release_slot` elementary slots, then transmit in the next
    /// available one.
    SlottedAloha { release_slot: u32 },

    /// One set per unique packet; each set holds the slot indices of that
    /// packet's replicas within the frame.
    Crdsa { slot_sets: Vec<BTreeSet<u32>> },
}

/// The scheduler's decision for one evaluation.
///
/// The MAC layer turns this into an actual transmission; the scheduler has
/// no visibility into what happens afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxOpportunity {
    pub allocation_channel: AllocationChannelId,
    pub opportunity:        Opportunity,
}

impl TxOpportunity {
    /// "Do nothing" on `allocation_channel`.
    #[inline]
    pub fn none(allocation_channel: AllocationChannelId) -> Self {
        Self { allocation_channel, opportunity: Opportunity::None }
    }

    #[inline]
    pub fn slotted_aloha(allocation_channel: AllocationChannelId, release_slot: u32) -> Self {
        Self {
            allocation_channel,
            opportunity: Opportunity::SlottedAloha { release_slot },
        }
    }

    #[inline]
    pub fn crdsa(allocation_channel: AllocationChannelId, slot_sets: Vec<BTreeSet<u32>>) -> Self {
        Self {
            allocation_channel,
            opportunity: Opportunity::Crdsa { slot_sets },
        }
    }

    pub fn kind(&self) -> OpportunityKind {
        match self.opportunity {
            Opportunity::None                => OpportunityKind::None,
            Opportunity::SlottedAloha { .. } => OpportunityKind::SlottedAloha,
            Opportunity::Crdsa { .. }        => OpportunityKind::Crdsa,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self.opportunity, Opportunity::None)
    }

    /// Release slot, if this is a Slotted ALOHA opportunity.
    pub fn slotted_aloha_slot(&self) -> Option<u32> {
        match self.opportunity {
            Opportunity::SlottedAloha { release_slot } => Some(release_slot),
            _ => None,
        }
    }

    /// Replica slot sets; empty unless this is a CRDSA opportunity.
    pub fn crdsa_slot_sets(&self) -> &[BTreeSet<u32>] {
        match &self.opportunity {
            Opportunity::Crdsa { slot_sets } => slot_sets,
            _ => &[],
        }
    }
}
