//! Access model and trigger kinds.

use std::fmt;
use std::str::FromStr;

use crate::RaError;

/// Which contention algorithms a terminal may use.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AccessModel {
    /// Random access disabled; every evaluation yields no opportunity.
    #[default]
    Off,
    SlottedAloha,
    Crdsa,
    /// Both algorithms enabled; the trigger decides which one runs.
    AnyAvailable,
}

impl AccessModel {
    /// Does this model enable the algorithm driven by `trigger`?
    #[inline]
    pub fn accepts(self, trigger: TriggerKind) -> bool {
        matches!(
            (self, trigger),
            (AccessModel::SlottedAloha | AccessModel::AnyAvailable, TriggerKind::SlottedAloha)
                | (AccessModel::Crdsa | AccessModel::AnyAvailable, TriggerKind::Crdsa)
        )
    }
}

impl fmt::Display for AccessModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessModel::Off          => "off",
            AccessModel::SlottedAloha => "slotted-aloha",
            AccessModel::Crdsa        => "crdsa",
            AccessModel::AnyAvailable => "any-available",
        };
        f.write_str(s)
    }
}

impl FromStr for AccessModel {
    type Err = RaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "off"           => Ok(AccessModel::Off),
            "slotted-aloha" => Ok(AccessModel::SlottedAloha),
            "crdsa"         => Ok(AccessModel::Crdsa),
            "any-available" => Ok(AccessModel::AnyAvailable),
            other           => Err(RaError::UnknownModel(other.to_string())),
        }
    }
}

/// The event that caused an evaluation.
///
/// Slotted ALOHA is driven by "new data ready"; CRDSA by the periodic
/// superframe boundary.  The trigger selects the algorithm when the model
/// enables both.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerKind {
    SlottedAloha,
    Crdsa,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::SlottedAloha => f.write_str("slotted-aloha-trigger"),
            TriggerKind::Crdsa        => f.write_str("crdsa-trigger"),
        }
    }
}
