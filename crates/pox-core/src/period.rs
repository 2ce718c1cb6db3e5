//! PoX operation-period resolution.
//!
//! Which contract a stacking call must target, and which functions it may
//! use, depends on how far the chain has moved through a PoX contract
//! upgrade. [`resolve_period`] classifies a [`PoxSnapshot`] into one of the
//! [`Period`]s.

use core::fmt::Display;
use core::future::Future;

use serde::Serialize;

use crate::error::{ClassificationError, StackingError};
use crate::pox::{ContractId, ContractVersion, DataVar, PoxSnapshot};

/// The legacy contract, known only by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyContract {
    pub contract_id: String,
}

/// Contracts known while only the legacy one is usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Period1Contracts {
    /// No upgrade metadata, or a single contract version.
    LegacyOnly { pox1: LegacyContract },
    /// A second contract is deployed but not yet configured for stacking.
    UpgradePending {
        pox1: ContractVersion,
        pox2: ContractVersion,
    },
}

impl Period1Contracts {
    /// Id of the legacy contract.
    pub fn legacy_contract_id(&self) -> &str {
        match self {
            Period1Contracts::LegacyOnly { pox1 } => &pox1.contract_id,
            Period1Contracts::UpgradePending { pox1, .. } => &pox1.contract_id,
        }
    }
}

/// Stage of a PoX contract upgrade the chain is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "period")]
pub enum Period {
    /// Only the legacy contract is usable.
    Period1(Period1Contracts),
    /// The legacy contract is still active, the second one is configured.
    Period2a {
        pox1: ContractVersion,
        pox2: ContractVersion,
        current: Option<ContractVersion>,
    },
    /// The second contract is active but its first reward cycle has not begun.
    Period2b {
        pox1: ContractVersion,
        pox2: ContractVersion,
        current: Option<ContractVersion>,
    },
    /// A contract other than the legacy one is fully live.
    Period3 {
        pox1: ContractVersion,
        pox2: ContractVersion,
        pox3: Option<ContractVersion>,
        current: Option<ContractVersion>,
    },
}

impl Period {
    /// Get the period name.
    pub fn name(&self) -> &'static str {
        match self {
            Period::Period1(_) => "Period1",
            Period::Period2a { .. } => "Period2a",
            Period::Period2b { .. } => "Period2b",
            Period::Period3 { .. } => "Period3",
        }
    }

    /// The contract lock and delegation calls should target.
    pub fn stacking_contract(&self) -> &str {
        match self {
            Period::Period1(contracts) => contracts.legacy_contract_id(),
            Period::Period2a { pox2, .. } | Period::Period2b { pox2, .. } => &pox2.contract_id,
            Period::Period3 { pox2, current, .. } => {
                &current.as_ref().unwrap_or(pox2).contract_id
            }
        }
    }

    /// Fail unless PoX-2 functions (extend, increase) are available.
    pub fn ensure_pox2_activated(&self) -> Result<(), StackingError> {
        match self {
            Period::Period1(_) => Err(StackingError::Pox2NotActivated {
                period: self.name(),
            }),
            _ => Ok(()),
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify the current PoX operation period.
///
/// `fetch_configured` reads the `configured` data var of a contract; it is
/// awaited at most once, and only when exactly two contract versions exist.
/// Its failures are surfaced as [`ClassificationError::FlagFetch`] without
/// retrying.
pub async fn resolve_period<F, Fut, E>(
    snapshot: &PoxSnapshot,
    fetch_configured: F,
) -> Result<Period, ClassificationError>
where
    F: FnOnce(DataVar) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    let legacy_only = || {
        Period::Period1(Period1Contracts::LegacyOnly {
            pox1: LegacyContract {
                contract_id: snapshot.contract_id.clone(),
            },
        })
    };

    let (Some(height), Some(versions)) = (
        snapshot.current_burnchain_block_height,
        snapshot.contract_versions.as_deref(),
    ) else {
        log::debug!("no upgrade metadata, resolving to Period1");
        return Ok(legacy_only());
    };

    let mut sorted = versions.to_vec();
    sorted.sort_by(|a, b| {
        a.activation_height
            .cmp(&b.activation_height)
            .then_with(|| a.contract_id.cmp(&b.contract_id))
    });

    let (pox1, pox2, rest) = match sorted.as_slice() {
        [pox1, pox2, rest @ ..] => (pox1, pox2, rest),
        _ => {
            log::debug!("single contract version, resolving to Period1");
            return Ok(legacy_only());
        }
    };

    let activated = sorted
        .iter()
        .filter(|v| v.activation_height <= height)
        .collect::<Vec<_>>();
    let current = activated.last().map(|v| (*v).clone());

    if sorted.len() == 2 {
        let contract: ContractId = pox2.contract_id.parse()?;
        let configured = fetch_configured(DataVar::configured(contract))
            .await
            .map_err(|e| ClassificationError::FlagFetch {
                contract_id: pox2.contract_id.clone(),
                message: e.to_string(),
            })?;
        if !configured {
            log::debug!(
                "{} deployed but not configured, resolving to Period1",
                pox2.contract_id
            );
            return Ok(Period::Period1(Period1Contracts::UpgradePending {
                pox1: pox1.clone(),
                pox2: pox2.clone(),
            }));
        }
    }

    let period = if snapshot.contract_id == pox1.contract_id {
        Period::Period2a {
            pox1: pox1.clone(),
            pox2: pox2.clone(),
            current,
        }
    } else if snapshot.contract_id == pox2.contract_id {
        if snapshot.current_cycle.id < pox2.first_reward_cycle_id {
            Period::Period2b {
                pox1: pox1.clone(),
                pox2: pox2.clone(),
                current,
            }
        } else {
            Period::Period3 {
                pox1: pox1.clone(),
                pox2: pox2.clone(),
                pox3: None,
                current,
            }
        }
    } else if activated.len() > 2 {
        Period::Period3 {
            pox1: pox1.clone(),
            pox2: pox2.clone(),
            pox3: rest.first().cloned(),
            current,
        }
    } else {
        log::warn!(
            "active contract {} matches no known version at height {}",
            snapshot.contract_id,
            height
        );
        return Err(ClassificationError::UnknownActiveContract {
            contract_id: snapshot.contract_id.clone(),
        });
    };

    log::debug!(
        "resolved {} at burn height {} (cycle {})",
        period,
        height,
        snapshot.current_cycle.id
    );
    Ok(period)
}
