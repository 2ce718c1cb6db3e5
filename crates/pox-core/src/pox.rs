//! PoX metadata records as reported by a Stacks node.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClassificationError, Result};
use crate::network::Network;

/// Name of the data var flipped once a new PoX contract is ready for stacking.
pub const CONFIGURED_VAR: &str = "configured";

/// Serialized Clarity `true`, as returned by the data var endpoint.
const CLARITY_TRUE_HEX: &str = "0x03";

/// Alphabet of c32-encoded Stacks addresses.
const C32_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// One deployed revision of the PoX contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractVersion {
    /// `address.name` of the contract.
    pub contract_id: String,
    /// Burnchain height at which this version takes over.
    #[serde(rename = "activation_burnchain_block_height")]
    pub activation_height: u64,
    /// First reward cycle handled by this version.
    pub first_reward_cycle_id: u64,
}

/// Reward cycle summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleInfo {
    pub id: u64,
    #[serde(default)]
    pub min_threshold_ustx: u64,
    #[serde(default)]
    pub stacked_ustx: u64,
    #[serde(default)]
    pub is_pox_active: bool,
}

/// Next reward cycle summary, with prepare phase timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCycleInfo {
    pub id: u64,
    #[serde(default)]
    pub min_threshold_ustx: u64,
    #[serde(default)]
    pub min_increment_ustx: u64,
    #[serde(default)]
    pub stacked_ustx: u64,
    pub prepare_phase_start_block_height: u64,
    pub blocks_until_prepare_phase: i64,
    pub reward_phase_start_block_height: u64,
    pub blocks_until_reward_phase: u64,
    #[serde(default)]
    pub ustx_until_pox_rejection: Option<u64>,
}

/// Snapshot of the node's PoX endpoint, the input of period resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoxSnapshot {
    /// The contract the chain currently reports as active.
    pub contract_id: String,
    #[serde(default)]
    pub contract_versions: Option<Vec<ContractVersion>>,
    #[serde(default)]
    pub current_burnchain_block_height: Option<u64>,
    #[serde(default)]
    pub first_burnchain_block_height: u64,
    #[serde(default)]
    pub min_amount_ustx: u64,
    #[serde(default)]
    pub reward_cycle_id: u64,
    #[serde(default)]
    pub reward_cycle_length: u64,
    #[serde(default)]
    pub prepare_phase_block_length: u64,
    #[serde(default)]
    pub rejection_votes_left_required: Option<u64>,
    pub current_cycle: CycleInfo,
    #[serde(default)]
    pub next_cycle: Option<NextCycleInfo>,
}

impl PoxSnapshot {
    /// Parse the JSON body of the PoX endpoint.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Length of a reward cycle in seconds.
    pub fn cycle_duration_secs(&self, network: Network) -> u64 {
        self.reward_cycle_length
            .saturating_mul(network.target_block_time())
    }

    /// Seconds until the next reward cycle starts, from the node's burn height.
    pub fn seconds_until_next_cycle(&self, core: &CoreInfo, network: Network) -> u64 {
        if self.reward_cycle_length == 0 {
            return 0;
        }
        let elapsed = core
            .burn_block_height
            .saturating_sub(self.first_burnchain_block_height);
        let blocks = self.reward_cycle_length - elapsed % self.reward_cycle_length;
        blocks.saturating_mul(network.target_block_time())
    }

    /// Seconds left to lock into the next cycle before its prepare phase.
    ///
    /// Negative once the prepare phase has begun.
    pub fn seconds_until_stacking_deadline(&self, network: Network) -> Option<i64> {
        let target = i64::try_from(network.target_block_time()).ok()?;
        self.next_cycle
            .as_ref()
            .map(|next| next.blocks_until_prepare_phase.saturating_mul(target))
    }

    /// Whether stacking has not been voted down for the next cycle.
    pub fn is_stacking_enabled_next_cycle(&self) -> bool {
        self.rejection_votes_left_required.unwrap_or(0) > 0
    }

    /// Whether `balance` meets the minimum stacking amount.
    pub fn has_minimum_stx(&self, balance: u128) -> bool {
        balance >= u128::from(self.min_amount_ustx)
    }
}

/// Core node info, used for the current burnchain height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreInfo {
    pub burn_block_height: u64,
    #[serde(default)]
    pub stable_pox_consensus: String,
}

impl CoreInfo {
    /// Parse the JSON body of the core info endpoint.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// A contract identifier, `address.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId {
    pub address: String,
    pub name: String,
}

impl ContractId {
    /// Parse a stacking contract id, requiring a Stacks address and a `pox*` name.
    pub fn stacking(contract_id: &str) -> Option<Self> {
        let id: ContractId = contract_id.parse().ok()?;
        (is_stacks_address(&id.address) && id.name.starts_with("pox")).then_some(id)
    }
}

impl FromStr for ContractId {
    type Err = ClassificationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((address, name))
                if !address.is_empty() && !name.is_empty() && !name.contains('.') =>
            {
                Ok(ContractId {
                    address: address.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ClassificationError::MalformedContractId(s.to_string())),
        }
    }
}

impl core::fmt::Display for ContractId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

/// A data var of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataVar {
    pub contract: ContractId,
    pub name: &'static str,
}

impl DataVar {
    /// The `configured` flag of `contract`.
    pub fn configured(contract: ContractId) -> Self {
        DataVar {
            contract,
            name: CONFIGURED_VAR,
        }
    }
}

/// Body of the data var endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVarResponse {
    /// Hex-serialized Clarity value.
    pub data: String,
}

impl DataVarResponse {
    /// Parse a data var body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Whether the var holds Clarity `true`.
    pub fn is_true(&self) -> bool {
        self.data == CLARITY_TRUE_HEX
    }
}

/// Syntactic check of a c32 Stacks address (`S` + version char + c32 payload).
///
/// The c32check checksum is not verified.
fn is_stacks_address(address: &str) -> bool {
    let mut chars = address.chars();
    chars.next() == Some('S')
        && matches!(chars.next(), Some('P' | 'M' | 'T' | 'N'))
        && (28..=41).contains(&address.len())
        && chars.all(|c| C32_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POX_BODY: &str = r#"{
        "contract_id": "SP000000000000000000002Q6VF78.pox-2",
        "pox_activation_threshold_ustx": 66818426279656,
        "first_burnchain_block_height": 666050,
        "current_burnchain_block_height": 781552,
        "prepare_phase_block_length": 100,
        "reward_phase_block_length": 2000,
        "reward_slots": 4000,
        "rejection_fraction": null,
        "total_liquid_supply_ustx": 1336368525593131,
        "current_cycle": {
            "id": 57,
            "min_threshold_ustx": 140000000000,
            "stacked_ustx": 0,
            "is_pox_active": false
        },
        "next_cycle": {
            "id": 58,
            "min_threshold_ustx": 120000000000,
            "min_increment_ustx": 167046032849,
            "stacked_ustx": 1262739809917,
            "prepare_phase_start_block_height": 783950,
            "blocks_until_prepare_phase": 2398,
            "reward_phase_start_block_height": 784050,
            "blocks_until_reward_phase": 2498,
            "ustx_until_pox_rejection": null
        },
        "min_amount_ustx": 120000000000,
        "prepare_cycle_length": 100,
        "reward_cycle_id": 57,
        "reward_cycle_length": 2100,
        "rejection_votes_left_required": null,
        "next_reward_cycle_in": 2498,
        "contract_versions": [
            {
                "contract_id": "SP000000000000000000002Q6VF78.pox",
                "activation_burnchain_block_height": 666050,
                "first_reward_cycle_id": 0
            },
            {
                "contract_id": "SP000000000000000000002Q6VF78.pox-2",
                "activation_burnchain_block_height": 781551,
                "first_reward_cycle_id": 56
            }
        ]
    }"#;

    #[test]
    fn test_parse_pox_body() {
        let snapshot = PoxSnapshot::from_json(POX_BODY).unwrap();

        assert_eq!(snapshot.contract_id, "SP000000000000000000002Q6VF78.pox-2");
        assert_eq!(snapshot.current_burnchain_block_height, Some(781552));
        assert_eq!(snapshot.current_cycle.id, 57);
        let versions = snapshot.contract_versions.as_ref().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].activation_height, 781551);
        assert_eq!(versions[1].first_reward_cycle_id, 56);
        assert!(!snapshot.is_stacking_enabled_next_cycle());
    }

    #[test]
    fn test_parse_minimal_body() {
        let snapshot = PoxSnapshot::from_json(
            r#"{"contract_id": "ST000000000000000000002AMW42H.pox", "current_cycle": {"id": 3}}"#,
        )
        .unwrap();
        assert!(snapshot.contract_versions.is_none());
        assert!(snapshot.current_burnchain_block_height.is_none());
        assert!(snapshot.next_cycle.is_none());
    }

    #[test]
    fn test_cycle_timing() {
        let snapshot = PoxSnapshot::from_json(POX_BODY).unwrap();

        let core = CoreInfo::from_json(r#"{"burn_block_height": 781552, "stacks_tip_height": 100}"#)
            .unwrap();

        assert_eq!(snapshot.cycle_duration_secs(Network::Mainnet), 2100 * 600);
        assert_eq!(snapshot.cycle_duration_secs(Network::Testnet), 2100 * 120);
        // (781552 - 666050) % 2100 = 2
        assert_eq!(
            snapshot.seconds_until_next_cycle(&core, Network::Mainnet),
            2098 * 600
        );
        assert_eq!(
            snapshot.seconds_until_stacking_deadline(Network::Mainnet),
            Some(2398 * 600)
        );
    }

    #[test]
    fn test_cycle_timing_saturates() {
        let mut snapshot = PoxSnapshot::from_json(POX_BODY).unwrap();
        snapshot.reward_cycle_length = u64::MAX;
        snapshot.first_burnchain_block_height = 0;
        let core = CoreInfo {
            burn_block_height: 1,
            stable_pox_consensus: String::new(),
        };

        assert_eq!(snapshot.cycle_duration_secs(Network::Mainnet), u64::MAX);
        assert_eq!(
            snapshot.seconds_until_next_cycle(&core, Network::Mainnet),
            u64::MAX
        );
    }

    #[test]
    fn test_minimum_stx() {
        let snapshot = PoxSnapshot::from_json(POX_BODY).unwrap();
        assert!(snapshot.has_minimum_stx(120_000_000_000));
        assert!(!snapshot.has_minimum_stx(119_999_999_999));
    }

    #[test]
    fn test_contract_id_parsing() {
        let id: ContractId = "SP000000000000000000002Q6VF78.pox-2".parse().unwrap();
        assert_eq!(id.address, "SP000000000000000000002Q6VF78");
        assert_eq!(id.name, "pox-2");
        assert_eq!(id.to_string(), "SP000000000000000000002Q6VF78.pox-2");

        assert!("no-dot".parse::<ContractId>().is_err());
        assert!("a.b.c".parse::<ContractId>().is_err());
        assert!(".pox".parse::<ContractId>().is_err());
    }

    #[test]
    fn test_stacking_contract_id() {
        assert!(ContractId::stacking("SP000000000000000000002Q6VF78.pox-3").is_some());
        assert!(ContractId::stacking("ST000000000000000000002AMW42H.pox").is_some());
        assert!(ContractId::stacking("SP000000000000000000002Q6VF78.bns").is_none());
        assert!(ContractId::stacking("bc1qxyz.pox").is_none());
        assert!(ContractId::stacking("SPILLEGAL0000000000000000000.pox").is_none());
    }

    #[test]
    fn test_configured_flag_body() {
        assert!(DataVarResponse::from_json(r#"{"data":"0x03"}"#).unwrap().is_true());
        assert!(!DataVarResponse::from_json(r#"{"data":"0x04"}"#).unwrap().is_true());
        assert!(DataVarResponse::from_json("not json").is_err());
    }
}
