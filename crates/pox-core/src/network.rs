//! Network definitions: address prefix tables and Stacks API endpoints.

use core::str::FromStr;

use crate::error::EncodingError;
use crate::pox::DataVar;

/// Witness version of native segwit v0 programs (P2WPKH, P2WSH).
pub const SEGWIT_V0: u8 = 0;

/// Witness version of taproot programs (P2TR).
pub const SEGWIT_V1: u8 = 1;

/// Network the addresses and contracts belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Stacks mainnet, anchored to Bitcoin mainnet
    #[default]
    Mainnet,
    /// Stacks testnet, anchored to Bitcoin testnet
    Testnet,
}

impl Network {
    /// All supported networks.
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Testnet];

    /// Get the Bech32 human-readable part for this network.
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
        }
    }

    /// Get the version byte for P2PKH addresses.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Get the version byte for P2SH addresses.
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet => 0xc4,
        }
    }

    /// Look up the network owning a Bech32 human-readable part.
    pub fn from_bech32_hrp(hrp: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.bech32_hrp() == hrp)
    }

    /// Target burnchain block time in seconds.
    pub fn target_block_time(&self) -> u64 {
        match self {
            Network::Mainnet => 600,
            Network::Testnet => 120,
        }
    }

    /// Get the Stacks API base URL for this network.
    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet.hiro.so",
            Network::Testnet => "https://api.testnet.hiro.so",
        }
    }

    /// URL of the PoX info endpoint.
    pub fn pox_info_url(&self) -> String {
        format!("{}/v2/pox", self.api_url())
    }

    /// URL of the core node info endpoint.
    pub fn core_info_url(&self) -> String {
        format!("{}/v2/info", self.api_url())
    }

    /// URL reading a contract data var, without a MARF proof.
    pub fn data_var_url(&self, var: &DataVar) -> String {
        format!(
            "{}/v2/data_var/{}/{}/{}?proof=0",
            self.api_url(),
            var.contract.address,
            var.contract.name,
            var.name
        )
    }

    /// Get network name as string.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl FromStr for Network {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            _ => Err(EncodingError::UnknownNetwork(s.to_string())),
        }
    }
}

impl core::fmt::Display for Network {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pox::ContractId;

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!(matches!(
            "regtest".parse::<Network>(),
            Err(EncodingError::UnknownNetwork(name)) if name == "regtest"
        ));
    }

    #[test]
    fn test_hrp_lookup() {
        assert_eq!(Network::from_bech32_hrp("bc"), Some(Network::Mainnet));
        assert_eq!(Network::from_bech32_hrp("tb"), Some(Network::Testnet));
        assert_eq!(Network::from_bech32_hrp("bcrt"), None);
    }

    #[test]
    fn test_data_var_url() {
        let var = DataVar::configured(ContractId {
            address: "SP000000000000000000002Q6VF78".into(),
            name: "pox-2".into(),
        });
        assert_eq!(
            Network::Mainnet.data_var_url(&var),
            "https://api.mainnet.hiro.so/v2/data_var/SP000000000000000000002Q6VF78/pox-2/configured?proof=0"
        );
        assert_eq!(Network::Testnet.pox_info_url(), "https://api.testnet.hiro.so/v2/pox");
        assert_eq!(Network::Mainnet.core_info_url(), "https://api.mainnet.hiro.so/v2/info");
    }
}
