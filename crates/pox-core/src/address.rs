//! Bitcoin address codec for PoX reward addresses.
//!
//! Converts between textual Bitcoin addresses and the `(version, hashbytes)`
//! pair the stacking contracts store. Supports:
//! - P2PKH (Pay to Public Key Hash) - Legacy addresses starting with 1 (mainnet) or m/n (testnet)
//! - P2SH (Pay to Script Hash) - Addresses starting with 3 (mainnet) or 2 (testnet)
//! - P2SH-P2WPKH / P2SH-P2WSH - Wrapped segwit, indistinguishable from P2SH on the wire
//! - P2WPKH (Pay to Witness Public Key Hash) - Native SegWit v0, bc1q.../tb1q...
//! - P2WSH (Pay to Witness Script Hash) - Native SegWit v0, bc1q... (32-byte program)
//! - P2TR (Pay to Taproot) - SegWit v1, bc1p.../tb1p...

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};

use crate::error::{AddressError, EncodingError, InvalidAddress};
use crate::network::{Network, SEGWIT_V0, SEGWIT_V1};

/// PoX address version, as stored in the `version` buffer of a pox-addr tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressVersion {
    /// Legacy P2PKH: OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
    P2PKH = 0x00,
    /// P2SH: OP_HASH160 <20-byte-hash> OP_EQUAL
    P2SH = 0x01,
    /// P2SH wrapping a P2WPKH program
    P2SHP2WPKH = 0x02,
    /// P2SH wrapping a P2WSH program
    P2SHP2WSH = 0x03,
    /// Native SegWit v0 P2WPKH: OP_0 <20-byte-hash>
    P2WPKH = 0x04,
    /// Native SegWit v0 P2WSH: OP_0 <32-byte-hash>
    P2WSH = 0x05,
    /// Taproot P2TR: OP_1 <32-byte-x-only-pubkey>
    P2TR = 0x06,
}

impl AddressVersion {
    /// Every version, in discriminant order.
    pub const ALL: [AddressVersion; 7] = [
        AddressVersion::P2PKH,
        AddressVersion::P2SH,
        AddressVersion::P2SHP2WPKH,
        AddressVersion::P2SHP2WSH,
        AddressVersion::P2WPKH,
        AddressVersion::P2WSH,
        AddressVersion::P2TR,
    ];

    /// Look up a version by its numeric discriminant.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// The one-byte wire form.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Exact hash length, in bytes, carried by this version.
    pub fn hash_len(self) -> usize {
        match self {
            AddressVersion::P2WSH | AddressVersion::P2TR => 32,
            _ => 20,
        }
    }

    /// Get the display name for this address version.
    pub fn name(&self) -> &'static str {
        match self {
            AddressVersion::P2PKH => "P2PKH",
            AddressVersion::P2SH => "P2SH",
            AddressVersion::P2SHP2WPKH => "P2SH-P2WPKH",
            AddressVersion::P2SHP2WSH => "P2SH-P2WSH",
            AddressVersion::P2WPKH => "P2WPKH",
            AddressVersion::P2WSH => "P2WSH",
            AddressVersion::P2TR => "P2TR",
        }
    }
}

impl core::fmt::Display for AddressVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded address: its version and hash bytes.
///
/// `hash_bytes.len()` always equals `version.hash_len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAddress {
    pub version: AddressVersion,
    pub hash_bytes: Vec<u8>,
}

impl DecodedAddress {
    /// The contract-side tuple for this address.
    pub fn to_tuple(&self) -> PoxAddressTuple {
        PoxAddressTuple {
            version: self.version.to_u8(),
            hashbytes: self.hash_bytes.clone(),
        }
    }
}

/// The `{ version, hashbytes }` tuple passed to the stacking contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoxAddressTuple {
    /// One-byte version buffer.
    pub version: u8,
    /// Hash buffer, 20 or 32 bytes.
    pub hashbytes: Vec<u8>,
}

impl PoxAddressTuple {
    /// Build a tuple from the raw buffers found in a contract value.
    pub fn from_buffers(version: &[u8], hashbytes: &[u8]) -> Result<Self, EncodingError> {
        match version {
            [v] => Ok(PoxAddressTuple {
                version: *v,
                hashbytes: hashbytes.to_vec(),
            }),
            _ => Err(EncodingError::VersionBufferLength(version.len())),
        }
    }

    /// The version as a one-byte buffer.
    pub fn version_buffer(&self) -> [u8; 1] {
        [self.version]
    }
}

/// Whether the text starts like a base58 (legacy) address.
pub fn is_legacy_address_prefix(address: &str) -> bool {
    matches!(address.as_bytes().first(), Some(b'1' | b'3' | b'2' | b'm' | b'n'))
}

/// Whether the text starts like a native segwit address on either network.
pub fn is_segwit_address_prefix(address: &str) -> bool {
    let prefix = address.get(..3).map(str::to_ascii_lowercase);
    matches!(prefix.as_deref(), Some("bc1" | "tb1"))
}

/// Decode a Bitcoin address into its PoX version and hash bytes.
///
/// When `expected_network` is given, an address of the other network is
/// rejected.
pub fn decode_address(
    address: &str,
    expected_network: Option<Network>,
) -> Result<DecodedAddress, InvalidAddress> {
    decode_with_network(address)
        .and_then(|(decoded, network)| match expected_network {
            Some(expected) if expected != network => Err(AddressError::NetworkMismatch {
                expected: expected.name().into(),
                got: network.name().into(),
            }),
            _ => Ok(decoded),
        })
        .map_err(|cause| InvalidAddress::new(address, cause))
}

/// Decode an address straight into the tuple passed to the stacking contract.
pub fn pox_address_to_tuple(address: &str) -> Result<PoxAddressTuple, InvalidAddress> {
    decode_address(address, None).map(|decoded| decoded.to_tuple())
}

/// Encode a version and hash as a Bitcoin address on `network`.
///
/// P2SH-P2WPKH and P2SH-P2WSH are written as plain P2SH addresses, so they
/// decode back as [`AddressVersion::P2SH`].
pub fn encode_address(
    version: AddressVersion,
    hash_bytes: &[u8],
    network: Network,
) -> Result<String, EncodingError> {
    if hash_bytes.len() != version.hash_len() {
        return Err(EncodingError::InvalidHashLength {
            version,
            expected: version.hash_len(),
            len: hash_bytes.len(),
        });
    }

    match version {
        AddressVersion::P2PKH => Ok(base58check_encode(network.p2pkh_version(), hash_bytes)),
        AddressVersion::P2SH | AddressVersion::P2SHP2WPKH | AddressVersion::P2SHP2WSH => {
            Ok(base58check_encode(network.p2sh_version(), hash_bytes))
        }
        AddressVersion::P2WPKH | AddressVersion::P2WSH => {
            segwit_encode(network, SEGWIT_V0, hash_bytes, Variant::Bech32)
        }
        AddressVersion::P2TR => segwit_encode(network, SEGWIT_V1, hash_bytes, Variant::Bech32m),
    }
}

/// Encode a contract-side tuple as a Bitcoin address on `network`.
pub fn pox_address_to_btc_address(
    tuple: &PoxAddressTuple,
    network: Network,
) -> Result<String, EncodingError> {
    let version =
        AddressVersion::from_u8(tuple.version).ok_or(EncodingError::UnknownVersion(tuple.version))?;
    encode_address(version, &tuple.hashbytes, network)
}

fn decode_with_network(address: &str) -> Result<(DecodedAddress, Network), AddressError> {
    if is_legacy_address_prefix(address) {
        log::trace!("decoding {} as base58check", address);
        decode_legacy(address)
    } else if is_segwit_address_prefix(address) {
        log::trace!("decoding {} as native segwit", address);
        decode_segwit(address)
    } else {
        Err(AddressError::UnknownPrefix)
    }
}

// ============================================================================
// Base58Check
// ============================================================================

fn decode_legacy(address: &str) -> Result<(DecodedAddress, Network), AddressError> {
    let payload = bs58::decode(address).with_check(None).into_vec()?;
    let (&raw_version, hash) = payload.split_first().ok_or(AddressError::EmptyPayload)?;

    let (version, network) = legacy_version(raw_version)?;
    check_hash_len(version, hash.len())?;

    Ok((
        DecodedAddress {
            version,
            hash_bytes: hash.to_vec(),
        },
        network,
    ))
}

/// Map a base58check version byte to its address version and network.
fn legacy_version(raw_version: u8) -> Result<(AddressVersion, Network), AddressError> {
    Network::ALL
        .into_iter()
        .find_map(|network| {
            if raw_version == network.p2pkh_version() {
                Some((AddressVersion::P2PKH, network))
            } else if raw_version == network.p2sh_version() {
                Some((AddressVersion::P2SH, network))
            } else {
                None
            }
        })
        .ok_or(AddressError::UnknownLegacyVersion(raw_version))
}

fn base58check_encode(raw_version: u8, hash_bytes: &[u8]) -> String {
    bs58::encode(hash_bytes)
        .with_check_version(raw_version)
        .into_string()
}

// ============================================================================
// Bech32 / Bech32m
// ============================================================================

fn decode_segwit(address: &str) -> Result<(DecodedAddress, Network), AddressError> {
    let (hrp, data, variant) = bech32::decode(address)?;

    let network = Network::from_bech32_hrp(&hrp).ok_or(AddressError::UnknownHrp(hrp))?;

    // First 5-bit word is the witness version
    let (witness_version, words) = data.split_first().ok_or(AddressError::EmptyPayload)?;
    let witness_version = witness_version.to_u8();

    let required = if witness_version == SEGWIT_V0 {
        Variant::Bech32
    } else {
        Variant::Bech32m
    };
    if variant != required {
        return Err(AddressError::ChecksumVariant {
            witness_version,
            variant,
        });
    }

    let program = Vec::<u8>::from_base32(words)?;

    let version = match (witness_version, program.len()) {
        (SEGWIT_V0, 20) => AddressVersion::P2WPKH,
        (SEGWIT_V0, 32) => AddressVersion::P2WSH,
        (SEGWIT_V1, 32) => AddressVersion::P2TR,
        (witness_version, len) => {
            return Err(AddressError::UnsupportedWitnessProgram {
                witness_version,
                len,
            })
        }
    };

    Ok((
        DecodedAddress {
            version,
            hash_bytes: program,
        },
        network,
    ))
}

fn segwit_encode(
    network: Network,
    witness_version: u8,
    program: &[u8],
    variant: Variant,
) -> Result<String, EncodingError> {
    let mut data = vec![bech32::u5::try_from_u8(witness_version)?];
    data.extend(program.to_base32());
    Ok(bech32::encode(network.bech32_hrp(), data, variant)?)
}

fn check_hash_len(version: AddressVersion, len: usize) -> Result<(), AddressError> {
    if len == version.hash_len() {
        Ok(())
    } else {
        Err(AddressError::InvalidHashLength {
            version,
            expected: version.hash_len(),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use proptest::prelude::*;

    fn segwit_string(witness_version: u8, program: &[u8], variant: Variant) -> String {
        let mut data = vec![bech32::u5::try_from_u8(witness_version).unwrap()];
        data.extend(program.to_base32());
        bech32::encode("bc", data, variant).unwrap()
    }

    #[test]
    fn test_p2pkh_mainnet() {
        let decoded = decode_address("154BHe8d7Dmm7pWLG8J9gceXiCfCRDtWAo", None).unwrap();

        assert_eq!(decoded.version, AddressVersion::P2PKH);
        assert_eq!(
            decoded.hash_bytes,
            hex!("2c7a568d346629f5308a5b75d825d28b09297153")
        );
    }

    #[test]
    fn test_p2sh_mainnet() {
        let address = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";
        let decoded = decode_address(address, Some(Network::Mainnet)).unwrap();

        assert_eq!(decoded.version, AddressVersion::P2SH);
        assert_eq!(decoded.hash_bytes.len(), 20);
        assert_eq!(
            encode_address(decoded.version, &decoded.hash_bytes, Network::Mainnet).unwrap(),
            address
        );
    }

    #[test]
    fn test_p2wpkh_mainnet() {
        let decoded = decode_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", None).unwrap();

        assert_eq!(decoded.version, AddressVersion::P2WPKH);
        assert_eq!(
            decoded.hash_bytes,
            hex!("751e76e8199196d454941c45d1b3a323f1433bd6")
        );
    }

    #[test]
    fn test_p2wsh_testnet() {
        let address = "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7";
        let decoded = decode_address(address, Some(Network::Testnet)).unwrap();

        assert_eq!(decoded.version, AddressVersion::P2WSH);
        assert_eq!(
            decoded.hash_bytes,
            hex!("1863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262")
        );
    }

    #[test]
    fn test_p2tr_mainnet() {
        let address = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";
        let decoded = decode_address(address, None).unwrap();

        assert_eq!(decoded.version, AddressVersion::P2TR);
        assert_eq!(decoded.hash_bytes.len(), 32);
        assert_eq!(
            encode_address(AddressVersion::P2TR, &decoded.hash_bytes, Network::Mainnet).unwrap(),
            address
        );
    }

    #[test]
    fn test_uppercase_segwit_address() {
        let decoded = decode_address("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4", None).unwrap();
        assert_eq!(decoded.version, AddressVersion::P2WPKH);
    }

    #[test]
    fn test_network_mismatch() {
        let result = decode_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Some(Network::Testnet));
        assert!(matches!(
            result,
            Err(InvalidAddress { cause: AddressError::NetworkMismatch { .. }, .. })
        ));

        let result = decode_address("154BHe8d7Dmm7pWLG8J9gceXiCfCRDtWAo", Some(Network::Testnet));
        assert!(matches!(
            result,
            Err(InvalidAddress { cause: AddressError::NetworkMismatch { .. }, .. })
        ));
    }

    #[test]
    fn test_invalid_checksum() {
        // Changed last char
        let address = "154BHe8d7Dmm7pWLG8J9gceXiCfCRDtWAp";
        let err = decode_address(address, None).unwrap_err();

        assert_eq!(err.address, address);
        assert!(matches!(err.cause, AddressError::Base58(_)));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = decode_address("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7", None).unwrap_err();
        assert!(matches!(err.cause, AddressError::UnknownPrefix));

        let err = decode_address("", None).unwrap_err();
        assert!(matches!(err.cause, AddressError::UnknownPrefix));
    }

    #[test]
    fn test_legacy_version_table() {
        assert_eq!(legacy_version(0x00).unwrap(), (AddressVersion::P2PKH, Network::Mainnet));
        assert_eq!(legacy_version(0x05).unwrap(), (AddressVersion::P2SH, Network::Mainnet));
        assert_eq!(legacy_version(0x6f).unwrap(), (AddressVersion::P2PKH, Network::Testnet));
        assert_eq!(legacy_version(0xc4).unwrap(), (AddressVersion::P2SH, Network::Testnet));
        assert!(matches!(
            legacy_version(0x80),
            Err(AddressError::UnknownLegacyVersion(0x80))
        ));
    }

    #[test]
    fn test_legacy_hash_length_enforced() {
        let address = bs58::encode(&[1u8; 21]).with_check_version(0x00).into_string();
        assert!(matches!(
            decode_address(&address, None).unwrap_err().cause,
            AddressError::InvalidHashLength { len: 21, .. }
        ));
    }

    #[test]
    fn test_witness_v0_requires_bech32() {
        let address = segwit_string(0, &[3u8; 20], Variant::Bech32m);
        let err = decode_address(&address, None).unwrap_err();
        assert!(matches!(
            err.cause,
            AddressError::ChecksumVariant { witness_version: 0, variant: Variant::Bech32m }
        ));
    }

    #[test]
    fn test_witness_v1_requires_bech32m() {
        let address = segwit_string(1, &[3u8; 32], Variant::Bech32);
        let err = decode_address(&address, None).unwrap_err();
        assert!(matches!(
            err.cause,
            AddressError::ChecksumVariant { witness_version: 1, variant: Variant::Bech32 }
        ));
    }

    #[test]
    fn test_witness_program_length() {
        let err = decode_address(&segwit_string(0, &[9u8; 21], Variant::Bech32), None).unwrap_err();
        assert!(matches!(
            err.cause,
            AddressError::UnsupportedWitnessProgram { witness_version: 0, len: 21 }
        ));

        for len in [20, 32] {
            assert!(decode_address(&segwit_string(0, &vec![9u8; len], Variant::Bech32), None).is_ok());
        }

        let err = decode_address(&segwit_string(1, &[9u8; 20], Variant::Bech32m), None).unwrap_err();
        assert!(matches!(
            err.cause,
            AddressError::UnsupportedWitnessProgram { witness_version: 1, len: 20 }
        ));
    }

    #[test]
    fn test_future_witness_version_rejected() {
        let err = decode_address(&segwit_string(2, &[9u8; 32], Variant::Bech32m), None).unwrap_err();
        assert!(matches!(
            err.cause,
            AddressError::UnsupportedWitnessProgram { witness_version: 2, .. }
        ));
    }

    #[test]
    fn test_wrapped_segwit_encodes_as_p2sh() {
        let hash = hex!("2c7a568d346629f5308a5b75d825d28b09297153");
        let p2sh = encode_address(AddressVersion::P2SH, &hash, Network::Testnet).unwrap();

        for version in [AddressVersion::P2SHP2WPKH, AddressVersion::P2SHP2WSH] {
            assert_eq!(encode_address(version, &hash, Network::Testnet).unwrap(), p2sh);
        }
        assert!(p2sh.starts_with('2'));
        assert_eq!(
            decode_address(&p2sh, None).unwrap().version,
            AddressVersion::P2SH
        );
    }

    #[test]
    fn test_encode_rejects_bad_hash_length() {
        let result = encode_address(AddressVersion::P2TR, &[0u8; 20], Network::Mainnet);
        assert!(matches!(
            result,
            Err(EncodingError::InvalidHashLength { expected: 32, len: 20, .. })
        ));
    }

    #[test]
    fn test_tuple_conversions() {
        let tuple = pox_address_to_tuple("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        assert_eq!(tuple.version_buffer(), [0x04]);
        assert_eq!(tuple.hashbytes, hex!("751e76e8199196d454941c45d1b3a323f1433bd6"));

        let rebuilt = PoxAddressTuple::from_buffers(&[0x04], &tuple.hashbytes).unwrap();
        assert_eq!(
            pox_address_to_btc_address(&rebuilt, Network::Mainnet).unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );

        assert!(matches!(
            PoxAddressTuple::from_buffers(&[0x04, 0x00], &tuple.hashbytes),
            Err(EncodingError::VersionBufferLength(2))
        ));
        let unknown = PoxAddressTuple { version: 7, hashbytes: vec![0; 20] };
        assert!(matches!(
            pox_address_to_btc_address(&unknown, Network::Mainnet),
            Err(EncodingError::UnknownVersion(7))
        ));
    }

    fn normalized(version: AddressVersion) -> AddressVersion {
        match version {
            AddressVersion::P2SHP2WPKH | AddressVersion::P2SHP2WSH => AddressVersion::P2SH,
            other => other,
        }
    }

    proptest! {
        #[test]
        fn prop_encode_then_decode(
            version in prop::sample::select(AddressVersion::ALL.to_vec()),
            network in prop::sample::select(Network::ALL.to_vec()),
            bytes in prop::collection::vec(any::<u8>(), 32),
        ) {
            let hash = &bytes[..version.hash_len()];
            let address = encode_address(version, hash, network).unwrap();
            let decoded = decode_address(&address, Some(network)).unwrap();

            prop_assert_eq!(decoded.version, normalized(version));
            prop_assert_eq!(decoded.hash_bytes.as_slice(), hash);
        }
    }
}
