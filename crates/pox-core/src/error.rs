//! Error types used across the crate.

use thiserror::Error;

use crate::address::AddressVersion;

/// Standard Result used in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Low-level reason an address failed to decode.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The text does not start with a known legacy or segwit prefix
    #[error("unknown BTC address prefix")]
    UnknownPrefix,
    /// Base58Check decoding failed
    #[error("base58check: {0}")]
    Base58(#[from] bs58::decode::Error),
    /// Bech32/Bech32m decoding failed
    #[error("bech32: {0}")]
    Bech32(#[from] bech32::Error),
    /// Nothing follows the checksum-verified prefix
    #[error("address payload is empty")]
    EmptyPayload,
    /// The legacy version byte is neither P2PKH nor P2SH on any network
    #[error("invalid pox address version: {0:#04x}")]
    UnknownLegacyVersion(u8),
    /// The human-readable part belongs to no supported network
    #[error("unknown segwit human-readable part: {0}")]
    UnknownHrp(String),
    /// Witness version 0 with bech32m, or version 1 with bech32
    #[error("witness version {witness_version} must not be encoded with {variant:?}")]
    ChecksumVariant {
        witness_version: u8,
        variant: bech32::Variant,
    },
    /// Witness version and program length pair is not P2WPKH, P2WSH, or P2TR
    #[error("unsupported witness program: version {witness_version}, {len} bytes")]
    UnsupportedWitnessProgram { witness_version: u8, len: usize },
    /// Hash length does not match the address version
    #[error("{version} hash must be {expected} bytes, got {len}")]
    InvalidHashLength {
        version: AddressVersion,
        expected: usize,
        len: usize,
    },
    /// Address belongs to another network than the one expected
    #[error("address network mismatch: expected {expected}, got {got}")]
    NetworkMismatch { expected: String, got: String },
}

/// An address that could not be decoded, with its original text.
#[derive(Debug, Error)]
#[error("'{address}' is not a valid P2PKH/P2SH/P2WPKH/P2WSH/P2TR address")]
pub struct InvalidAddress {
    /// The offending input text.
    pub address: String,
    /// The reason it was rejected.
    #[source]
    pub cause: AddressError,
}

impl InvalidAddress {
    pub(crate) fn new(address: &str, cause: AddressError) -> Self {
        InvalidAddress {
            address: address.to_string(),
            cause,
        }
    }
}

/// Encoding errors.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Network name is not one of the supported networks
    #[error("invalid network: {0}")]
    UnknownNetwork(String),
    /// Numeric version does not name an address version
    #[error("unexpected address version: {0}")]
    UnknownVersion(u8),
    /// A version tuple whose buffer is not exactly one byte
    #[error("pox address version buffer must be 1 byte, got {0}")]
    VersionBufferLength(usize),
    /// Hash length does not match the address version
    #[error("{version} hash must be {expected} bytes, got {len}")]
    InvalidHashLength {
        version: AddressVersion,
        expected: usize,
        len: usize,
    },
    /// Bech32 encoder rejected its input
    #[error("bech32: {0}")]
    Bech32(#[from] bech32::Error),
}

/// Failures while classifying the PoX operation period.
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// The active contract is none of the known contract versions
    #[error("could not determine PoX operation period: active contract {contract_id} is not a known version")]
    UnknownActiveContract { contract_id: String },
    /// A contract id is not of the form `address.name`
    #[error("contract id is malformed: {0}")]
    MalformedContractId(String),
    /// The configured-flag collaborator failed
    #[error("failed to fetch configured flag of {contract_id}: {message}")]
    FlagFetch { contract_id: String, message: String },
}

/// Failures while shaping a stacking contract call.
#[derive(Debug, Error)]
pub enum StackingError {
    /// Operation needs PoX-2 but the chain is still in Period1
    #[error("PoX-2 has not activated yet (currently in period {period} of PoX-2 operation)")]
    Pox2NotActivated { period: &'static str },
    /// PoX-1 contracts only accept base58 addresses
    #[error("PoX-1 requires P2PKH/P2SH/P2SH-P2WPKH/P2SH-P2WSH bitcoin addresses")]
    LegacyAddressRequired,
    /// The stacking contract id failed validation
    #[error("stacking contract ID is malformed: {0}")]
    MalformedContractId(String),
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
}

/// Standard error type used in the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Stacking(#[from] StackingError),
    /// Metadata body could not be parsed
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
