//! Core logic for Proof-of-Transfer stacking clients.
//!
//! This crate provides pure Rust implementations of:
//! - Bitcoin reward address encoding and decoding (P2PKH, P2SH, P2WPKH, P2WSH, P2TR)
//! - PoX operation period resolution across contract upgrades
//! - Stacking contract-call shaping and contract error codes
//!
//! Nothing here performs I/O. The single chain read needed during period
//! resolution is injected by the caller.

pub mod address;
pub mod error;
pub mod network;
pub mod period;
pub mod pox;
pub mod stacking;

pub use address::{
    decode_address, encode_address, pox_address_to_btc_address, pox_address_to_tuple,
    AddressVersion, DecodedAddress, PoxAddressTuple,
};
pub use error::{
    AddressError, ClassificationError, EncodingError, Error, InvalidAddress, Result, StackingError,
};
pub use network::Network;
pub use period::{resolve_period, LegacyContract, Period, Period1Contracts};
pub use pox::{ContractId, ContractVersion, CoreInfo, DataVar, DataVarResponse, PoxSnapshot};
pub use stacking::{ContractCall, StackingCalls, StackingEligibility, StackingErrorCode};
