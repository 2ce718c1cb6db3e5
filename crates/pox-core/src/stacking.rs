//! Contract-call shaping for stacking operations.
//!
//! Each operation resolves the target contract from the current [`Period`]
//! and the node's reported active contract, then describes the call as a
//! [`ContractCall`]. Serializing the arguments to Clarity, signing, and
//! broadcasting are left to the transaction builder.

use serde::Serialize;

use crate::address::{is_legacy_address_prefix, pox_address_to_tuple, PoxAddressTuple};
use crate::error::StackingError;
use crate::period::Period;
use crate::pox::{ContractId, PoxSnapshot};

/// A typed contract-call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClarityArg {
    Uint(u128),
    Principal(String),
    /// `{ version: (buff 1), hashbytes: (buff 32) }`
    PoxAddress(PoxAddressTuple),
    Optional(Option<Box<ClarityArg>>),
}

impl ClarityArg {
    fn some(arg: ClarityArg) -> Self {
        ClarityArg::Optional(Some(Box::new(arg)))
    }
}

/// A contract call, ready to hand to a transaction builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCall {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: &'static str,
    pub function_args: Vec<ClarityArg>,
}

impl ContractCall {
    /// `address.name` of the target contract.
    pub fn contract_id(&self) -> String {
        format!("{}.{}", self.contract_address, self.contract_name)
    }
}

/// Arguments of `stack-stx`.
#[derive(Debug, Clone)]
pub struct StackOptions {
    /// Amount to lock, in micro-STX.
    pub amount_micro_stx: u128,
    /// Bitcoin reward address.
    pub pox_address: String,
    /// Burnchain height the lock starts from.
    pub burn_block_height: u128,
    /// Number of reward cycles to lock for.
    pub cycles: u128,
}

/// Arguments of `stack-extend`.
#[derive(Debug, Clone)]
pub struct StackExtendOptions {
    /// Additional reward cycles.
    pub extend_cycles: u128,
    pub pox_address: String,
}

/// Arguments of `delegate-stx`.
#[derive(Debug, Clone)]
pub struct DelegateStxOptions {
    /// Maximum amount the delegate may lock, in micro-STX.
    pub amount_micro_stx: u128,
    /// Principal of the delegate.
    pub delegate_to: String,
    /// Burnchain height the delegation expires at, if any.
    pub until_burn_block_height: Option<u128>,
    /// Reward address the delegate must use, if pinned.
    pub pox_address: Option<String>,
}

/// Arguments of `delegate-stack-stx`.
#[derive(Debug, Clone)]
pub struct DelegateStackStxOptions {
    /// Principal whose delegated STX are locked.
    pub stacker: String,
    pub amount_micro_stx: u128,
    pub pox_address: String,
    pub burn_block_height: u128,
    pub cycles: u128,
}

/// Arguments of `delegate-stack-extend`.
#[derive(Debug, Clone)]
pub struct DelegateStackExtendOptions {
    pub stacker: String,
    pub pox_address: String,
    /// Additional reward cycles.
    pub extend_count: u128,
}

/// Arguments of `delegate-stack-increase`.
#[derive(Debug, Clone)]
pub struct DelegateStackIncreaseOptions {
    pub stacker: String,
    pub pox_address: String,
    /// Amount added to the lock, in micro-STX.
    pub increase_by: u128,
}

/// Arguments of `stack-aggregation-commit` and its indexed form.
#[derive(Debug, Clone)]
pub struct StackAggregationOptions {
    pub pox_address: String,
    /// Reward cycle the aggregated amount is committed to.
    pub reward_cycle: u128,
}

/// Arguments of `stack-aggregation-increase`.
#[derive(Debug, Clone)]
pub struct StackAggregationIncreaseOptions {
    pub pox_address: String,
    pub reward_cycle: u128,
    /// Index of the earlier commit in the reward set.
    pub reward_cycle_index: u128,
}

/// Builds stacking contract calls against one snapshot and its resolved period.
#[derive(Debug, Clone, Copy)]
pub struct StackingCalls<'a> {
    snapshot: &'a PoxSnapshot,
    period: &'a Period,
}

impl<'a> StackingCalls<'a> {
    pub fn new(snapshot: &'a PoxSnapshot, period: &'a Period) -> Self {
        StackingCalls { snapshot, period }
    }

    /// Contract for lock, delegation, and aggregation calls.
    pub fn stacking_contract(&self) -> &'a str {
        self.period.stacking_contract()
    }

    /// The contract the node reports as active.
    pub fn active_contract(&self) -> &'a str {
        &self.snapshot.contract_id
    }

    /// `stack-stx`
    pub fn stack_stx(&self, opts: &StackOptions) -> Result<ContractCall, StackingError> {
        let contract = self.stacking_contract();
        ensure_legacy_btc_address_for_pox1(contract, Some(opts.pox_address.as_str()))?;
        contract_call(
            contract,
            "stack-stx",
            vec![
                ClarityArg::Uint(opts.amount_micro_stx),
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.burn_block_height),
                ClarityArg::Uint(opts.cycles),
            ],
        )
    }

    /// `stack-extend`, PoX-2 onward.
    pub fn stack_extend(&self, opts: &StackExtendOptions) -> Result<ContractCall, StackingError> {
        self.period.ensure_pox2_activated()?;
        contract_call(
            self.active_contract(),
            "stack-extend",
            vec![
                ClarityArg::Uint(opts.extend_cycles),
                pox_address_arg(&opts.pox_address)?,
            ],
        )
    }

    /// `stack-increase`, PoX-2 onward.
    pub fn stack_increase(&self, increase_by: u128) -> Result<ContractCall, StackingError> {
        self.period.ensure_pox2_activated()?;
        contract_call(
            self.active_contract(),
            "stack-increase",
            vec![ClarityArg::Uint(increase_by)],
        )
    }

    /// `delegate-stx`
    pub fn delegate_stx(&self, opts: &DelegateStxOptions) -> Result<ContractCall, StackingError> {
        let contract = self.stacking_contract();
        ensure_legacy_btc_address_for_pox1(contract, opts.pox_address.as_deref())?;
        let pox_address = match &opts.pox_address {
            Some(address) => ClarityArg::some(pox_address_arg(address)?),
            None => ClarityArg::Optional(None),
        };
        contract_call(
            contract,
            "delegate-stx",
            vec![
                ClarityArg::Uint(opts.amount_micro_stx),
                ClarityArg::Principal(opts.delegate_to.clone()),
                ClarityArg::Optional(
                    opts.until_burn_block_height
                        .map(|height| Box::new(ClarityArg::Uint(height))),
                ),
                pox_address,
            ],
        )
    }

    /// `delegate-stack-stx`, called by the delegate.
    pub fn delegate_stack_stx(
        &self,
        opts: &DelegateStackStxOptions,
    ) -> Result<ContractCall, StackingError> {
        let contract = self.stacking_contract();
        ensure_legacy_btc_address_for_pox1(contract, Some(opts.pox_address.as_str()))?;
        contract_call(
            contract,
            "delegate-stack-stx",
            vec![
                ClarityArg::Principal(opts.stacker.clone()),
                ClarityArg::Uint(opts.amount_micro_stx),
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.burn_block_height),
                ClarityArg::Uint(opts.cycles),
            ],
        )
    }

    /// `delegate-stack-extend`, against the active contract.
    pub fn delegate_stack_extend(
        &self,
        opts: &DelegateStackExtendOptions,
    ) -> Result<ContractCall, StackingError> {
        contract_call(
            self.active_contract(),
            "delegate-stack-extend",
            vec![
                ClarityArg::Principal(opts.stacker.clone()),
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.extend_count),
            ],
        )
    }

    /// `delegate-stack-increase`, PoX-2 onward.
    pub fn delegate_stack_increase(
        &self,
        opts: &DelegateStackIncreaseOptions,
    ) -> Result<ContractCall, StackingError> {
        self.period.ensure_pox2_activated()?;
        contract_call(
            self.active_contract(),
            "delegate-stack-increase",
            vec![
                ClarityArg::Principal(opts.stacker.clone()),
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.increase_by),
            ],
        )
    }

    /// `stack-aggregation-commit`
    pub fn stack_aggregation_commit(
        &self,
        opts: &StackAggregationOptions,
    ) -> Result<ContractCall, StackingError> {
        self.aggregation_commit("stack-aggregation-commit", opts)
    }

    /// `stack-aggregation-commit-indexed`, which returns the reward set index.
    pub fn stack_aggregation_commit_indexed(
        &self,
        opts: &StackAggregationOptions,
    ) -> Result<ContractCall, StackingError> {
        self.aggregation_commit("stack-aggregation-commit-indexed", opts)
    }

    /// `stack-aggregation-increase`
    pub fn stack_aggregation_increase(
        &self,
        opts: &StackAggregationIncreaseOptions,
    ) -> Result<ContractCall, StackingError> {
        let contract = self.stacking_contract();
        ensure_legacy_btc_address_for_pox1(contract, Some(opts.pox_address.as_str()))?;
        contract_call(
            contract,
            "stack-aggregation-increase",
            vec![
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.reward_cycle),
                ClarityArg::Uint(opts.reward_cycle_index),
            ],
        )
    }

    /// `revoke-delegate-stx`, against the active contract.
    pub fn revoke_delegate_stx(&self) -> Result<ContractCall, StackingError> {
        contract_call(self.active_contract(), "revoke-delegate-stx", Vec::new())
    }

    /// Read-only `can-stack-stx` for `balance` over `cycles` from the current cycle.
    pub fn can_stack_stx(
        &self,
        pox_address: &str,
        balance: u128,
        cycles: u128,
    ) -> Result<ContractCall, StackingError> {
        contract_call(
            self.active_contract(),
            "can-stack-stx",
            vec![
                pox_address_arg(pox_address)?,
                ClarityArg::Uint(balance),
                ClarityArg::Uint(u128::from(self.snapshot.reward_cycle_id)),
                ClarityArg::Uint(cycles),
            ],
        )
    }

    fn aggregation_commit(
        &self,
        function_name: &'static str,
        opts: &StackAggregationOptions,
    ) -> Result<ContractCall, StackingError> {
        let contract = self.stacking_contract();
        ensure_legacy_btc_address_for_pox1(contract, Some(opts.pox_address.as_str()))?;
        contract_call(
            contract,
            function_name,
            vec![
                pox_address_arg(&opts.pox_address)?,
                ClarityArg::Uint(opts.reward_cycle),
            ],
        )
    }
}

/// Read-only `get-reward-set-pox-address` on an explicit contract.
pub fn get_reward_set_pox_address(
    contract_id: &str,
    reward_cycle_id: u128,
    reward_set_index: u128,
) -> Result<ContractCall, StackingError> {
    contract_call(
        contract_id,
        "get-reward-set-pox-address",
        vec![
            ClarityArg::Uint(reward_cycle_id),
            ClarityArg::Uint(reward_set_index),
        ],
    )
}

/// Reject native segwit reward addresses when targeting the PoX-1 contract.
pub fn ensure_legacy_btc_address_for_pox1(
    contract: &str,
    pox_address: Option<&str>,
) -> Result<(), StackingError> {
    match pox_address {
        Some(address) if contract.ends_with(".pox") && !is_legacy_address_prefix(address) => {
            Err(StackingError::LegacyAddressRequired)
        }
        _ => Ok(()),
    }
}

fn contract_call(
    contract_id: &str,
    function_name: &'static str,
    function_args: Vec<ClarityArg>,
) -> Result<ContractCall, StackingError> {
    let ContractId { address, name } = ContractId::stacking(contract_id)
        .ok_or_else(|| StackingError::MalformedContractId(contract_id.to_string()))?;
    Ok(ContractCall {
        contract_address: address,
        contract_name: name,
        function_name,
        function_args,
    })
}

fn pox_address_arg(address: &str) -> Result<ClarityArg, StackingError> {
    Ok(ClarityArg::PoxAddress(pox_address_to_tuple(address)?))
}

// ============================================================================
// Contract error codes
// ============================================================================

/// Error codes returned by the PoX contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum StackingErrorCode {
    InsufficientFunds = 1,
    InvalidLockPeriod = 2,
    AlreadyStacked = 3,
    NoSuchPrincipal = 4,
    Expired = 5,
    StxLocked = 6,
    PermissionDenied = 9,
    ThresholdNotMet = 11,
    PoxAddressInUse = 12,
    InvalidPoxAddress = 13,
    AlreadyRejected = 17,
    InvalidAmount = 18,
    NotAllowed = 19,
    AlreadyDelegated = 20,
    DelegationExpiresDuringLock = 21,
    DelegationTooMuchLocked = 22,
    DelegationPoxAddrRequired = 23,
    InvalidStartBurnHeight = 24,
    NotCurrentStacker = 25,
    StackExtendNotLocked = 26,
    StackIncreaseNotLocked = 27,
    DelegationNoRewardSlot = 28,
    DelegationWrongRewardSlot = 29,
    IsDelegated = 30,
    NotDelegated = 31,
    CorruptedState = 254,
    Unreachable = 255,
}

impl StackingErrorCode {
    const ALL: [StackingErrorCode; 27] = [
        StackingErrorCode::InsufficientFunds,
        StackingErrorCode::InvalidLockPeriod,
        StackingErrorCode::AlreadyStacked,
        StackingErrorCode::NoSuchPrincipal,
        StackingErrorCode::Expired,
        StackingErrorCode::StxLocked,
        StackingErrorCode::PermissionDenied,
        StackingErrorCode::ThresholdNotMet,
        StackingErrorCode::PoxAddressInUse,
        StackingErrorCode::InvalidPoxAddress,
        StackingErrorCode::AlreadyRejected,
        StackingErrorCode::InvalidAmount,
        StackingErrorCode::NotAllowed,
        StackingErrorCode::AlreadyDelegated,
        StackingErrorCode::DelegationExpiresDuringLock,
        StackingErrorCode::DelegationTooMuchLocked,
        StackingErrorCode::DelegationPoxAddrRequired,
        StackingErrorCode::InvalidStartBurnHeight,
        StackingErrorCode::NotCurrentStacker,
        StackingErrorCode::StackExtendNotLocked,
        StackingErrorCode::StackIncreaseNotLocked,
        StackingErrorCode::DelegationNoRewardSlot,
        StackingErrorCode::DelegationWrongRewardSlot,
        StackingErrorCode::IsDelegated,
        StackingErrorCode::NotDelegated,
        StackingErrorCode::CorruptedState,
        StackingErrorCode::Unreachable,
    ];

    /// Look up a contract error code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Constant name used by the contract.
    pub fn name(self) -> &'static str {
        use StackingErrorCode::*;
        match self {
            InsufficientFunds => "ERR_STACKING_INSUFFICIENT_FUNDS",
            InvalidLockPeriod => "ERR_STACKING_INVALID_LOCK_PERIOD",
            AlreadyStacked => "ERR_STACKING_ALREADY_STACKED",
            NoSuchPrincipal => "ERR_STACKING_NO_SUCH_PRINCIPAL",
            Expired => "ERR_STACKING_EXPIRED",
            StxLocked => "ERR_STACKING_STX_LOCKED",
            PermissionDenied => "ERR_STACKING_PERMISSION_DENIED",
            ThresholdNotMet => "ERR_STACKING_THRESHOLD_NOT_MET",
            PoxAddressInUse => "ERR_STACKING_POX_ADDRESS_IN_USE",
            InvalidPoxAddress => "ERR_STACKING_INVALID_POX_ADDRESS",
            AlreadyRejected => "ERR_STACKING_ALREADY_REJECTED",
            InvalidAmount => "ERR_STACKING_INVALID_AMOUNT",
            NotAllowed => "ERR_NOT_ALLOWED",
            AlreadyDelegated => "ERR_STACKING_ALREADY_DELEGATED",
            DelegationExpiresDuringLock => "ERR_DELEGATION_EXPIRES_DURING_LOCK",
            DelegationTooMuchLocked => "ERR_DELEGATION_TOO_MUCH_LOCKED",
            DelegationPoxAddrRequired => "ERR_DELEGATION_POX_ADDR_REQUIRED",
            InvalidStartBurnHeight => "ERR_INVALID_START_BURN_HEIGHT",
            NotCurrentStacker => "ERR_NOT_CURRENT_STACKER",
            StackExtendNotLocked => "ERR_STACK_EXTEND_NOT_LOCKED",
            StackIncreaseNotLocked => "ERR_STACK_INCREASE_NOT_LOCKED",
            DelegationNoRewardSlot => "ERR_DELEGATION_NO_REWARD_SLOT",
            DelegationWrongRewardSlot => "ERR_DELEGATION_WRONG_REWARD_SLOT",
            IsDelegated => "ERR_STACKING_IS_DELEGATED",
            NotDelegated => "ERR_STACKING_NOT_DELEGATED",
            CorruptedState => "ERR_STACKING_CORRUPTED_STATE",
            Unreachable => "ERR_STACKING_UNREACHABLE",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        use StackingErrorCode::*;
        match self {
            InsufficientFunds => "Insufficient funds",
            InvalidLockPeriod => "Invalid lock period",
            AlreadyStacked => "Account already stacked. Concurrent stacking not allowed.",
            NoSuchPrincipal => "Principal does not exist",
            Expired => "Stacking expired",
            StxLocked => "STX balance is locked",
            PermissionDenied => "Permission denied",
            ThresholdNotMet => "Stacking threshold not met",
            PoxAddressInUse => "PoX address already in use",
            InvalidPoxAddress => "Invalid PoX address",
            AlreadyRejected => "Stacking already rejected",
            InvalidAmount => "Invalid amount",
            NotAllowed => "Stacking not allowed",
            AlreadyDelegated => "Already delegated",
            DelegationExpiresDuringLock => "Delegation expires during lock period",
            DelegationTooMuchLocked => "Delegation too much locked",
            DelegationPoxAddrRequired => "PoX address required for delegation",
            InvalidStartBurnHeight => "Invalid start burn height",
            NotCurrentStacker => "ERR_NOT_CURRENT_STACKER",
            StackExtendNotLocked | StackIncreaseNotLocked => "Stacker must be currently locked",
            DelegationNoRewardSlot => "Invalid reward-cycle and reward-cycle-index",
            DelegationWrongRewardSlot => "PoX address must match the one on record",
            IsDelegated => "Stacker must be directly stacking and not delegating",
            NotDelegated => "Stacker must be delegating and not be directly stacking",
            CorruptedState => "Stacking state is corrupted",
            Unreachable => "Stacking unreachable",
        }
    }
}

impl core::fmt::Display for StackingErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of a `can-stack-stx` read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackingEligibility {
    pub eligible: bool,
    /// Set when the contract rejected with a known code.
    pub reason: Option<StackingErrorCode>,
}

impl StackingEligibility {
    /// Interpret the `(response bool uint)` of `can-stack-stx`.
    pub fn from_response(response: Result<(), u32>) -> Self {
        match response {
            Ok(()) => StackingEligibility {
                eligible: true,
                reason: None,
            },
            Err(code) => StackingEligibility {
                eligible: false,
                reason: StackingErrorCode::from_code(code),
            },
        }
    }
}
