//! Adapter traits for the script engine.
//!
//! The engine never talks to concrete pallets: every external effect goes
//! through one of these traits, keeping the pallet generic over the runtime's
//! asset machinery, AMM, money market, yield vaults and gas escrow. Runtimes
//! wire real implementations; `()` impls are provided for configurations
//! where a capability is absent (scripts needing it then fail at execution).

use frame::prelude::*;
use primitives::{AssetKind, Balance, ExecutorId, ScriptId};

/// Borrow rate mode of a money-market debt position.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum RateMode {
  Fixed,
  Variable,
}

/// Snapshot of a user's money-market account.
///
/// `health_factor` is PRECISION-scaled (1.0 == 10^12); positions with no debt
/// report `Balance::MAX`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MarketAccountData {
  pub collateral: Balance,
  pub debt: Balance,
  pub available_borrow: Balance,
  pub health_factor: Balance,
}

/// Token custody operations performed on behalf of script owners.
///
/// `transfer_from` spends `owner`'s prior approval towards `spender`; the
/// engine checks `allowance` during verification so execution-time failures
/// only arise from races. Native funds are runtime-internal and report an
/// unlimited allowance.
pub trait AssetOps<AccountId> {
  fn balance(who: &AccountId, asset: AssetKind) -> Balance;

  fn allowance(owner: &AccountId, spender: &AccountId, asset: AssetKind) -> Balance;

  fn transfer_from(
    spender: &AccountId,
    owner: &AccountId,
    to: &AccountId,
    asset: AssetKind,
    amount: Balance,
  ) -> Result<(), DispatchError>;
}

/// AMM operations: quotes, swaps and liquidity management.
pub trait DexOps<AccountId> {
  /// Spot quote: output amount for `amount_in` of `asset_in`. `None` when no
  /// pool exists for the pair.
  fn get_quote(asset_in: AssetKind, asset_out: AssetKind, amount_in: Balance) -> Option<Balance>;

  /// LP token of the pair's pool, `None` when no pool exists
  fn get_pool_id(asset_a: AssetKind, asset_b: AssetKind) -> Option<AssetKind>;

  /// Reserves of the pair's pool, in `(asset_a, asset_b)` order
  fn get_pool_reserves(asset_a: AssetKind, asset_b: AssetKind) -> Option<(Balance, Balance)>;

  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetKind,
    asset_out: AssetKind,
    amount_in: Balance,
    min_out: Balance,
  ) -> Result<Balance, DispatchError>;

  fn add_liquidity(
    who: &AccountId,
    asset_a: AssetKind,
    asset_b: AssetKind,
    amount_a: Balance,
    amount_b: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError>;

  fn remove_liquidity(
    who: &AccountId,
    asset_a: AssetKind,
    asset_b: AssetKind,
    lp_amount: Balance,
  ) -> Result<(Balance, Balance), DispatchError>;
}

/// Money-market operations (Aave-style pool).
///
/// `borrow` is delegated: proceeds land on `who`'s account but the call is
/// made by the engine, which must hold a credit delegation measured by
/// `borrow_allowance`.
pub trait MoneyMarketOps<AccountId> {
  fn account_data(who: &AccountId) -> MarketAccountData;

  fn debt(who: &AccountId, debt_token: AssetKind, rate_mode: RateMode) -> Balance;

  fn deposit(who: &AccountId, token: AssetKind, amount: Balance) -> Result<(), DispatchError>;

  fn withdraw(who: &AccountId, token: AssetKind, amount: Balance) -> Result<(), DispatchError>;

  fn borrow(
    who: &AccountId,
    token: AssetKind,
    amount: Balance,
    rate_mode: RateMode,
  ) -> Result<(), DispatchError>;

  fn repay(
    who: &AccountId,
    token: AssetKind,
    amount: Balance,
    rate_mode: RateMode,
  ) -> Result<(), DispatchError>;

  fn borrow_allowance(
    who: &AccountId,
    delegate: &AccountId,
    debt_token: AssetKind,
    rate_mode: RateMode,
  ) -> Balance;
}

/// Yield-vault operations: LP tokens in, share tokens out.
pub trait VaultOps<AccountId> {
  fn deposit(
    who: &AccountId,
    lp_token: AssetKind,
    share_token: AssetKind,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  fn withdraw(
    who: &AccountId,
    lp_token: AssetKind,
    share_token: AssetKind,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  fn share_balance(who: &AccountId, share_token: AssetKind) -> Balance;
}

/// Gas/tip escrow consumed by the engine.
///
/// `add_reward` debits `payer`'s escrow and accrues the claimable reward for
/// `recipient`; implementors gate it on an executor allow-list.
pub trait RewardSink<AccountId> {
  fn gas_balance(who: &AccountId) -> Balance;

  fn tip_balance(who: &AccountId) -> Balance;

  fn add_reward(
    executor: ExecutorId,
    script_id: ScriptId,
    reward: Balance,
    tip: Balance,
    payer: &AccountId,
    recipient: &AccountId,
  ) -> Result<(), DispatchError>;
}

/// Narrow read interface over per-script execution counters.
///
/// Follow conditions observe other scripts only through this; nothing else
/// about foreign script state leaks across executor families.
pub trait ExecutionCounter<AccountId> {
  fn execution_count(executor: ExecutorId, user: &AccountId, script_id: ScriptId) -> u32;
}

impl<AccountId> AssetOps<AccountId> for () {
  fn balance(_: &AccountId, _: AssetKind) -> Balance {
    0
  }

  fn allowance(_: &AccountId, _: &AccountId, _: AssetKind) -> Balance {
    0
  }

  fn transfer_from(
    _: &AccountId,
    _: &AccountId,
    _: &AccountId,
    _: AssetKind,
    _: Balance,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("AssetOps not configured"))
  }
}

impl<AccountId> DexOps<AccountId> for () {
  fn get_quote(_: AssetKind, _: AssetKind, _: Balance) -> Option<Balance> {
    None
  }

  fn get_pool_id(_: AssetKind, _: AssetKind) -> Option<AssetKind> {
    None
  }

  fn get_pool_reserves(_: AssetKind, _: AssetKind) -> Option<(Balance, Balance)> {
    None
  }

  fn swap_exact_in(
    _: &AccountId,
    _: AssetKind,
    _: AssetKind,
    _: Balance,
    _: Balance,
  ) -> Result<Balance, DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn add_liquidity(
    _: &AccountId,
    _: AssetKind,
    _: AssetKind,
    _: Balance,
    _: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn remove_liquidity(
    _: &AccountId,
    _: AssetKind,
    _: AssetKind,
    _: Balance,
  ) -> Result<(Balance, Balance), DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }
}

impl<AccountId> MoneyMarketOps<AccountId> for () {
  fn account_data(_: &AccountId) -> MarketAccountData {
    MarketAccountData::default()
  }

  fn debt(_: &AccountId, _: AssetKind, _: RateMode) -> Balance {
    0
  }

  fn deposit(_: &AccountId, _: AssetKind, _: Balance) -> Result<(), DispatchError> {
    Err(DispatchError::Other("MoneyMarketOps not configured"))
  }

  fn withdraw(_: &AccountId, _: AssetKind, _: Balance) -> Result<(), DispatchError> {
    Err(DispatchError::Other("MoneyMarketOps not configured"))
  }

  fn borrow(_: &AccountId, _: AssetKind, _: Balance, _: RateMode) -> Result<(), DispatchError> {
    Err(DispatchError::Other("MoneyMarketOps not configured"))
  }

  fn repay(_: &AccountId, _: AssetKind, _: Balance, _: RateMode) -> Result<(), DispatchError> {
    Err(DispatchError::Other("MoneyMarketOps not configured"))
  }

  fn borrow_allowance(_: &AccountId, _: &AccountId, _: AssetKind, _: RateMode) -> Balance {
    0
  }
}

impl<AccountId> VaultOps<AccountId> for () {
  fn deposit(
    _: &AccountId,
    _: AssetKind,
    _: AssetKind,
    _: Balance,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("VaultOps not configured"))
  }

  fn withdraw(
    _: &AccountId,
    _: AssetKind,
    _: AssetKind,
    _: Balance,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("VaultOps not configured"))
  }

  fn share_balance(_: &AccountId, _: AssetKind) -> Balance {
    0
  }
}

impl<AccountId> RewardSink<AccountId> for () {
  fn gas_balance(_: &AccountId) -> Balance {
    0
  }

  fn tip_balance(_: &AccountId) -> Balance {
    0
  }

  fn add_reward(
    _: ExecutorId,
    _: ScriptId,
    _: Balance,
    _: Balance,
    _: &AccountId,
    _: &AccountId,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("RewardSink not configured"))
  }
}

impl<AccountId> ExecutionCounter<AccountId> for () {
  fn execution_count(_: ExecutorId, _: &AccountId, _: ScriptId) -> u32 {
    0
  }
}
