//! Ecosystem constants for the script automation protocol.
//!
//! This module centralizes pallet IDs and the economic parameters shared by
//! the gas tank, the treasury and the execution engine. These constants are
//! the single source of truth and are re-used by every runtime configuration
//! via the primitives crate.

/// Balance type alias for consistency across the ecosystem
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// to deterministically generate accounts for pallet-held funds.
pub mod pallet_ids {
  /// Script engine pallet ID (condition verification and execution)
  pub const SCRIPT_ENGINE_PALLET_ID: &[u8; 8] = b"scrpteng";

  /// Gas tank pallet ID (gas/tip escrow and relayer reward ledger)
  pub const GAS_TANK_PALLET_ID: &[u8; 8] = b"gastank0";

  /// Treasury pallet ID (fee pools, staking rewards, protocol-owned liquidity)
  pub const TREASURY_PALLET_ID: &[u8; 8] = b"treasry0";

  /// Vesting pallet ID (linear token vesting schedules)
  pub const VESTING_PALLET_ID: &[u8; 8] = b"vesting0";
}

/// Protocol parameters: economic defaults and their admissible ranges.
///
/// Percentages are `Permill`; time spans are unix seconds. The setter
/// extrinsics of the owning pallets enforce the bounds declared here.
pub mod params {
  use super::Balance;
  use sp_arithmetic::Permill;

  /// Precision scalar for all fixed-point calculations (10^12).
  ///
  /// Prices, quotes and the staking reward-per-token accumulator use this
  /// precision to keep integer math exact at small magnitudes.
  pub const PRECISION: Balance = 1_000_000_000_000;

  /// Share of an escrowed tip that is claimable by the relayer (80%).
  ///
  /// The remaining 20% stays with the treasury as the protocol's tip fee.
  pub const RELAYER_TIP_SHARE: Permill = Permill::from_percent(80);

  /// Default share of treasury inflow reserved as operational commission (1%).
  pub const DEFAULT_COMMISSION: Permill = Permill::from_percent(1);

  /// Upper bound for the commission share (5%).
  pub const MAX_COMMISSION: Permill = Permill::from_percent(5);

  /// Default share of treasury inflow routed to protocol-owned liquidity (49%).
  pub const DEFAULT_POL_SHARE: Permill = Permill::from_parts(490_000);

  /// Lower bound for the POL share (5%).
  pub const MIN_POL_SHARE: Permill = Permill::from_percent(5);

  /// Upper bound for the POL share (50%).
  pub const MAX_POL_SHARE: Permill = Permill::from_percent(50);

  /// Default token-in-LP ratio above which buybacks replace LP funding (10%).
  pub const DEFAULT_BUYBACK_THRESHOLD: Permill = Permill::from_percent(10);

  /// Lower bound for the buyback threshold (2.5%).
  pub const MIN_BUYBACK_THRESHOLD: Permill = Permill::from_parts(25_000);

  /// Upper bound for the buyback threshold (60%).
  pub const MAX_BUYBACK_THRESHOLD: Permill = Permill::from_percent(60);

  /// Default staking redistribution interval (180 days).
  pub const DEFAULT_REDISTRIBUTION_INTERVAL: u64 = 180 * 24 * 60 * 60;

  /// Lower bound for the redistribution interval (30 days).
  pub const MIN_REDISTRIBUTION_INTERVAL: u64 = 30 * 24 * 60 * 60;

  /// Upper bound for the redistribution interval (730 days).
  pub const MAX_REDISTRIBUTION_INTERVAL: u64 = 730 * 24 * 60 * 60;

  /// Default per-unit gas price used to cost executions (1 GWEI equivalent).
  pub const DEFAULT_GAS_PRICE: Balance = 1_000_000_000;
}
