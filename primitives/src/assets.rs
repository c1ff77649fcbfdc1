use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

/// This enum is the single source of truth for asset identity across all pallets.
/// The engine, the gas tank and the treasury all move funds in terms of it.
///
/// - `Native`: the chain's native currency (managed by pallet-balances). Gas
///   deposits and treasury pools are denominated in it.
/// - `Local(u32)`: local assets managed by pallet-assets, including the
///   protocol token, LP tokens and money-market receipt tokens.
/// - `Foreign(u32)`: bridged assets mapped into pallet-assets (0xF... namespace).
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum AssetKind {
  /// Native currency managed by pallet-balances
  #[default]
  Native,
  /// Local asset managed by pallet-assets
  Local(u32),
  /// Foreign asset managed by pallet-assets via bridge mapping (0xF... namespace)
  Foreign(u32),
}

impl From<u32> for AssetKind {
  fn from(asset_id: u32) -> Self {
    AssetKind::Local(asset_id)
  }
}

// Bitmask Architecture for Asset Classification
//
// 32-bit ID Structure:
// [ 4 bits: Type ] [ 28 bits: Index/ID ]
//
// Types:
// 0x1... -> Standard Tokens
// 0x2... -> Stablecoins
// 0x3... -> Money-market receipt tokens (claims on supplied collateral)
// 0x4... -> LP Tokens
// 0x5... -> Vault share tokens (claims on deposited LP)
// 0xF... -> Foreign/bridged Assets

pub const MASK_TYPE: u32 = 0xF000_0000;
pub const MASK_INDEX: u32 = 0x0FFF_FFFF;

pub const TYPE_STD: u32 = 0x1000_0000;
pub const TYPE_STABLE: u32 = 0x2000_0000;
pub const TYPE_RECEIPT: u32 = 0x3000_0000;
pub const TYPE_LP: u32 = 0x4000_0000;
pub const TYPE_SHARE: u32 = 0x5000_0000;
pub const TYPE_FOREIGN: u32 = 0xF000_0000;

/// Helper trait to inspect AssetKind properties
pub trait AssetInspector {
  fn is_native(&self) -> bool;
  fn local_id(&self) -> Option<u32>;

  // Bitmask checks
  fn is_std(&self) -> bool;
  fn is_stable(&self) -> bool;
  fn is_receipt(&self) -> bool;
  fn is_lp(&self) -> bool;
  fn is_share(&self) -> bool;
  fn is_foreign(&self) -> bool;
}

impl AssetInspector for AssetKind {
  fn is_native(&self) -> bool {
    matches!(self, AssetKind::Native)
  }

  fn local_id(&self) -> Option<u32> {
    match self {
      AssetKind::Local(id) | AssetKind::Foreign(id) => Some(*id),
      _ => None,
    }
  }

  fn is_std(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_STD,
      _ => false,
    }
  }

  fn is_stable(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_STABLE,
      _ => false,
    }
  }

  fn is_receipt(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_RECEIPT,
      _ => false,
    }
  }

  fn is_lp(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_LP,
      _ => false,
    }
  }

  fn is_share(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_SHARE,
      _ => false,
    }
  }

  fn is_foreign(&self) -> bool {
    match self {
      AssetKind::Foreign(_) => true,
      AssetKind::Local(id) => (id & MASK_TYPE) == TYPE_FOREIGN,
      _ => false,
    }
  }
}

/// Helper to construct compile-time IDs
const fn make_id(type_mask: u32, index: u32) -> u32 {
  type_mask | (index & MASK_INDEX)
}

/// Well-known asset constants serving as system defaults
pub mod well_known {
  use super::*;

  /// The protocol token: relayer rewards are paid in it, tips are escrowed
  /// in it, and the treasury's buyback/POL policy targets it.
  pub const PROTOCOL_TOKEN: u32 = make_id(TYPE_STD, 1);

  // Standard Tokens (0x1...)
  pub const WETH: u32 = make_id(TYPE_STD, 2);
  pub const WBTC: u32 = make_id(TYPE_STD, 3);

  // Stablecoins (0x2...)
  pub const USDT: u32 = make_id(TYPE_STABLE, 1);
  pub const USDC: u32 = make_id(TYPE_STABLE, 2);
  pub const DAI: u32 = make_id(TYPE_STABLE, 3);
}
