//! Script identity and classification types shared between the execution
//! engine, the gas tank and off-chain relayer tooling.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

use crate::Balance;

/// Opaque script identifier, chosen by the user at signing time.
///
/// Uniqueness is only required per `(user, executor)` pair; two users may
/// reuse the same id without interference.
pub type ScriptId = [u8; 32];

/// The action families a script can target. Each family has its own action
/// payload, its own execution state namespace and its own gas ceiling.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
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
pub enum ExecutorId {
  /// Plain token transfer to a destination account
  Transfer,
  /// AMM swap of one token for another
  Swap,
  /// Money-market supply / withdraw
  MarketBase,
  /// Money-market borrow / repay
  MarketAdvanced,
  /// Single-sided or two-sided liquidity provision
  ZapIn,
  /// Liquidity removal, optionally collapsing into one side
  ZapOut,
  /// Yield-vault deposit / withdraw
  Vault,
  /// No effect; the script is a pure condition probe
  Pass,
}

impl ExecutorId {
  /// Worst-case execution cost of one script of this family, in gas units.
  ///
  /// Multiplied by the current gas price to obtain the amount debited from
  /// the user's gas escrow per execution. Ceilings are deliberately
  /// conservative; unused headroom is never charged twice because the
  /// product is taken once per execution.
  pub const fn gas_limit(&self) -> Balance {
    match self {
      ExecutorId::Transfer => 150_000,
      ExecutorId::Swap => 200_000,
      ExecutorId::MarketBase => 250_000,
      ExecutorId::MarketAdvanced => 300_000,
      ExecutorId::ZapIn => 350_000,
      ExecutorId::ZapOut => 350_000,
      ExecutorId::Vault => 250_000,
      ExecutorId::Pass => 100_000,
    }
  }
}

/// Direction of a threshold comparison in balance, price and health-factor
/// conditions.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum Comparison {
  GreaterThan,
  LessThan,
}

/// Retry classification of a verification failure.
///
/// Relayers drop or keep scripts in their queues based on this class alone,
/// so it is part of the wire interface:
///
/// - `Final`: the script can never execute again; purge it.
/// - `Error`: the script is fine but was routed to the wrong chain.
/// - `Temporary`: state may change; retry later.
/// - `Action`: the user must intervene (e.g. grant an allowance).
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum FailureClass {
  Final,
  Error,
  Temporary,
  Action,
}
