//! Adapter trait towards the treasury.
//!
//! The tank never converts currencies itself: claims are handed to the
//! treasury, which pulls the due native amount, applies its fee split and
//! pays the relayer in protocol token.

use frame::prelude::*;
use primitives::Balance;

/// Treasury-side payout interface consumed by the gas tank.
///
/// `request_payout` and `stake_payout` pull `amount` native from `from` and
/// settle `quote(amount) + 80% of tip` in protocol token towards `user`,
/// either transferred out or credited to the staking ledger. `receive_tip`
/// forwards escrowed tip tokens at accrual time, so the treasury already
/// holds them when a claim arrives.
pub trait PayoutHandler<AccountId> {
  /// Whether the treasury can settle payouts (token and pool configured)
  fn is_configured() -> bool;

  /// Value of `amount` native in protocol-token terms, `None` without a pool
  fn quote(amount: Balance) -> Option<Balance>;

  fn receive_tip(from: &AccountId, amount: Balance) -> Result<(), DispatchError>;

  fn request_payout(
    from: &AccountId,
    user: &AccountId,
    amount: Balance,
    tip: Balance,
  ) -> Result<(), DispatchError>;

  fn stake_payout(
    from: &AccountId,
    user: &AccountId,
    amount: Balance,
    tip: Balance,
  ) -> Result<(), DispatchError>;
}

impl<AccountId> PayoutHandler<AccountId> for () {
  fn is_configured() -> bool {
    false
  }

  fn quote(_: Balance) -> Option<Balance> {
    None
  }

  fn receive_tip(_: &AccountId, _: Balance) -> Result<(), DispatchError> {
    Err(DispatchError::Other("PayoutHandler not configured"))
  }

  fn request_payout(
    _: &AccountId,
    _: &AccountId,
    _: Balance,
    _: Balance,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("PayoutHandler not configured"))
  }

  fn stake_payout(
    _: &AccountId,
    _: &AccountId,
    _: Balance,
    _: Balance,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("PayoutHandler not configured"))
  }
}
