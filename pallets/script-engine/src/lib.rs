//! Script Engine Pallet
//!
//! Verification and execution of pre-signed conditional scripts. Users sign a
//! `Script` off-chain describing an action and the conditions under which it
//! may run; relayers submit it through `execute` and are compensated through
//! the gas tank. `verify` is the read-only preflight relayers run from their
//! queues: it never touches storage and fails fast with a classed failure so
//! queues know whether to purge, park or retry a script.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{
  AssetOps, DexOps, ExecutionCounter, MarketAccountData, MoneyMarketOps, RateMode, RewardSink,
  VaultOps,
};

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::script-engine";

#[frame::pallet]
pub mod pallet {
  use super::{
    AssetOps, DexOps, ExecutionCounter, LOG_TARGET, MoneyMarketOps, RateMode, RewardSink, VaultOps,
    WeightInfo,
  };
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{PalletId, traits::{EnsureOrigin, UnixTime}},
    sp_io::hashing::blake2_256,
    sp_runtime::traits::{AccountIdConversion, IdentifyAccount, Verify},
  };
  use primitives::{
    AssetKind, Balance, Comparison, ExecutorId, FailureClass, ScriptId, params,
  };

  /// Domain separator mixed into every signing payload. Bump the trailing
  /// version byte whenever the encoding of `Script` changes layout.
  pub const SIGNING_DOMAIN: [u8; 16] = *b"daemons-script-1";

  /// An amount, fixed at signing time or resolved against a live balance at
  /// verification time.
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
  pub enum Amount {
    Absolute(Balance),
    Fraction(Permill),
  }

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
  pub enum SupplyKind {
    Deposit,
    Withdraw,
  }

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
  pub enum DebtKind {
    Borrow,
    Repay,
  }

  /// What a zap-out collapses the withdrawn liquidity into.
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
  pub enum ZapOutcome {
    TokenA,
    TokenB,
    Both,
  }

  /// The effect half of a script. Each variant belongs to exactly one
  /// `ExecutorId` family; `execute` rejects scripts whose declared family
  /// does not match their action.
  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub enum Action<AccountId> {
    Transfer {
      token: AssetKind,
      destination: AccountId,
      amount: Amount,
    },
    Swap {
      token_in: AssetKind,
      token_out: AssetKind,
      amount: Amount,
    },
    MarketBase {
      token: AssetKind,
      receipt_token: AssetKind,
      kind: SupplyKind,
      amount: Amount,
    },
    MarketAdvanced {
      token: AssetKind,
      debt_token: AssetKind,
      kind: DebtKind,
      rate_mode: RateMode,
      amount: Amount,
    },
    ZapIn {
      token_a: AssetKind,
      token_b: AssetKind,
      amount_a: Amount,
      amount_b: Amount,
    },
    ZapOut {
      token_a: AssetKind,
      token_b: AssetKind,
      amount: Amount,
      outcome: ZapOutcome,
    },
    Vault {
      lp_token: AssetKind,
      share_token: AssetKind,
      kind: SupplyKind,
      amount: Amount,
    },
    Pass,
  }

  impl<AccountId> Action<AccountId> {
    pub fn family(&self) -> ExecutorId {
      match self {
        Action::Transfer { .. } => ExecutorId::Transfer,
        Action::Swap { .. } => ExecutorId::Swap,
        Action::MarketBase { .. } => ExecutorId::MarketBase,
        Action::MarketAdvanced { .. } => ExecutorId::MarketAdvanced,
        Action::ZapIn { .. } => ExecutorId::ZapIn,
        Action::ZapOut { .. } => ExecutorId::ZapOut,
        Action::Vault { .. } => ExecutorId::Vault,
        Action::Pass => ExecutorId::Pass,
      }
    }
  }

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
  pub struct BalanceCondition {
    pub token: AssetKind,
    pub comparison: Comparison,
    pub amount: Balance,
  }

  /// Times are unix seconds. The first execution only waits for `start`;
  /// subsequent ones additionally wait `delay` seconds since the last run.
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
  pub struct FrequencyCondition {
    pub delay: u64,
    pub start: u64,
  }

  /// `value` is the PRECISION-scaled price of 1.0 `token_a` in `token_b`,
  /// compared against the live AMM quote.
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
  pub struct PriceCondition {
    pub token_a: AssetKind,
    pub token_b: AssetKind,
    pub comparison: Comparison,
    pub value: Balance,
  }

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
  pub struct RepetitionsCondition {
    pub amount: u32,
  }

  /// Chains this script behind another of the same user: it becomes runnable
  /// once the referenced script's execution count exceeds `shift`.
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
  pub struct FollowCondition {
    pub script_id: ScriptId,
    pub executor: ExecutorId,
    pub shift: u32,
  }

  /// `amount` is PRECISION-scaled, like the health factor it is compared to.
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
  pub struct HealthFactorCondition {
    pub comparison: Comparison,
    pub amount: Balance,
  }

  /// The gate half of a script. `None` blocks are disabled; enabled blocks
  /// must all hold for the script to execute.
  #[derive(
    Clone,
    Copy,
    Debug,
    Decode,
    DecodeWithMemTracking,
    Default,
    Encode,
    Eq,
    PartialEq,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub struct Conditions {
    pub balance: Option<BalanceCondition>,
    pub frequency: Option<FrequencyCondition>,
    pub price: Option<PriceCondition>,
    pub repetitions: Option<RepetitionsCondition>,
    pub follow: Option<FollowCondition>,
    pub health_factor: Option<HealthFactorCondition>,
  }

  /// A pre-signed script. The SCALE encoding of this struct (prefixed by
  /// `SIGNING_DOMAIN`, then hashed with blake2_256) is the signing payload,
  /// so field order is part of the wire format.
  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct Script<AccountId> {
    pub id: ScriptId,
    pub user: AccountId,
    pub executor: ExecutorId,
    pub chain_id: u64,
    pub tip: Balance,
    pub action: Action<AccountId>,
    pub conditions: Conditions,
  }

  /// Mutable per-script state. `revoked` is one-way; the other two fields
  /// change only inside a successful `execute`.
  #[derive(
    Clone,
    Copy,
    Debug,
    Decode,
    DecodeWithMemTracking,
    Default,
    Encode,
    Eq,
    PartialEq,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub struct ScriptState {
    pub last_execution_time: u64,
    pub execution_count: u32,
    pub revoked: bool,
  }

  /// Amounts resolved against the balance snapshot taken during
  /// verification. Execution re-uses them so verify and effect agree on what
  /// is moved.
  #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
  pub struct Resolved {
    pub amount_a: Balance,
    pub amount_b: Balance,
  }

  /// Why a script cannot run right now. `class` tells relayers what to do
  /// with the queued script; the variants map one-to-one onto `Error`.
  #[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub enum VerifyFailure {
    SignatureMismatch,
    ExecutorMismatch,
    WrongChain,
    ScriptRevoked,
    InsufficientScriptBalance,
    NoDebt,
    BorrowTooHigh,
    BorrowNeverPossible,
    ZeroAmount,
    UnsupportedPair,
    FrequencyConditionUnmet,
    BalanceConditionLow,
    BalanceConditionHigh,
    PriceConditionLow,
    PriceConditionHigh,
    InsufficientGasBalance,
    InsufficientTipBalance,
    MissingAllowance,
    RepetitionsExhausted,
    FollowConditionUnmet,
    HealthFactorLow,
    HealthFactorHigh,
  }

  impl VerifyFailure {
    pub fn class(&self) -> FailureClass {
      use VerifyFailure::*;
      match self {
        SignatureMismatch | ExecutorMismatch | ScriptRevoked | BorrowNeverPossible | ZeroAmount
        | UnsupportedPair | RepetitionsExhausted => FailureClass::Final,
        WrongChain => FailureClass::Error,
        MissingAllowance => FailureClass::Action,
        InsufficientScriptBalance
        | NoDebt
        | BorrowTooHigh
        | FrequencyConditionUnmet
        | BalanceConditionLow
        | BalanceConditionHigh
        | PriceConditionLow
        | PriceConditionHigh
        | InsufficientGasBalance
        | InsufficientTipBalance
        | FollowConditionUnmet
        | HealthFactorLow
        | HealthFactorHigh => FailureClass::Temporary,
      }
    }
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Token custody: balances, approvals, delegated transfers
    type Assets: AssetOps<Self::AccountId>;
    /// AMM used by swap/zap actions and price conditions
    type Dex: DexOps<Self::AccountId>;
    /// Money market used by market actions and health-factor conditions
    type MoneyMarket: MoneyMarketOps<Self::AccountId>;
    /// Yield vaults used by vault actions
    type Vaults: VaultOps<Self::AccountId>;
    /// Gas/tip escrow debited on execution
    type Escrow: RewardSink<Self::AccountId>;
    /// Execution counters consulted by follow conditions
    type FollowSource: ExecutionCounter<Self::AccountId>;
    /// Unix time source for frequency conditions and execution timestamps
    type TimeProvider: UnixTime;
    /// Account recovery from the signing public key
    type Public: IdentifyAccount<AccountId = Self::AccountId> + Member + Parameter;
    /// Signature scheme scripts are signed with
    type Signature: Verify<Signer = Self::Public> + Member + Parameter;
    /// Chain identifier bound into every signature
    #[pallet::constant]
    type ChainId: Get<u64>;
    /// Pallet ID; the derived account is the approval spender for scripts
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Origin allowed to update the gas price feed
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  /// Execution state per (executor family, user, script id)
  #[pallet::storage]
  pub type ScriptStates<T: Config> = StorageNMap<
    _,
    (
      NMapKey<Blake2_128Concat, ExecutorId>,
      NMapKey<Blake2_128Concat, T::AccountId>,
      NMapKey<Blake2_128Concat, ScriptId>,
    ),
    ScriptState,
    ValueQuery,
  >;

  #[pallet::type_value]
  pub fn DefaultGasPrice<T: Config>() -> Balance {
    params::DEFAULT_GAS_PRICE
  }

  /// Current gas price used to cost executions against the gas escrow
  #[pallet::storage]
  pub type GasPrice<T: Config> = StorageValue<_, Balance, ValueQuery, DefaultGasPrice<T>>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A script was executed by a relayer
    ScriptExecuted {
      executor: ExecutorId,
      script_id: ScriptId,
      user: T::AccountId,
      relayer: T::AccountId,
      cost: Balance,
      tip: Balance,
    },
    /// A script was revoked by its owner
    ScriptRevoked {
      executor: ExecutorId,
      script_id: ScriptId,
      user: T::AccountId,
    },
    /// The gas price feed was updated
    GasPriceUpdated { old: Balance, new: Balance },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Signature does not match the script payload and user
    SignatureMismatch,
    /// Declared executor family does not match the action
    ExecutorMismatch,
    /// Script was signed for a different chain
    WrongChain,
    /// Script has been revoked by its owner
    ScriptRevoked,
    /// User balance cannot cover the action's input amount
    InsufficientScriptBalance,
    /// Repay scheduled but the user has no debt
    NoDebt,
    /// Requested borrow exceeds the currently borrowable amount
    BorrowTooHigh,
    /// A 100% fractional borrow can never succeed
    BorrowNeverPossible,
    /// Both zap amounts resolved to zero
    ZeroAmount,
    /// No pool exists for the requested pair
    UnsupportedPair,
    /// Frequency window has not opened yet
    FrequencyConditionUnmet,
    /// Observed balance is below the conditioned threshold
    BalanceConditionLow,
    /// Observed balance is above the conditioned threshold
    BalanceConditionHigh,
    /// Quoted price is below the conditioned threshold
    PriceConditionLow,
    /// Quoted price is above the conditioned threshold
    PriceConditionHigh,
    /// Gas escrow cannot cover the execution cost
    InsufficientGasBalance,
    /// Tip escrow cannot cover the promised tip
    InsufficientTipBalance,
    /// User has not granted the engine the required allowance
    MissingAllowance,
    /// The script already ran its allotted number of times
    RepetitionsExhausted,
    /// Followed script has not advanced far enough
    FollowConditionUnmet,
    /// Health factor is below the conditioned threshold
    HealthFactorLow,
    /// Health factor is above the conditioned threshold
    HealthFactorHigh,
    /// Gas price must be greater than zero
    ZeroGasPrice,
  }

  impl<T> From<VerifyFailure> for Error<T> {
    fn from(failure: VerifyFailure) -> Self {
      match failure {
        VerifyFailure::SignatureMismatch => Error::<T>::SignatureMismatch,
        VerifyFailure::ExecutorMismatch => Error::<T>::ExecutorMismatch,
        VerifyFailure::WrongChain => Error::<T>::WrongChain,
        VerifyFailure::ScriptRevoked => Error::<T>::ScriptRevoked,
        VerifyFailure::InsufficientScriptBalance => Error::<T>::InsufficientScriptBalance,
        VerifyFailure::NoDebt => Error::<T>::NoDebt,
        VerifyFailure::BorrowTooHigh => Error::<T>::BorrowTooHigh,
        VerifyFailure::BorrowNeverPossible => Error::<T>::BorrowNeverPossible,
        VerifyFailure::ZeroAmount => Error::<T>::ZeroAmount,
        VerifyFailure::UnsupportedPair => Error::<T>::UnsupportedPair,
        VerifyFailure::FrequencyConditionUnmet => Error::<T>::FrequencyConditionUnmet,
        VerifyFailure::BalanceConditionLow => Error::<T>::BalanceConditionLow,
        VerifyFailure::BalanceConditionHigh => Error::<T>::BalanceConditionHigh,
        VerifyFailure::PriceConditionLow => Error::<T>::PriceConditionLow,
        VerifyFailure::PriceConditionHigh => Error::<T>::PriceConditionHigh,
        VerifyFailure::InsufficientGasBalance => Error::<T>::InsufficientGasBalance,
        VerifyFailure::InsufficientTipBalance => Error::<T>::InsufficientTipBalance,
        VerifyFailure::MissingAllowance => Error::<T>::MissingAllowance,
        VerifyFailure::RepetitionsExhausted => Error::<T>::RepetitionsExhausted,
        VerifyFailure::FollowConditionUnmet => Error::<T>::FollowConditionUnmet,
        VerifyFailure::HealthFactorLow => Error::<T>::HealthFactorLow,
        VerifyFailure::HealthFactorHigh => Error::<T>::HealthFactorHigh,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Execute a pre-signed script on behalf of its owner
    ///
    /// Runs the full verification chain, applies the action, records the
    /// execution and accrues the relayer's reward in the gas tank. Any
    /// failure along the way aborts the whole transaction.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute())]
    pub fn execute(
      origin: OriginFor<T>,
      script: Script<T::AccountId>,
      signature: T::Signature,
    ) -> DispatchResult {
      let relayer = ensure_signed(origin)?;

      let resolved = Self::verify(&script, &signature).map_err(Error::<T>::from)?;

      Self::apply_action(&script, &resolved)?;

      let now = T::TimeProvider::now().as_secs();
      ScriptStates::<T>::mutate((script.executor, &script.user, script.id), |state| {
        state.last_execution_time = now;
        state.execution_count = state.execution_count.saturating_add(1);
      });

      let cost = GasPrice::<T>::get().saturating_mul(script.executor.gas_limit());
      T::Escrow::add_reward(
        script.executor,
        script.id,
        cost,
        script.tip,
        &script.user,
        &relayer,
      )?;

      log::debug!(
        target: LOG_TARGET,
        "executed {:?} script {:?}, cost {} tip {}",
        script.executor,
        script.id,
        cost,
        script.tip,
      );

      Self::deposit_event(Event::ScriptExecuted {
        executor: script.executor,
        script_id: script.id,
        user: script.user,
        relayer,
        cost,
        tip: script.tip,
      });

      Ok(())
    }

    /// Permanently revoke one of the caller's scripts
    ///
    /// Idempotent: revoking an already revoked script succeeds silently.
    /// There is no way back; a revoked id stays revoked even if never seen
    /// on-chain before.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::revoke())]
    pub fn revoke(origin: OriginFor<T>, executor: ExecutorId, script_id: ScriptId) -> DispatchResult {
      let user = ensure_signed(origin)?;

      ScriptStates::<T>::mutate((executor, &user, script_id), |state| {
        if !state.revoked {
          state.revoked = true;
          Self::deposit_event(Event::ScriptRevoked {
            executor,
            script_id,
            user: user.clone(),
          });
        }
      });

      Ok(())
    }

    /// Update the gas price used to cost executions
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::set_gas_price())]
    pub fn set_gas_price(origin: OriginFor<T>, price: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      ensure!(price > 0, Error::<T>::ZeroGasPrice);

      let old = GasPrice::<T>::get();
      GasPrice::<T>::put(price);

      Self::deposit_event(Event::GasPriceUpdated { old, new: price });

      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (derived from PalletId)
    ///
    /// Scripts are authorized by approving this account as spender; the
    /// account itself never holds funds.
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Signing payload for a script: blake2_256 over the domain-prefixed
    /// SCALE encoding.
    pub fn signing_payload(script: &Script<T::AccountId>) -> [u8; 32] {
      let mut data: Vec<u8> = SIGNING_DOMAIN.to_vec();
      script.encode_to(&mut data);
      blake2_256(&data)
    }

    /// Read-only preflight: would this script execute right now?
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// signature, chain, revocation, action-intrinsic balances, then the
    /// frequency / balance / price conditions, gas and tip solvency,
    /// allowances, repetitions, follow and health factor. All balance reads
    /// happen against a single snapshot; the returned `Resolved` amounts are
    /// what execution will move.
    pub fn verify(
      script: &Script<T::AccountId>,
      signature: &T::Signature,
    ) -> Result<Resolved, VerifyFailure> {
      // 1. signature and family
      let payload = Self::signing_payload(script);
      if !signature.verify(&payload[..], &script.user) {
        return Err(VerifyFailure::SignatureMismatch);
      }
      if script.action.family() != script.executor {
        return Err(VerifyFailure::ExecutorMismatch);
      }

      // 2. chain
      if script.chain_id != T::ChainId::get() {
        return Err(VerifyFailure::WrongChain);
      }

      // 3. revocation
      let state = ScriptStates::<T>::get((script.executor, &script.user, script.id));
      if state.revoked {
        return Err(VerifyFailure::ScriptRevoked);
      }

      // 4. action-intrinsic solvency
      let resolved = Self::resolve_action(script)?;

      // 5. frequency
      if let Some(frequency) = &script.conditions.frequency {
        let now = T::TimeProvider::now().as_secs();
        if now < frequency.start {
          return Err(VerifyFailure::FrequencyConditionUnmet);
        }
        if state.last_execution_time != 0
          && now < state.last_execution_time.saturating_add(frequency.delay)
        {
          return Err(VerifyFailure::FrequencyConditionUnmet);
        }
      }

      // 6. balance condition
      if let Some(condition) = &script.conditions.balance {
        let balance = T::Assets::balance(&script.user, condition.token);
        match condition.comparison {
          Comparison::GreaterThan if balance <= condition.amount => {
            return Err(VerifyFailure::BalanceConditionLow);
          }
          Comparison::LessThan if balance >= condition.amount => {
            return Err(VerifyFailure::BalanceConditionHigh);
          }
          _ => {}
        }
      }

      // 7. price condition
      if let Some(condition) = &script.conditions.price {
        let quote = T::Dex::get_quote(condition.token_a, condition.token_b, params::PRECISION)
          .ok_or(VerifyFailure::UnsupportedPair)?;
        match condition.comparison {
          Comparison::GreaterThan if quote <= condition.value => {
            return Err(VerifyFailure::PriceConditionLow);
          }
          Comparison::LessThan if quote >= condition.value => {
            return Err(VerifyFailure::PriceConditionHigh);
          }
          _ => {}
        }
      }

      // 8. gas solvency
      let cost = GasPrice::<T>::get().saturating_mul(script.executor.gas_limit());
      if T::Escrow::gas_balance(&script.user) < cost {
        return Err(VerifyFailure::InsufficientGasBalance);
      }

      // 9. tip solvency
      if script.tip > 0 && T::Escrow::tip_balance(&script.user) < script.tip {
        return Err(VerifyFailure::InsufficientTipBalance);
      }

      // 10. allowances
      Self::check_allowances(script, &resolved)?;

      // 11. repetitions
      if let Some(repetitions) = &script.conditions.repetitions {
        if state.execution_count >= repetitions.amount {
          return Err(VerifyFailure::RepetitionsExhausted);
        }
      }

      // 12. follow
      if let Some(follow) = &script.conditions.follow {
        let count =
          T::FollowSource::execution_count(follow.executor, &script.user, follow.script_id);
        if count <= follow.shift {
          return Err(VerifyFailure::FollowConditionUnmet);
        }
      }

      // 13. health factor
      if let Some(condition) = &script.conditions.health_factor {
        let health_factor = T::MoneyMarket::account_data(&script.user).health_factor;
        match condition.comparison {
          Comparison::GreaterThan if health_factor <= condition.amount => {
            return Err(VerifyFailure::HealthFactorLow);
          }
          Comparison::LessThan if health_factor >= condition.amount => {
            return Err(VerifyFailure::HealthFactorHigh);
          }
          _ => {}
        }
      }

      Ok(resolved)
    }

    fn resolve(amount: &Amount, available: Balance) -> Balance {
      match amount {
        Amount::Absolute(value) => *value,
        Amount::Fraction(fraction) => fraction.mul_floor(available),
      }
    }

    /// Resolve the action's amounts against live balances and check the
    /// user can actually supply them.
    fn resolve_action(script: &Script<T::AccountId>) -> Result<Resolved, VerifyFailure> {
      let user = &script.user;
      match &script.action {
        Action::Transfer { token, amount, .. } => {
          let balance = T::Assets::balance(user, *token);
          let amount = Self::resolve(amount, balance);
          if amount == 0 || amount > balance {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved { amount_a: amount, amount_b: 0 })
        }
        Action::Swap {
          token_in,
          token_out,
          amount,
        } => {
          if T::Dex::get_pool_reserves(*token_in, *token_out).is_none() {
            return Err(VerifyFailure::UnsupportedPair);
          }
          let balance = T::Assets::balance(user, *token_in);
          let amount = Self::resolve(amount, balance);
          if amount == 0 || amount > balance {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved { amount_a: amount, amount_b: 0 })
        }
        Action::MarketBase {
          token,
          receipt_token,
          kind,
          amount,
        } => {
          let source = match kind {
            SupplyKind::Deposit => *token,
            SupplyKind::Withdraw => *receipt_token,
          };
          let balance = T::Assets::balance(user, source);
          let amount = Self::resolve(amount, balance);
          if amount == 0 || amount > balance {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved { amount_a: amount, amount_b: 0 })
        }
        Action::MarketAdvanced {
          token,
          debt_token,
          kind,
          rate_mode,
          amount,
        } => match kind {
          DebtKind::Borrow => {
            if matches!(amount, Amount::Fraction(fraction) if *fraction == Permill::one()) {
              // Interest accrues between quote and execution, so the full
              // capacity is never actually borrowable.
              return Err(VerifyFailure::BorrowNeverPossible);
            }
            let available = T::MoneyMarket::account_data(user).available_borrow;
            let amount = Self::resolve(amount, available);
            if amount == 0 || amount > available {
              return Err(VerifyFailure::BorrowTooHigh);
            }
            Ok(Resolved { amount_a: amount, amount_b: 0 })
          }
          DebtKind::Repay => {
            let debt = T::MoneyMarket::debt(user, *debt_token, *rate_mode);
            if debt == 0 {
              return Err(VerifyFailure::NoDebt);
            }
            let amount = Self::resolve(amount, debt).min(debt);
            let balance = T::Assets::balance(user, *token);
            if amount == 0 || amount > balance {
              return Err(VerifyFailure::InsufficientScriptBalance);
            }
            Ok(Resolved { amount_a: amount, amount_b: 0 })
          }
        },
        Action::ZapIn {
          token_a,
          token_b,
          amount_a,
          amount_b,
        } => {
          if T::Dex::get_pool_reserves(*token_a, *token_b).is_none() {
            return Err(VerifyFailure::UnsupportedPair);
          }
          let balance_a = T::Assets::balance(user, *token_a);
          let balance_b = T::Assets::balance(user, *token_b);
          let resolved_a = Self::resolve(amount_a, balance_a);
          let resolved_b = Self::resolve(amount_b, balance_b);
          if resolved_a == 0 && resolved_b == 0 {
            return Err(VerifyFailure::ZeroAmount);
          }
          if resolved_a > balance_a || resolved_b > balance_b {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved {
            amount_a: resolved_a,
            amount_b: resolved_b,
          })
        }
        Action::ZapOut {
          token_a,
          token_b,
          amount,
          ..
        } => {
          let lp_token = T::Dex::get_pool_id(*token_a, *token_b)
            .ok_or(VerifyFailure::UnsupportedPair)?;
          let balance = T::Assets::balance(user, lp_token);
          let amount = Self::resolve(amount, balance);
          if amount == 0 || amount > balance {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved { amount_a: amount, amount_b: 0 })
        }
        Action::Vault {
          lp_token,
          share_token,
          kind,
          amount,
        } => {
          let balance = match kind {
            SupplyKind::Deposit => T::Assets::balance(user, *lp_token),
            SupplyKind::Withdraw => T::Vaults::share_balance(user, *share_token),
          };
          let amount = Self::resolve(amount, balance);
          if amount == 0 || amount > balance {
            return Err(VerifyFailure::InsufficientScriptBalance);
          }
          Ok(Resolved { amount_a: amount, amount_b: 0 })
        }
        Action::Pass => Ok(Resolved::default()),
      }
    }

    /// Allowance gate for the action's input tokens. Native inputs are
    /// runtime-internal and always pass.
    fn check_allowances(
      script: &Script<T::AccountId>,
      resolved: &Resolved,
    ) -> Result<(), VerifyFailure> {
      let user = &script.user;
      let engine = Self::account_id();

      let check = |token: AssetKind, amount: Balance| -> Result<(), VerifyFailure> {
        if amount > 0 && T::Assets::allowance(user, &engine, token) < amount {
          return Err(VerifyFailure::MissingAllowance);
        }
        Ok(())
      };

      match &script.action {
        Action::Transfer { token, .. } => check(*token, resolved.amount_a),
        Action::Swap { token_in, .. } => check(*token_in, resolved.amount_a),
        Action::MarketBase {
          token,
          receipt_token,
          kind,
          ..
        } => match kind {
          SupplyKind::Deposit => check(*token, resolved.amount_a),
          SupplyKind::Withdraw => check(*receipt_token, resolved.amount_a),
        },
        Action::MarketAdvanced {
          token,
          debt_token,
          kind,
          rate_mode,
          ..
        } => match kind {
          DebtKind::Borrow => {
            let delegated =
              T::MoneyMarket::borrow_allowance(user, &engine, *debt_token, *rate_mode);
            if delegated < resolved.amount_a {
              return Err(VerifyFailure::MissingAllowance);
            }
            Ok(())
          }
          DebtKind::Repay => check(*token, resolved.amount_a),
        },
        Action::ZapIn {
          token_a, token_b, ..
        } => {
          check(*token_a, resolved.amount_a)?;
          check(*token_b, resolved.amount_b)
        }
        Action::ZapOut {
          token_a, token_b, ..
        } => {
          // Pool existence was established during resolution
          let lp_token = T::Dex::get_pool_id(*token_a, *token_b)
            .ok_or(VerifyFailure::UnsupportedPair)?;
          check(lp_token, resolved.amount_a)
        }
        Action::Vault {
          lp_token,
          share_token,
          kind,
          ..
        } => match kind {
          SupplyKind::Deposit => check(*lp_token, resolved.amount_a),
          SupplyKind::Withdraw => check(*share_token, resolved.amount_a),
        },
        Action::Pass => Ok(()),
      }
    }

    /// Apply the action effect using the amounts resolved at verification.
    fn apply_action(script: &Script<T::AccountId>, resolved: &Resolved) -> DispatchResult {
      let user = &script.user;
      let engine = Self::account_id();

      match &script.action {
        Action::Transfer {
          token, destination, ..
        } => T::Assets::transfer_from(&engine, user, destination, *token, resolved.amount_a),
        Action::Swap {
          token_in,
          token_out,
          ..
        } => {
          T::Dex::swap_exact_in(user, *token_in, *token_out, resolved.amount_a, 0)?;
          Ok(())
        }
        Action::MarketBase { token, kind, .. } => match kind {
          SupplyKind::Deposit => T::MoneyMarket::deposit(user, *token, resolved.amount_a),
          SupplyKind::Withdraw => T::MoneyMarket::withdraw(user, *token, resolved.amount_a),
        },
        Action::MarketAdvanced {
          token,
          kind,
          rate_mode,
          ..
        } => match kind {
          DebtKind::Borrow => T::MoneyMarket::borrow(user, *token, resolved.amount_a, *rate_mode),
          DebtKind::Repay => T::MoneyMarket::repay(user, *token, resolved.amount_a, *rate_mode),
        },
        Action::ZapIn {
          token_a, token_b, ..
        } => Self::zap_in(user, *token_a, *token_b, resolved.amount_a, resolved.amount_b),
        Action::ZapOut {
          token_a,
          token_b,
          outcome,
          ..
        } => {
          let (received_a, received_b) =
            T::Dex::remove_liquidity(user, *token_a, *token_b, resolved.amount_a)?;
          match outcome {
            ZapOutcome::TokenA if received_b > 0 => {
              T::Dex::swap_exact_in(user, *token_b, *token_a, received_b, 0)?;
            }
            ZapOutcome::TokenB if received_a > 0 => {
              T::Dex::swap_exact_in(user, *token_a, *token_b, received_a, 0)?;
            }
            _ => {}
          }
          Ok(())
        }
        Action::Vault {
          lp_token,
          share_token,
          kind,
          ..
        } => match kind {
          SupplyKind::Deposit => {
            T::Vaults::deposit(user, *lp_token, *share_token, resolved.amount_a)
          }
          SupplyKind::Withdraw => {
            T::Vaults::withdraw(user, *lp_token, *share_token, resolved.amount_a)
          }
        },
        Action::Pass => Ok(()),
      }
    }

    /// Balance the two sides against pool reserves, then add liquidity.
    ///
    /// A one-sided zap first swaps half of the lone side into the other so
    /// both legs exist; leftovers stay in the user's wallet.
    fn zap_in(
      user: &T::AccountId,
      token_a: AssetKind,
      token_b: AssetKind,
      amount_a: Balance,
      amount_b: Balance,
    ) -> DispatchResult {
      let (mut amount_a, mut amount_b) = (amount_a, amount_b);

      if amount_a == 0 {
        let half = amount_b / 2;
        amount_a = T::Dex::swap_exact_in(user, token_b, token_a, half, 0)?;
        amount_b -= half;
      } else if amount_b == 0 {
        let half = amount_a / 2;
        amount_b = T::Dex::swap_exact_in(user, token_a, token_b, half, 0)?;
        amount_a -= half;
      }

      T::Dex::add_liquidity(user, token_a, token_b, amount_a, amount_b)?;
      Ok(())
    }
  }

  impl<T: Config> super::ExecutionCounter<T::AccountId> for Pallet<T> {
    fn execution_count(executor: ExecutorId, user: &T::AccountId, script_id: ScriptId) -> u32 {
      ScriptStates::<T>::get((executor, user, script_id)).execution_count
    }
  }
}
