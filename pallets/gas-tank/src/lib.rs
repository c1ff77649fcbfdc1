//! Gas Tank Pallet
//!
//! Escrow for the two currencies scripts burn: native "gas" covering
//! execution costs and protocol-token tips. Users pre-fund both sides;
//! executing scripts debit them through the `RewardSink` trait and credit a
//! due-reward ledger per relayer. Claims are settled by the treasury, which
//! converts the due native amount into protocol token (plus the relayer's
//! share of tips) and either pays it out or stakes it.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::PayoutHandler;

pub mod weights;
pub use weights::WeightInfo;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::gas-tank";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, PayoutHandler, WeightInfo};
  use frame::prelude::*;
  use polkadot_sdk::frame_support::{
    PalletId,
    traits::{
      EnsureOrigin,
      fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
      fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
      tokens::Preservation,
    },
  };
  use polkadot_sdk::sp_runtime::traits::AccountIdConversion;
  use primitives::{Balance, ExecutorId, ScriptId, params};

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Native currency held as gas escrow
    type Currency: NativeInspect<Self::AccountId, Balance = Balance>
      + NativeMutate<Self::AccountId, Balance = Balance>;

    /// Fungible tokens; the configured protocol token is the tip currency
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// Treasury settling claims and receiving tip tokens
    type Treasury: PayoutHandler<Self::AccountId>;

    /// The pallet ID holding both escrows
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Origin allowed to configure the token and the executor allow-list
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  /// Native escrow funding future executions, per user
  #[pallet::storage]
  pub type GasBalances<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Protocol-token escrow funding script tips, per user
  #[pallet::storage]
  pub type TipBalances<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Native earned by executions but not yet claimed, per relayer
  #[pallet::storage]
  pub type DueGas<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Tips earned by executions but not yet claimed, per relayer
  #[pallet::storage]
  pub type DueTips<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Asset id of the protocol token used for tips and reward payouts
  #[pallet::storage]
  pub type TokenAsset<T: Config> = StorageValue<_, u32, OptionQuery>;

  /// Executor families allowed to accrue rewards through `add_reward`
  #[pallet::storage]
  pub type AuthorizedExecutors<T: Config> =
    StorageMap<_, Blake2_128Concat, ExecutorId, (), OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Native gas deposited into escrow
    GasDeposited { who: T::AccountId, amount: Balance },
    /// Native gas returned from escrow
    GasWithdrawn { who: T::AccountId, amount: Balance },
    /// Tip tokens deposited into escrow
    TipDeposited { who: T::AccountId, amount: Balance },
    /// Tip tokens returned from escrow
    TipWithdrawn { who: T::AccountId, amount: Balance },
    /// An execution debited escrows and accrued a relayer reward
    RewardAccrued {
      executor: ExecutorId,
      script_id: ScriptId,
      relayer: T::AccountId,
      gas: Balance,
      tip: Balance,
    },
    /// A relayer claimed accrued rewards
    RewardClaimed {
      relayer: T::AccountId,
      gas: Balance,
      tips: Balance,
      staked: bool,
    },
    /// The protocol token was configured
    TokenSet { old: Option<u32>, new: u32 },
    /// An executor family was allow-listed
    ExecutorAdded { executor: ExecutorId },
    /// An executor family was removed from the allow-list
    ExecutorRemoved { executor: ExecutorId },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Amount must be greater than zero
    ZeroAmount,
    /// Gas escrow cannot cover the requested amount
    InsufficientGas,
    /// Tip escrow cannot cover the requested amount
    InsufficientTip,
    /// No accrued rewards to claim
    NothingToClaim,
    /// Caller executor family is not allow-listed
    ExecutorNotAuthorized,
    /// Token or treasury not configured yet
    NotConfigured,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Deposit native gas into the caller's escrow
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::deposit_gas())]
    pub fn deposit_gas(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::ZeroAmount);

      T::Currency::transfer(&who, &Self::account_id(), amount, Preservation::Preserve)?;
      GasBalances::<T>::mutate(&who, |balance| *balance = balance.saturating_add(amount));

      Self::deposit_event(Event::GasDeposited { who, amount });
      Ok(())
    }

    /// Withdraw part of the caller's gas escrow
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::withdraw_gas())]
    pub fn withdraw_gas(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::ZeroAmount);

      Self::debit_gas(&who, amount)?;
      T::Currency::transfer(&Self::account_id(), &who, amount, Preservation::Expendable)?;

      Self::deposit_event(Event::GasWithdrawn { who, amount });
      Ok(())
    }

    /// Withdraw the caller's entire gas escrow
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::withdraw_all_gas())]
    pub fn withdraw_all_gas(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let amount = GasBalances::<T>::take(&who);
      ensure!(amount > 0, Error::<T>::InsufficientGas);
      T::Currency::transfer(&Self::account_id(), &who, amount, Preservation::Expendable)?;

      Self::deposit_event(Event::GasWithdrawn { who, amount });
      Ok(())
    }

    /// Deposit protocol tokens into the caller's tip escrow
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::deposit_tip())]
    pub fn deposit_tip(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::ZeroAmount);
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;

      T::Assets::transfer(token, &who, &Self::account_id(), amount, Preservation::Preserve)?;
      TipBalances::<T>::mutate(&who, |balance| *balance = balance.saturating_add(amount));

      Self::deposit_event(Event::TipDeposited { who, amount });
      Ok(())
    }

    /// Withdraw part of the caller's tip escrow
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::withdraw_tip())]
    pub fn withdraw_tip(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::ZeroAmount);
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;

      Self::debit_tip(&who, amount)?;
      T::Assets::transfer(token, &Self::account_id(), &who, amount, Preservation::Expendable)?;

      Self::deposit_event(Event::TipWithdrawn { who, amount });
      Ok(())
    }

    /// Withdraw the caller's entire tip escrow
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::withdraw_all_tip())]
    pub fn withdraw_all_tip(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;

      let amount = TipBalances::<T>::take(&who);
      ensure!(amount > 0, Error::<T>::InsufficientTip);
      T::Assets::transfer(token, &Self::account_id(), &who, amount, Preservation::Expendable)?;

      Self::deposit_event(Event::TipWithdrawn { who, amount });
      Ok(())
    }

    /// Claim accrued rewards, paid out in protocol token
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::claim_reward())]
    pub fn claim_reward(origin: OriginFor<T>) -> DispatchResult {
      let relayer = ensure_signed(origin)?;
      Self::do_claim(relayer, false)
    }

    /// Claim accrued rewards straight into the treasury's staking ledger
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::claim_and_stake_reward())]
    pub fn claim_and_stake_reward(origin: OriginFor<T>) -> DispatchResult {
      let relayer = ensure_signed(origin)?;
      Self::do_claim(relayer, true)
    }

    /// Configure the protocol token used for tips and payouts
    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::set_token())]
    pub fn set_token(origin: OriginFor<T>, asset_id: u32) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      let old = TokenAsset::<T>::get();
      TokenAsset::<T>::put(asset_id);

      Self::deposit_event(Event::TokenSet { old, new: asset_id });
      Ok(())
    }

    /// Allow an executor family to accrue rewards
    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::add_executor())]
    pub fn add_executor(origin: OriginFor<T>, executor: ExecutorId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      AuthorizedExecutors::<T>::insert(executor, ());

      Self::deposit_event(Event::ExecutorAdded { executor });
      Ok(())
    }

    /// Remove an executor family from the allow-list
    #[pallet::call_index(10)]
    #[pallet::weight(T::WeightInfo::remove_executor())]
    pub fn remove_executor(origin: OriginFor<T>, executor: ExecutorId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      AuthorizedExecutors::<T>::remove(executor);

      Self::deposit_event(Event::ExecutorRemoved { executor });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (holds both escrows)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// What a claim would currently pay, in protocol-token terms: the quote
    /// of due gas plus the relayer's share of due tips. The remaining tip
    /// share is the protocol's fee and stays with the treasury.
    pub fn claimable(relayer: &T::AccountId) -> Balance {
      let gas = DueGas::<T>::get(relayer);
      let tips = DueTips::<T>::get(relayer);
      T::Treasury::quote(gas)
        .unwrap_or_default()
        .saturating_add(params::RELAYER_TIP_SHARE.mul_floor(tips))
    }

    fn debit_gas(who: &T::AccountId, amount: Balance) -> DispatchResult {
      GasBalances::<T>::try_mutate(who, |balance| {
        *balance = balance
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientGas)?;
        Ok(())
      })
    }

    fn debit_tip(who: &T::AccountId, amount: Balance) -> DispatchResult {
      TipBalances::<T>::try_mutate(who, |balance| {
        *balance = balance
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientTip)?;
        Ok(())
      })
    }

    fn do_claim(relayer: T::AccountId, stake: bool) -> DispatchResult {
      ensure!(
        TokenAsset::<T>::get().is_some() && T::Treasury::is_configured(),
        Error::<T>::NotConfigured
      );

      let gas = DueGas::<T>::take(&relayer);
      let tips = DueTips::<T>::take(&relayer);
      ensure!(gas > 0 || tips > 0, Error::<T>::NothingToClaim);

      let tank = Self::account_id();
      if stake {
        T::Treasury::stake_payout(&tank, &relayer, gas, tips)?;
      } else {
        T::Treasury::request_payout(&tank, &relayer, gas, tips)?;
      }

      log::debug!(
        target: LOG_TARGET,
        "claim by {:?}: gas {} tips {} staked {}",
        relayer,
        gas,
        tips,
        stake,
      );

      Self::deposit_event(Event::RewardClaimed {
        relayer,
        gas,
        tips,
        staked: stake,
      });
      Ok(())
    }
  }

  impl<T: Config> pallet_script_engine::RewardSink<T::AccountId> for Pallet<T> {
    fn gas_balance(who: &T::AccountId) -> Balance {
      GasBalances::<T>::get(who)
    }

    fn tip_balance(who: &T::AccountId) -> Balance {
      TipBalances::<T>::get(who)
    }

    fn add_reward(
      executor: ExecutorId,
      script_id: ScriptId,
      reward: Balance,
      tip: Balance,
      payer: &T::AccountId,
      recipient: &T::AccountId,
    ) -> Result<(), DispatchError> {
      ensure!(
        AuthorizedExecutors::<T>::contains_key(executor),
        Error::<T>::ExecutorNotAuthorized
      );
      ensure!(
        TokenAsset::<T>::get().is_some() && T::Treasury::is_configured(),
        Error::<T>::NotConfigured
      );

      Self::debit_gas(payer, reward)?;
      if tip > 0 {
        Self::debit_tip(payer, tip)?;
        // Tip tokens move to the treasury at accrual; the relayer's share
        // comes back out of the treasury at claim time.
        T::Treasury::receive_tip(&Self::account_id(), tip)?;
      }

      DueGas::<T>::mutate(recipient, |due| *due = due.saturating_add(reward));
      DueTips::<T>::mutate(recipient, |due| *due = due.saturating_add(tip));

      Self::deposit_event(Event::RewardAccrued {
        executor,
        script_id,
        relayer: recipient.clone(),
        gas: reward,
        tip,
      });
      Ok(())
    }
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
