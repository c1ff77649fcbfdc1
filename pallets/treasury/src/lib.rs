//! Protocol Treasury Pallet
//!
//! Sink of every execution fee. Native pulled in through relayer claims is
//! split three ways: an owner commission, a protocol-owned-liquidity share
//! and a redistribution share that streams back to protocol-token stakers
//! over a fixed interval. The POL share is periodically converted through
//! the AMM, either as a buyback (when the pool already holds enough of the
//! token supply) or as matched liquidity funding (when it does not).
//!
//! Staking follows the accumulator pattern: a monotone PRECISION-scaled
//! `RewardPerTokenStored` settled before every balance change, so rewards
//! stay proportional regardless of when stakers enter or leave.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::protocol-treasury";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use frame::prelude::*;
  use pallet_script_engine::DexOps;
  use polkadot_sdk::frame_support::{
    PalletId,
    traits::{
      EnsureOrigin, UnixTime,
      fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
      fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
      tokens::Preservation,
    },
  };
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::traits::AccountIdConversion;
  use primitives::{AssetKind, Balance, params};

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Native currency the treasury pools are denominated in
    type Currency: NativeInspect<Self::AccountId, Balance = Balance>
      + NativeMutate<Self::AccountId, Balance = Balance>;

    /// Fungible tokens; the configured protocol token is staked and paid out
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// AMM used for quotes, buybacks and liquidity funding
    type Dex: DexOps<Self::AccountId>;

    /// Unix time source for reward accrual
    type TimeProvider: UnixTime;

    /// The pallet ID holding pools, staked tokens and bought-back tokens
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Origin allowed to configure parameters and trigger POL conversion
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  #[pallet::type_value]
  pub fn DefaultCommission<T: Config>() -> Permill {
    params::DEFAULT_COMMISSION
  }

  #[pallet::type_value]
  pub fn DefaultPolShare<T: Config>() -> Permill {
    params::DEFAULT_POL_SHARE
  }

  #[pallet::type_value]
  pub fn DefaultBuybackThreshold<T: Config>() -> Permill {
    params::DEFAULT_BUYBACK_THRESHOLD
  }

  #[pallet::type_value]
  pub fn DefaultRedistributionInterval<T: Config>() -> u64 {
    params::DEFAULT_REDISTRIBUTION_INTERVAL
  }

  /// Asset id of the protocol token
  #[pallet::storage]
  pub type TokenAsset<T: Config> = StorageValue<_, u32, OptionQuery>;

  /// Share of every payout kept as owner commission
  #[pallet::storage]
  pub type CommissionPercentage<T: Config> =
    StorageValue<_, Permill, ValueQuery, DefaultCommission<T>>;

  /// Share of every payout reserved for protocol-owned liquidity
  #[pallet::storage]
  pub type PolPercentage<T: Config> = StorageValue<_, Permill, ValueQuery, DefaultPolShare<T>>;

  /// LP ownership ratio below which the POL pool must fund liquidity
  #[pallet::storage]
  pub type BuybackThreshold<T: Config> =
    StorageValue<_, Permill, ValueQuery, DefaultBuybackThreshold<T>>;

  /// Seconds over which the redistribution pool streams to stakers
  #[pallet::storage]
  pub type RedistributionInterval<T: Config> =
    StorageValue<_, u64, ValueQuery, DefaultRedistributionInterval<T>>;

  /// Native awaiting commission claims
  #[pallet::storage]
  pub type CommissionsPool<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Native awaiting POL conversion
  #[pallet::storage]
  pub type PolPool<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Native streaming to stakers at `RewardRate`
  #[pallet::storage]
  pub type RedistributionPool<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Total protocol token staked
  #[pallet::storage]
  pub type TotalStaked<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Staked protocol token per account
  #[pallet::storage]
  pub type StakedBalances<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Monotone accumulator: PRECISION-scaled native reward per staked token
  #[pallet::storage]
  pub type RewardPerTokenStored<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Accumulator mark at each account's last settlement
  #[pallet::storage]
  pub type UserRewardPerTokenPaid<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Settled, claimable native rewards per account
  #[pallet::storage]
  pub type Rewards<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  /// Unix time of the last accumulator settlement
  #[pallet::storage]
  pub type LastUpdateTime<T: Config> = StorageValue<_, u64, ValueQuery>;

  /// PRECISION-scaled native streamed per second; recomputed on funding
  #[pallet::storage]
  pub type RewardRate<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Total native ever paid out to stakers
  #[pallet::storage]
  pub type Distributed<T: Config> = StorageValue<_, Balance, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A payout was processed and split into the pools
    PayoutProcessed {
      user: T::AccountId,
      amount: Balance,
      commission: Balance,
      pol: Balance,
      redistribution: Balance,
      token_paid: Balance,
      staked: bool,
    },
    /// Protocol token entered the staking ledger
    Staked { who: T::AccountId, amount: Balance },
    /// Protocol token left the staking ledger
    Withdrawn { who: T::AccountId, amount: Balance },
    /// Accrued native rewards were paid out
    RewardPaid { who: T::AccountId, amount: Balance },
    /// Accrued rewards were converted and re-staked
    RewardCompounded {
      who: T::AccountId,
      native_in: Balance,
      token_staked: Balance,
    },
    /// The POL pool was converted into matched liquidity
    LpFunded {
      native_swapped: Balance,
      native_added: Balance,
      token_added: Balance,
      lp_received: Balance,
    },
    /// The POL pool bought back protocol token
    BuybackExecuted { spent: Balance, received: Balance },
    /// The commission pool was claimed
    CommissionClaimed {
      recipient: T::AccountId,
      amount: Balance,
    },
    /// The protocol token was configured
    TokenSet { old: Option<u32>, new: u32 },
    /// The commission share was updated
    CommissionUpdated { old: Permill, new: Permill },
    /// The POL share was updated
    PolPercentageUpdated { old: Permill, new: Permill },
    /// The buyback threshold was updated
    BuybackThresholdUpdated { old: Permill, new: Permill },
    /// The redistribution interval was updated
    RedistributionIntervalUpdated { old: u64, new: u64 },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Token or pool not configured yet
    NotConfigured,
    /// Commission above the allowed maximum
    CommissionTooHigh,
    /// POL share outside the allowed range
    PolOutOfRange,
    /// Buyback threshold outside the allowed range
    ThresholdOutOfRange,
    /// Redistribution interval outside the allowed range
    IntervalOutOfRange,
    /// Stake amount must be greater than zero
    CannotStakeZero,
    /// Withdraw amount must be greater than zero
    CannotWithdrawZero,
    /// Withdraw amount exceeds the staked balance
    InsufficientStake,
    /// Exiting would drain the whole staked pool
    CannotWithdrawAll,
    /// Nothing accrued to claim
    NothingToClaim,
    /// Pool ownership below threshold: fund liquidity instead
    FundingRequired,
    /// Pool ownership at threshold: buy back instead
    BuybackRequired,
    /// AMM output below the requested minimum
    InsufficientOutput,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Stake protocol token to earn a share of redistributed fees
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::stake())]
    pub fn stake(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::CannotStakeZero);
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;

      Self::update_reward(Some(&who));
      T::Assets::transfer(token, &who, &Self::account_id(), amount, Preservation::Preserve)?;
      StakedBalances::<T>::mutate(&who, |staked| *staked = staked.saturating_add(amount));
      TotalStaked::<T>::mutate(|total| *total = total.saturating_add(amount));

      Self::deposit_event(Event::Staked { who, amount });
      Ok(())
    }

    /// Withdraw staked protocol token
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::withdraw())]
    pub fn withdraw(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T>::CannotWithdrawZero);
      ensure!(
        amount <= StakedBalances::<T>::get(&who),
        Error::<T>::InsufficientStake
      );

      Self::update_reward(Some(&who));
      Self::unstake(&who, amount)?;

      Self::deposit_event(Event::Withdrawn { who, amount });
      Ok(())
    }

    /// Claim accrued native rewards
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::get_reward())]
    pub fn get_reward(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;

      Self::update_reward(Some(&who));
      let reward = Self::take_reward(&who)?;
      T::Currency::transfer(&Self::account_id(), &who, reward, Preservation::Preserve)?;

      Self::deposit_event(Event::RewardPaid { who, amount: reward });
      Ok(())
    }

    /// Withdraw the whole stake and claim any accrued reward
    ///
    /// The last staker cannot exit: a staked pool that empties while the
    /// reward stream is live would strand the remaining accrual.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::exit())]
    pub fn exit(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let staked = StakedBalances::<T>::get(&who);
      ensure!(staked > 0, Error::<T>::InsufficientStake);
      ensure!(staked < TotalStaked::<T>::get(), Error::<T>::CannotWithdrawAll);

      Self::update_reward(Some(&who));
      Self::unstake(&who, staked)?;
      let reward = Rewards::<T>::take(&who).min(RedistributionPool::<T>::get());
      if reward > 0 {
        Self::settle_reward_pools(reward);
        T::Currency::transfer(&Self::account_id(), &who, reward, Preservation::Preserve)?;
        Self::deposit_event(Event::RewardPaid {
          who: who.clone(),
          amount: reward,
        });
      }

      Self::deposit_event(Event::Withdrawn {
        who,
        amount: staked,
      });
      Ok(())
    }

    /// Convert accrued native rewards into protocol token and re-stake them
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::compound_reward())]
    pub fn compound_reward(origin: OriginFor<T>, min_amount_out: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;

      Self::update_reward(Some(&who));
      let reward = Self::take_reward(&who)?;

      let treasury = Self::account_id();
      let out = T::Dex::swap_exact_in(
        &treasury,
        AssetKind::Native,
        AssetKind::Local(token),
        reward,
        min_amount_out,
      )
      .map_err(|_| Error::<T>::InsufficientOutput)?;

      StakedBalances::<T>::mutate(&who, |staked| *staked = staked.saturating_add(out));
      TotalStaked::<T>::mutate(|total| *total = total.saturating_add(out));

      Self::deposit_event(Event::RewardCompounded {
        who,
        native_in: reward,
        token_staked: out,
      });
      Ok(())
    }

    /// Convert the POL pool into matched AMM liquidity
    ///
    /// Only allowed while the pool owns less of the token supply than the
    /// buyback threshold. Half the pool is swapped for token, the other
    /// half paired with the proceeds.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::fund_lp())]
    pub fn fund_lp(origin: OriginFor<T>, min_amount_out: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      ensure!(
        Self::percentage_of_token_in_lp()? < BuybackThreshold::<T>::get(),
        Error::<T>::BuybackRequired
      );

      let pool = PolPool::<T>::take();
      ensure!(pool > 0, Error::<T>::NothingToClaim);

      let treasury = Self::account_id();
      let half = pool / 2;
      let token_out = T::Dex::swap_exact_in(
        &treasury,
        AssetKind::Native,
        AssetKind::Local(token),
        half,
        min_amount_out,
      )
      .map_err(|_| Error::<T>::InsufficientOutput)?;
      let (native_added, token_added, lp_received) = T::Dex::add_liquidity(
        &treasury,
        AssetKind::Native,
        AssetKind::Local(token),
        pool - half,
        token_out,
      )?;

      log::debug!(
        target: LOG_TARGET,
        "funded LP: swapped {half}, added {native_added} native + {token_added} token",
      );

      Self::deposit_event(Event::LpFunded {
        native_swapped: half,
        native_added,
        token_added,
        lp_received,
      });
      Ok(())
    }

    /// Spend the whole POL pool buying back protocol token
    ///
    /// Only allowed once the pool owns at least the threshold share of the
    /// token supply; the bought token stays in the treasury.
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::buyback())]
    pub fn buyback(origin: OriginFor<T>, min_amount_out: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      ensure!(
        Self::percentage_of_token_in_lp()? >= BuybackThreshold::<T>::get(),
        Error::<T>::FundingRequired
      );

      let pool = PolPool::<T>::take();
      ensure!(pool > 0, Error::<T>::NothingToClaim);

      let received = T::Dex::swap_exact_in(
        &Self::account_id(),
        AssetKind::Native,
        AssetKind::Local(token),
        pool,
        min_amount_out,
      )
      .map_err(|_| Error::<T>::InsufficientOutput)?;

      Self::deposit_event(Event::BuybackExecuted {
        spent: pool,
        received,
      });
      Ok(())
    }

    /// Pay the accumulated commission out to a recipient
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::claim_commission())]
    pub fn claim_commission(origin: OriginFor<T>, recipient: T::AccountId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      let amount = CommissionsPool::<T>::take();
      ensure!(amount > 0, Error::<T>::NothingToClaim);
      T::Currency::transfer(
        &Self::account_id(),
        &recipient,
        amount,
        Preservation::Preserve,
      )?;

      Self::deposit_event(Event::CommissionClaimed { recipient, amount });
      Ok(())
    }

    /// Configure the protocol token
    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::set_token())]
    pub fn set_token(origin: OriginFor<T>, asset_id: u32) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      let old = TokenAsset::<T>::get();
      TokenAsset::<T>::put(asset_id);

      Self::deposit_event(Event::TokenSet { old, new: asset_id });
      Ok(())
    }

    /// Update the commission share
    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::set_commission())]
    pub fn set_commission(origin: OriginFor<T>, value: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(
        value <= params::MAX_COMMISSION,
        Error::<T>::CommissionTooHigh
      );

      let old = CommissionPercentage::<T>::get();
      CommissionPercentage::<T>::put(value);

      Self::deposit_event(Event::CommissionUpdated { old, new: value });
      Ok(())
    }

    /// Update the POL share
    #[pallet::call_index(10)]
    #[pallet::weight(T::WeightInfo::set_pol_percentage())]
    pub fn set_pol_percentage(origin: OriginFor<T>, value: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(
        (params::MIN_POL_SHARE..=params::MAX_POL_SHARE).contains(&value),
        Error::<T>::PolOutOfRange
      );

      let old = PolPercentage::<T>::get();
      PolPercentage::<T>::put(value);

      Self::deposit_event(Event::PolPercentageUpdated { old, new: value });
      Ok(())
    }

    /// Update the buyback threshold
    #[pallet::call_index(11)]
    #[pallet::weight(T::WeightInfo::set_buyback_threshold())]
    pub fn set_buyback_threshold(origin: OriginFor<T>, value: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(
        (params::MIN_BUYBACK_THRESHOLD..=params::MAX_BUYBACK_THRESHOLD).contains(&value),
        Error::<T>::ThresholdOutOfRange
      );

      let old = BuybackThreshold::<T>::get();
      BuybackThreshold::<T>::put(value);

      Self::deposit_event(Event::BuybackThresholdUpdated { old, new: value });
      Ok(())
    }

    /// Update the redistribution interval
    ///
    /// Takes effect on the next funding; the current stream keeps its rate.
    #[pallet::call_index(12)]
    #[pallet::weight(T::WeightInfo::set_redistribution_interval())]
    pub fn set_redistribution_interval(origin: OriginFor<T>, seconds: u64) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(
        (params::MIN_REDISTRIBUTION_INTERVAL..=params::MAX_REDISTRIBUTION_INTERVAL)
          .contains(&seconds),
        Error::<T>::IntervalOutOfRange
      );

      let old = RedistributionInterval::<T>::get();
      RedistributionInterval::<T>::put(seconds);

      Self::deposit_event(Event::RedistributionIntervalUpdated { old, new: seconds });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (holds pools, stakes and buybacks)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Share of the token's total issuance currently sitting in the
    /// native/token pool.
    pub fn percentage_of_token_in_lp() -> Result<Permill, Error<T>> {
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      let (_, token_reserve) =
        T::Dex::get_pool_reserves(AssetKind::Native, AssetKind::Local(token))
          .ok_or(Error::<T>::NotConfigured)?;
      let issuance = T::Assets::total_issuance(token);
      if issuance == 0 {
        return Ok(Permill::zero());
      }
      Ok(Permill::from_rational(token_reserve, issuance))
    }

    /// Current value of the accumulator, including unsettled elapsed time
    pub fn reward_per_token() -> Balance {
      let stored = RewardPerTokenStored::<T>::get();
      let total = TotalStaked::<T>::get();
      if total == 0 {
        return stored;
      }
      let elapsed = T::TimeProvider::now()
        .as_secs()
        .saturating_sub(LastUpdateTime::<T>::get());
      let accrued = U256::from(elapsed)
        .saturating_mul(U256::from(RewardRate::<T>::get()))
        .checked_div(U256::from(total))
        .unwrap_or_default();
      stored.saturating_add(Balance::try_from(accrued).unwrap_or(Balance::MAX))
    }

    /// Native a staker could claim right now
    pub fn earned(who: &T::AccountId) -> Balance {
      let staked = StakedBalances::<T>::get(who);
      let delta = Self::reward_per_token().saturating_sub(UserRewardPerTokenPaid::<T>::get(who));
      let gain = U256::from(staked)
        .saturating_mul(U256::from(delta))
        .checked_div(U256::from(params::PRECISION))
        .unwrap_or_default();
      Rewards::<T>::get(who).saturating_add(Balance::try_from(gain).unwrap_or(Balance::MAX))
    }

    /// Settle the accumulator to now, and optionally one account against it
    fn update_reward(who: Option<&T::AccountId>) {
      let reward_per_token = Self::reward_per_token();
      RewardPerTokenStored::<T>::put(reward_per_token);
      LastUpdateTime::<T>::put(T::TimeProvider::now().as_secs());
      if let Some(who) = who {
        Rewards::<T>::insert(who, Self::earned(who));
        UserRewardPerTokenPaid::<T>::insert(who, reward_per_token);
      }
    }

    fn unstake(who: &T::AccountId, amount: Balance) -> DispatchResult {
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      StakedBalances::<T>::try_mutate(who, |staked| {
        *staked = staked
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientStake)?;
        Ok::<_, Error<T>>(())
      })?;
      TotalStaked::<T>::mutate(|total| *total = total.saturating_sub(amount));
      T::Assets::transfer(
        token,
        &Self::account_id(),
        who,
        amount,
        Preservation::Preserve,
      )?;
      Ok(())
    }

    /// Take a settled reward, failing when nothing accrued.
    ///
    /// A claim never exceeds what the redistribution pool still holds, so a
    /// stream left running past its interval cannot drain the other pools.
    fn take_reward(who: &T::AccountId) -> Result<Balance, Error<T>> {
      let reward = Rewards::<T>::take(who).min(RedistributionPool::<T>::get());
      if reward == 0 {
        return Err(Error::<T>::NothingToClaim);
      }
      Self::settle_reward_pools(reward);
      Ok(reward)
    }

    fn settle_reward_pools(reward: Balance) {
      RedistributionPool::<T>::mutate(|pool| *pool = pool.saturating_sub(reward));
      Distributed::<T>::mutate(|total| *total = total.saturating_add(reward));
    }

    /// Pull native from `from`, split it into the pools and restart the
    /// reward stream over the configured interval.
    fn fund_pools(from: &T::AccountId, amount: Balance) -> DispatchResult {
      if amount > 0 {
        T::Currency::transfer(from, &Self::account_id(), amount, Preservation::Expendable)?;
      }

      let commission = CommissionPercentage::<T>::get().mul_floor(amount);
      let pol = PolPercentage::<T>::get().mul_floor(amount);
      let redistribution = amount.saturating_sub(commission).saturating_sub(pol);

      CommissionsPool::<T>::mutate(|pool| *pool = pool.saturating_add(commission));
      PolPool::<T>::mutate(|pool| *pool = pool.saturating_add(pol));

      // Settle at the old rate before the pool (and thus the rate) changes
      Self::update_reward(None);
      let pool = RedistributionPool::<T>::mutate(|pool| {
        *pool = pool.saturating_add(redistribution);
        *pool
      });
      let rate = U256::from(pool)
        .saturating_mul(U256::from(params::PRECISION))
        .checked_div(U256::from(RedistributionInterval::<T>::get()))
        .unwrap_or_default();
      RewardRate::<T>::put(Balance::try_from(rate).unwrap_or(Balance::MAX));

      Ok(())
    }

    fn process_payout(
      from: &T::AccountId,
      user: &T::AccountId,
      amount: Balance,
      tip: Balance,
      stake: bool,
    ) -> DispatchResult {
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      let quoted = T::Dex::get_quote(AssetKind::Native, AssetKind::Local(token), amount)
        .ok_or(Error::<T>::NotConfigured)?;

      Self::fund_pools(from, amount)?;

      let token_paid = quoted.saturating_add(params::RELAYER_TIP_SHARE.mul_floor(tip));
      if stake {
        Self::update_reward(Some(user));
        StakedBalances::<T>::mutate(user, |staked| *staked = staked.saturating_add(token_paid));
        TotalStaked::<T>::mutate(|total| *total = total.saturating_add(token_paid));
      } else if token_paid > 0 {
        T::Assets::transfer(
          token,
          &Self::account_id(),
          user,
          token_paid,
          Preservation::Preserve,
        )?;
      }

      let commission = CommissionPercentage::<T>::get().mul_floor(amount);
      let pol = PolPercentage::<T>::get().mul_floor(amount);
      Self::deposit_event(Event::PayoutProcessed {
        user: user.clone(),
        amount,
        commission,
        pol,
        redistribution: amount.saturating_sub(commission).saturating_sub(pol),
        token_paid,
        staked: stake,
      });
      Ok(())
    }
  }

  impl<T: Config> pallet_gas_tank::PayoutHandler<T::AccountId> for Pallet<T> {
    fn is_configured() -> bool {
      match TokenAsset::<T>::get() {
        Some(token) => {
          T::Dex::get_pool_reserves(AssetKind::Native, AssetKind::Local(token)).is_some()
        }
        None => false,
      }
    }

    fn quote(amount: Balance) -> Option<Balance> {
      let token = TokenAsset::<T>::get()?;
      T::Dex::get_quote(AssetKind::Native, AssetKind::Local(token), amount)
    }

    fn receive_tip(from: &T::AccountId, amount: Balance) -> Result<(), DispatchError> {
      let token = TokenAsset::<T>::get().ok_or(Error::<T>::NotConfigured)?;
      T::Assets::transfer(
        token,
        from,
        &Self::account_id(),
        amount,
        Preservation::Expendable,
      )?;
      Ok(())
    }

    fn request_payout(
      from: &T::AccountId,
      user: &T::AccountId,
      amount: Balance,
      tip: Balance,
    ) -> Result<(), DispatchError> {
      Self::process_payout(from, user, amount, tip, false)
    }

    fn stake_payout(
      from: &T::AccountId,
      user: &T::AccountId,
      amount: Balance,
      tip: Balance,
    ) -> Result<(), DispatchError> {
      Self::process_payout(from, user, amount, tip, true)
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
