//! Linear Vesting Pallet
//!
//! Time-based vesting of pallet-assets tokens against one global schedule.
//! An admin configures `(start, duration)` and registers per-token,
//! per-beneficiary allocations before the start; the allocation set is
//! frozen the moment vesting begins. Beneficiaries pull their accrued
//! share with `release`, which transfers only what has newly vested since
//! their last claim.
//!
//! The pallet account is funded out of band; allocations are bookkeeping
//! entries, not escrowed balances.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod weights;
pub use weights::WeightInfo;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::linear-vesting";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use frame::prelude::*;
  use polkadot_sdk::frame_support::{
    PalletId,
    traits::{
      EnsureOrigin, UnixTime,
      fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
      tokens::Preservation,
    },
  };
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::traits::AccountIdConversion;
  use primitives::Balance;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Fungible tokens being vested
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// Unix time source driving the vesting curve
    type TimeProvider: UnixTime;

    /// The pallet ID holding the tokens being vested
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Origin allowed to configure the schedule and its beneficiaries
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  /// One beneficiary's allocation of a token.
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
    PartialEq,
    TypeInfo,
  )]
  pub struct VestingSchedule {
    /// Total allocation released over the full duration
    pub total: Balance,
    /// Amount already claimed
    pub released: Balance,
  }

  /// Unix time at which vesting begins
  #[pallet::storage]
  pub type Start<T: Config> = StorageValue<_, u64, OptionQuery>;

  /// Seconds over which allocations vest linearly
  #[pallet::storage]
  pub type Duration<T: Config> = StorageValue<_, u64, ValueQuery>;

  /// Allocations by token and beneficiary
  #[pallet::storage]
  pub type Schedules<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    u32,
    Blake2_128Concat,
    T::AccountId,
    VestingSchedule,
    OptionQuery,
  >;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// The global schedule was configured
    ScheduleConfigured { start: u64, duration: u64 },
    /// An allocation was registered
    BeneficiaryAdded {
      token: u32,
      beneficiary: T::AccountId,
      amount: Balance,
    },
    /// An allocation was removed before the start
    BeneficiaryRemoved { token: u32, beneficiary: T::AccountId },
    /// Vested tokens were claimed
    Released {
      token: u32,
      beneficiary: T::AccountId,
      amount: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// No global schedule configured yet
    NotConfigured,
    /// Vesting has begun; the schedule is immutable
    AlreadyStarted,
    /// Duration must be greater than zero
    InvalidDuration,
    /// Allocation amount must be greater than zero
    ZeroAmount,
    /// The beneficiary already holds an allocation for this token
    ScheduleExists,
    /// No allocation for this token and beneficiary
    NoSchedule,
    /// Nothing has vested since the last claim
    NothingToRelease,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Configure the global vesting window
    ///
    /// May be called again as long as the previously configured start has
    /// not been reached.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::configure())]
    pub fn configure(origin: OriginFor<T>, start: u64, duration: u64) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(duration > 0, Error::<T>::InvalidDuration);
      ensure!(!Self::has_started(), Error::<T>::AlreadyStarted);

      Start::<T>::put(start);
      Duration::<T>::put(duration);

      Self::deposit_event(Event::ScheduleConfigured { start, duration });
      Ok(())
    }

    /// Register an allocation for a beneficiary
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::add_beneficiary())]
    pub fn add_beneficiary(
      origin: OriginFor<T>,
      token: u32,
      beneficiary: T::AccountId,
      amount: Balance,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(amount > 0, Error::<T>::ZeroAmount);
      ensure!(Start::<T>::get().is_some(), Error::<T>::NotConfigured);
      ensure!(!Self::has_started(), Error::<T>::AlreadyStarted);
      ensure!(
        !Schedules::<T>::contains_key(token, &beneficiary),
        Error::<T>::ScheduleExists
      );

      Schedules::<T>::insert(
        token,
        &beneficiary,
        VestingSchedule {
          total: amount,
          released: 0,
        },
      );

      Self::deposit_event(Event::BeneficiaryAdded {
        token,
        beneficiary,
        amount,
      });
      Ok(())
    }

    /// Remove an allocation before vesting starts
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::remove_beneficiary())]
    pub fn remove_beneficiary(
      origin: OriginFor<T>,
      token: u32,
      beneficiary: T::AccountId,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(!Self::has_started(), Error::<T>::AlreadyStarted);
      ensure!(
        Schedules::<T>::contains_key(token, &beneficiary),
        Error::<T>::NoSchedule
      );

      Schedules::<T>::remove(token, &beneficiary);

      Self::deposit_event(Event::BeneficiaryRemoved { token, beneficiary });
      Ok(())
    }

    /// Claim tokens vested since the last claim
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::release())]
    pub fn release(origin: OriginFor<T>, token: u32) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let schedule = Schedules::<T>::get(token, &who).ok_or(Error::<T>::NoSchedule)?;

      let vested = Self::vested_amount(token, &who);
      let releasable = vested.saturating_sub(schedule.released);
      ensure!(releasable > 0, Error::<T>::NothingToRelease);

      Schedules::<T>::insert(
        token,
        &who,
        VestingSchedule {
          total: schedule.total,
          released: schedule.released.saturating_add(releasable),
        },
      );
      T::Assets::transfer(
        token,
        &Self::account_id(),
        &who,
        releasable,
        Preservation::Expendable,
      )?;

      log::debug!(
        target: LOG_TARGET,
        "released {releasable} of token {token}",
      );

      Self::deposit_event(Event::Released {
        token,
        beneficiary: who,
        amount: releasable,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (holds the tokens being vested)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    fn has_started() -> bool {
      match Start::<T>::get() {
        Some(start) => T::TimeProvider::now().as_secs() >= start,
        None => false,
      }
    }

    /// Amount vested so far: 0 before the start, linear in elapsed time
    /// until `start + duration`, the full allocation after.
    pub fn vested_amount(token: u32, beneficiary: &T::AccountId) -> Balance {
      let Some(schedule) = Schedules::<T>::get(token, beneficiary) else {
        return 0;
      };
      let Some(start) = Start::<T>::get() else {
        return 0;
      };
      let now = T::TimeProvider::now().as_secs();
      if now < start {
        return 0;
      }
      let duration = Duration::<T>::get();
      let elapsed = now - start;
      if elapsed >= duration {
        return schedule.total;
      }
      let vested = U256::from(schedule.total)
        .saturating_mul(U256::from(elapsed))
        .checked_div(U256::from(duration))
        .unwrap_or_default();
      Balance::try_from(vested).unwrap_or(Balance::MAX)
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
