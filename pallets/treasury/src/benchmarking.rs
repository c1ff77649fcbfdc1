extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::traits::fungible::Mutate as NativeMutate;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{Balance, params};

const POOL: Balance = 1_000_000_000;

fn fund_treasury<T: Config>() {
  T::Currency::mint_into(&Pallet::<T>::account_id(), 2 * POOL).expect("minting succeeds");
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn get_reward() {
    fund_treasury::<T>();
    let caller: T::AccountId = whitelisted_caller();
    T::Currency::mint_into(&caller, POOL).expect("minting succeeds");
    Rewards::<T>::insert(&caller, POOL / 2);
    RedistributionPool::<T>::put(POOL);

    #[extrinsic_call]
    get_reward(RawOrigin::Signed(caller.clone()));

    assert_eq!(Rewards::<T>::get(&caller), 0);
    assert_eq!(RedistributionPool::<T>::get(), POOL / 2);
  }

  #[benchmark]
  fn claim_commission() {
    fund_treasury::<T>();
    let recipient: T::AccountId = whitelisted_caller();
    T::Currency::mint_into(&recipient, POOL).expect("minting succeeds");
    CommissionsPool::<T>::put(POOL / 2);

    #[extrinsic_call]
    claim_commission(RawOrigin::Root, recipient);

    assert_eq!(CommissionsPool::<T>::get(), 0);
  }

  #[benchmark]
  fn set_token() {
    #[extrinsic_call]
    set_token(RawOrigin::Root, 1);

    assert_eq!(TokenAsset::<T>::get(), Some(1));
  }

  #[benchmark]
  fn set_commission() {
    let value = params::MAX_COMMISSION;

    #[extrinsic_call]
    set_commission(RawOrigin::Root, value);

    assert_eq!(CommissionPercentage::<T>::get(), value);
  }

  #[benchmark]
  fn set_pol_percentage() {
    let value = params::MIN_POL_SHARE;

    #[extrinsic_call]
    set_pol_percentage(RawOrigin::Root, value);

    assert_eq!(PolPercentage::<T>::get(), value);
  }

  #[benchmark]
  fn set_buyback_threshold() {
    let value = params::MAX_BUYBACK_THRESHOLD;

    #[extrinsic_call]
    set_buyback_threshold(RawOrigin::Root, value);

    assert_eq!(BuybackThreshold::<T>::get(), value);
  }

  #[benchmark]
  fn set_redistribution_interval() {
    let value = params::MIN_REDISTRIBUTION_INTERVAL;

    #[extrinsic_call]
    set_redistribution_interval(RawOrigin::Root, value);

    assert_eq!(RedistributionInterval::<T>::get(), value);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
