extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::Balance;

// Far enough out that benchmark environments are always before the start
const START: u64 = 10_000_000_000;
const DURATION: u64 = 1_000_000;
const ALLOCATION: Balance = 1_000_000_000;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn configure() {
    #[extrinsic_call]
    configure(RawOrigin::Root, START, DURATION);

    assert_eq!(Start::<T>::get(), Some(START));
    assert_eq!(Duration::<T>::get(), DURATION);
  }

  #[benchmark]
  fn add_beneficiary() {
    let beneficiary: T::AccountId = whitelisted_caller();
    Pallet::<T>::configure(RawOrigin::Root.into(), START, DURATION).expect("configure succeeds");

    #[extrinsic_call]
    add_beneficiary(RawOrigin::Root, 1, beneficiary.clone(), ALLOCATION);

    assert!(Schedules::<T>::contains_key(1, &beneficiary));
  }

  #[benchmark]
  fn remove_beneficiary() {
    let beneficiary: T::AccountId = whitelisted_caller();
    Pallet::<T>::configure(RawOrigin::Root.into(), START, DURATION).expect("configure succeeds");
    Pallet::<T>::add_beneficiary(RawOrigin::Root.into(), 1, beneficiary.clone(), ALLOCATION)
      .expect("add succeeds");

    #[extrinsic_call]
    remove_beneficiary(RawOrigin::Root, 1, beneficiary.clone());

    assert!(!Schedules::<T>::contains_key(1, &beneficiary));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
