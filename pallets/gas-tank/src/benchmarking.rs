extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::traits::fungible::Mutate as NativeMutate;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{Balance, ExecutorId};

const SEED_BALANCE: Balance = 1_000_000_000_000;
const ESCROW: Balance = 1_000_000_000;

fn funded_caller<T: Config>() -> T::AccountId {
  let caller: T::AccountId = whitelisted_caller();
  T::Currency::mint_into(&caller, SEED_BALANCE).expect("minting succeeds");
  caller
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn deposit_gas() {
    let caller = funded_caller::<T>();

    #[extrinsic_call]
    deposit_gas(RawOrigin::Signed(caller.clone()), ESCROW);

    assert_eq!(GasBalances::<T>::get(&caller), ESCROW);
  }

  #[benchmark]
  fn withdraw_gas() {
    let caller = funded_caller::<T>();
    Pallet::<T>::deposit_gas(RawOrigin::Signed(caller.clone()).into(), ESCROW)
      .expect("deposit succeeds");

    #[extrinsic_call]
    withdraw_gas(RawOrigin::Signed(caller.clone()), ESCROW / 2);

    assert_eq!(GasBalances::<T>::get(&caller), ESCROW / 2);
  }

  #[benchmark]
  fn withdraw_all_gas() {
    let caller = funded_caller::<T>();
    Pallet::<T>::deposit_gas(RawOrigin::Signed(caller.clone()).into(), ESCROW)
      .expect("deposit succeeds");

    #[extrinsic_call]
    withdraw_all_gas(RawOrigin::Signed(caller.clone()));

    assert_eq!(GasBalances::<T>::get(&caller), 0);
  }

  #[benchmark]
  fn set_token() {
    #[extrinsic_call]
    set_token(RawOrigin::Root, 1);

    assert_eq!(TokenAsset::<T>::get(), Some(1));
  }

  #[benchmark]
  fn add_executor() {
    #[extrinsic_call]
    add_executor(RawOrigin::Root, ExecutorId::Transfer);

    assert!(AuthorizedExecutors::<T>::contains_key(ExecutorId::Transfer));
  }

  #[benchmark]
  fn remove_executor() {
    AuthorizedExecutors::<T>::insert(ExecutorId::Transfer, ());

    #[extrinsic_call]
    remove_executor(RawOrigin::Root, ExecutorId::Transfer);

    assert!(!AuthorizedExecutors::<T>::contains_key(ExecutorId::Transfer));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
