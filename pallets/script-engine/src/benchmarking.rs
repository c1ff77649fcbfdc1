extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::ExecutorId;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn revoke() {
    let caller: T::AccountId = whitelisted_caller();
    let script_id = [7u8; 32];

    #[extrinsic_call]
    revoke(RawOrigin::Signed(caller.clone()), ExecutorId::Transfer, script_id);

    assert!(ScriptStates::<T>::get((ExecutorId::Transfer, caller, script_id)).revoked);
  }

  #[benchmark]
  fn set_gas_price() {
    let new_price: u128 = 2_000_000_000;

    #[extrinsic_call]
    set_gas_price(RawOrigin::Root, new_price);

    assert_eq!(GasPrice::<T>::get(), new_price);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
