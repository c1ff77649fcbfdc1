#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn deposit_gas() -> Weight;
	fn withdraw_gas() -> Weight;
	fn withdraw_all_gas() -> Weight;
	fn deposit_tip() -> Weight;
	fn withdraw_tip() -> Weight;
	fn withdraw_all_tip() -> Weight;
	fn claim_reward() -> Weight;
	fn claim_and_stake_reward() -> Weight;
	fn set_token() -> Weight;
	fn add_executor() -> Weight;
	fn remove_executor() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn deposit_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn withdraw_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn withdraw_all_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn deposit_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn withdraw_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn withdraw_all_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn claim_reward() -> Weight {
		Weight::from_parts(120_000_000, 6000)
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(6))
	}
	fn claim_and_stake_reward() -> Weight {
		Weight::from_parts(140_000_000, 6500)
			.saturating_add(T::DbWeight::get().reads(9))
			.saturating_add(T::DbWeight::get().writes(7))
	}
	fn set_token() -> Weight {
		Weight::from_parts(15_000_000, 1000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn add_executor() -> Weight {
		Weight::from_parts(15_000_000, 1000)
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn remove_executor() -> Weight {
		Weight::from_parts(15_000_000, 1000)
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

impl WeightInfo for () {
	fn deposit_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
	}
	fn withdraw_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
	}
	fn withdraw_all_gas() -> Weight {
		Weight::from_parts(40_000_000, 3500)
	}
	fn deposit_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
	}
	fn withdraw_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
	}
	fn withdraw_all_tip() -> Weight {
		Weight::from_parts(45_000_000, 4000)
	}
	fn claim_reward() -> Weight {
		Weight::from_parts(120_000_000, 6000)
	}
	fn claim_and_stake_reward() -> Weight {
		Weight::from_parts(140_000_000, 6500)
	}
	fn set_token() -> Weight {
		Weight::from_parts(15_000_000, 1000)
	}
	fn add_executor() -> Weight {
		Weight::from_parts(15_000_000, 1000)
	}
	fn remove_executor() -> Weight {
		Weight::from_parts(15_000_000, 1000)
	}
}
