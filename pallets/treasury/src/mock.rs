extern crate alloc;

use crate as pallet_protocol_treasury;
use pallet_script_engine::DexOps;
use polkadot_sdk::frame_support::traits::fungibles::Mutate;
use polkadot_sdk::frame_support::traits::tokens::Preservation;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU128, Get, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{BuildStorage, DispatchError};
use primitives::{AssetKind, Balance};
use std::cell::RefCell;

pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const TANK_ACCOUNT: AccountId = 800;
pub const DEX_ACCOUNT: AccountId = 850;

pub const TOKEN: u32 = 5;

/// Seeded native/token pool: spot quote is 2 token per native
pub const POOL_NATIVE: Balance = 1_000_000_000;
pub const POOL_TOKEN: Balance = 2_000_000_000;

thread_local! {
    pub static NOW: RefCell<u64> = const { RefCell::new(1_000_000) };
    pub static POOL: RefCell<Option<(Balance, Balance)>> = const { RefCell::new(None) };
}

pub fn set_time(now: u64) {
  NOW.with(|n| *n.borrow_mut() = now);
}

pub fn advance_time(secs: u64) {
  NOW.with(|n| *n.borrow_mut() += secs);
}

pub fn set_pool(native: Balance, token: Balance) {
  POOL.with(|p| *p.borrow_mut() = Some((native, token)));
}

pub fn pool_reserves() -> Option<(Balance, Balance)> {
  POOL.with(|p| *p.borrow())
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    Treasury: pallet_protocol_treasury,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

/// Constant-product AMM over a single native/token pool.
///
/// Reserves live in a thread local; the matching funds sit on `DEX_ACCOUNT`
/// so issuance-based checks see them.
pub struct MockDex;

impl MockDex {
  fn is_native_token_pair(asset_in: AssetKind, asset_out: AssetKind) -> Option<bool> {
    match (asset_in, asset_out) {
      (AssetKind::Native, AssetKind::Local(TOKEN)) => Some(true),
      (AssetKind::Local(TOKEN), AssetKind::Native) => Some(false),
      _ => None,
    }
  }
}

impl DexOps<AccountId> for MockDex {
  fn get_quote(asset_in: AssetKind, asset_out: AssetKind, amount_in: Balance) -> Option<Balance> {
    let native_in = Self::is_native_token_pair(asset_in, asset_out)?;
    let (native, token) = pool_reserves()?;
    let (reserve_in, reserve_out) = if native_in { (native, token) } else { (token, native) };
    if reserve_in == 0 {
      return None;
    }
    Some(amount_in * reserve_out / reserve_in)
  }

  fn get_pool_id(asset_a: AssetKind, asset_b: AssetKind) -> Option<AssetKind> {
    Self::is_native_token_pair(asset_a, asset_b)?;
    pool_reserves()?;
    Some(AssetKind::Local(u32::MAX))
  }

  fn get_pool_reserves(asset_a: AssetKind, asset_b: AssetKind) -> Option<(Balance, Balance)> {
    let a_is_native = Self::is_native_token_pair(asset_a, asset_b)?;
    let (native, token) = pool_reserves()?;
    if a_is_native {
      Some((native, token))
    } else {
      Some((token, native))
    }
  }

  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetKind,
    asset_out: AssetKind,
    amount_in: Balance,
    min_out: Balance,
  ) -> Result<Balance, DispatchError> {
    let native_in = Self::is_native_token_pair(asset_in, asset_out)
      .ok_or(DispatchError::Other("unknown pair"))?;
    let (native, token) = pool_reserves().ok_or(DispatchError::Other("no pool"))?;
    let (reserve_in, reserve_out) = if native_in { (native, token) } else { (token, native) };
    let out = reserve_out * amount_in / (reserve_in + amount_in);
    if out < min_out {
      return Err(DispatchError::Other("slippage"));
    }
    if native_in {
      <Balances as polkadot_sdk::frame_support::traits::fungible::Mutate<AccountId>>::transfer(
        who,
        &DEX_ACCOUNT,
        amount_in,
        Preservation::Expendable,
      )?;
      <Assets as Mutate<AccountId>>::transfer(
        TOKEN,
        &DEX_ACCOUNT,
        who,
        out,
        Preservation::Expendable,
      )?;
      set_pool(native + amount_in, token - out);
    } else {
      <Assets as Mutate<AccountId>>::transfer(
        TOKEN,
        who,
        &DEX_ACCOUNT,
        amount_in,
        Preservation::Expendable,
      )?;
      <Balances as polkadot_sdk::frame_support::traits::fungible::Mutate<AccountId>>::transfer(
        &DEX_ACCOUNT,
        who,
        out,
        Preservation::Expendable,
      )?;
      set_pool(native - out, token + amount_in);
    }
    Ok(out)
  }

  fn add_liquidity(
    who: &AccountId,
    asset_a: AssetKind,
    asset_b: AssetKind,
    amount_a: Balance,
    amount_b: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError> {
    let a_is_native = Self::is_native_token_pair(asset_a, asset_b)
      .ok_or(DispatchError::Other("unknown pair"))?;
    let (native_in, token_in) = if a_is_native {
      (amount_a, amount_b)
    } else {
      (amount_b, amount_a)
    };
    let (native, token) = pool_reserves().ok_or(DispatchError::Other("no pool"))?;
    <Balances as polkadot_sdk::frame_support::traits::fungible::Mutate<AccountId>>::transfer(
      who,
      &DEX_ACCOUNT,
      native_in,
      Preservation::Expendable,
    )?;
    <Assets as Mutate<AccountId>>::transfer(
      TOKEN,
      who,
      &DEX_ACCOUNT,
      token_in,
      Preservation::Expendable,
    )?;
    set_pool(native + native_in, token + token_in);
    Ok((amount_a, amount_b, native_in))
  }

  fn remove_liquidity(
    _who: &AccountId,
    _asset_a: AssetKind,
    _asset_b: AssetKind,
    _lp_amount: Balance,
  ) -> Result<(Balance, Balance), DispatchError> {
    Err(DispatchError::Other("not supported in mock"))
  }
}

pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> core::time::Duration {
    core::time::Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::TREASURY_PALLET_ID)
  }
}

impl pallet_protocol_treasury::Config for Test {
  type Currency = Balances;
  type Assets = Assets;
  type Dex = MockDex;
  type TimeProvider = MockTime;
  type PalletId = PalletIdStub;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type WeightInfo = ();
}

pub fn mint_token(who: &AccountId, amount: Balance) -> Result<(), DispatchError> {
  <Assets as Mutate<AccountId>>::mint_into(TOKEN, who, amount)?;
  Ok(())
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![(TOKEN, ALICE, true, 1)],
    metadata: alloc::vec![],
    accounts: alloc::vec![
      (TOKEN, ALICE, 1_000_000_000),
      (TOKEN, BOB, 1_000_000_000),
      (TOKEN, TANK_ACCOUNT, 1_000_000_000),
      (TOKEN, DEX_ACCOUNT, POOL_TOKEN),
    ],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  NOW.with(|n| *n.borrow_mut() = 1_000_000);
  POOL.with(|p| *p.borrow_mut() = Some((POOL_NATIVE, POOL_TOKEN)));

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    for (who, amount) in [
      (ALICE, 1_000_000_000u128),
      (BOB, 1_000_000_000),
      (CHARLIE, 1_000),
      (TANK_ACCOUNT, 1_000_000_000),
      (DEX_ACCOUNT, POOL_NATIVE),
      (Treasury::account_id(), 1),
    ] {
      let _ = <Balances as polkadot_sdk::frame_support::traits::Currency<AccountId>>::deposit_creating(&who, amount);
    }
    let _ = mint_token(&Treasury::account_id(), 10_000_000_000);
  });
  ext
}
