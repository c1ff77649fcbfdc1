extern crate alloc;

use crate as pallet_script_engine;
use crate::adapters::{MarketAccountData, RateMode};
use polkadot_sdk::frame_support::traits::fungibles::{Inspect, Mutate, approvals};
use polkadot_sdk::frame_support::traits::tokens::{Fortitude, Precision, Preservation};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128, Currency as _, Get, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_core::{Pair as _, sr25519};
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup, IntegerSquareRoot},
};
use primitives::{AssetKind, ExecutorId, ScriptId};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub type AccountId = sr25519::Public;

pub const TOKEN_A: u32 = 1;
pub const TOKEN_B: u32 = 2;
pub const RECEIPT_A: u32 = 3;
pub const SHARE_LP: u32 = 4;
pub const CHAIN_ID: u64 = 42;

thread_local! {
    pub static NOW: RefCell<u64> = const { RefCell::new(1_000_000) };
    pub static POOLS: RefCell<BTreeMap<(AssetKind, AssetKind), (u128, u128)>> = const { RefCell::new(BTreeMap::new()) };
    pub static LP_TOKENS: RefCell<BTreeMap<(AssetKind, AssetKind), AssetKind>> = const { RefCell::new(BTreeMap::new()) };
    pub static NEXT_LP_ID: RefCell<u32> = const { RefCell::new(100) };
    pub static MARKET_ACCOUNTS: RefCell<BTreeMap<AccountId, MarketAccountData>> = const { RefCell::new(BTreeMap::new()) };
    pub static DEBTS: RefCell<BTreeMap<(AccountId, AssetKind), u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static BORROW_ALLOWANCES: RefCell<BTreeMap<(AccountId, AssetKind), u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static GAS_BALANCES: RefCell<BTreeMap<AccountId, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static TIP_BALANCES: RefCell<BTreeMap<AccountId, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static REWARDS: RefCell<Vec<(ExecutorId, ScriptId, u128, u128, AccountId, AccountId)>> = const { RefCell::new(Vec::new()) };
}

pub fn set_time(now: u64) {
  NOW.with(|n| *n.borrow_mut() = now);
}

pub fn advance_time(secs: u64) {
  NOW.with(|n| *n.borrow_mut() += secs);
}

pub fn set_pool(asset_a: AssetKind, asset_b: AssetKind, reserve_a: u128, reserve_b: u128) {
  let (key, reserves) = if asset_a < asset_b {
    ((asset_a, asset_b), (reserve_a, reserve_b))
  } else {
    ((asset_b, asset_a), (reserve_b, reserve_a))
  };
  POOLS.with(|p| p.borrow_mut().insert(key, reserves));
  LP_TOKENS.with(|lp| {
    if !lp.borrow().contains_key(&key) {
      let id = NEXT_LP_ID.with(|n| {
        let mut next = n.borrow_mut();
        let current = *next;
        *next += 1;
        current
      });
      let _ = Assets::force_create(frame_system::RawOrigin::Root.into(), id, alice(), true, 1);
      lp.borrow_mut().insert(key, AssetKind::Local(id));
    }
  });
}

pub fn lp_token_of(asset_a: AssetKind, asset_b: AssetKind) -> AssetKind {
  let key = if asset_a < asset_b {
    (asset_a, asset_b)
  } else {
    (asset_b, asset_a)
  };
  LP_TOKENS.with(|lp| *lp.borrow().get(&key).expect("pool not seeded"))
}

pub fn set_gas_balance(who: AccountId, amount: u128) {
  GAS_BALANCES.with(|g| g.borrow_mut().insert(who, amount));
}

pub fn set_tip_balance(who: AccountId, amount: u128) {
  TIP_BALANCES.with(|t| t.borrow_mut().insert(who, amount));
}

pub fn set_market_account(who: AccountId, data: MarketAccountData) {
  MARKET_ACCOUNTS.with(|m| m.borrow_mut().insert(who, data));
}

pub fn set_debt(who: AccountId, debt_token: AssetKind, amount: u128) {
  DEBTS.with(|d| d.borrow_mut().insert((who, debt_token), amount));
}

pub fn set_borrow_allowance(who: AccountId, debt_token: AssetKind, amount: u128) {
  BORROW_ALLOWANCES.with(|b| b.borrow_mut().insert((who, debt_token), amount));
}

pub fn recorded_rewards() -> Vec<(ExecutorId, ScriptId, u128, u128, AccountId, AccountId)> {
  REWARDS.with(|r| r.borrow().clone())
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    ScriptEngine: pallet_script_engine,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
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

pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> core::time::Duration {
    core::time::Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

pub struct MockAssets;
impl pallet_script_engine::AssetOps<AccountId> for MockAssets {
  fn balance(who: &AccountId, asset: AssetKind) -> u128 {
    match asset {
      AssetKind::Native => Balances::free_balance(who),
      AssetKind::Local(id) | AssetKind::Foreign(id) => Assets::balance(id, who),
    }
  }

  fn allowance(owner: &AccountId, spender: &AccountId, asset: AssetKind) -> u128 {
    match asset {
      AssetKind::Native => u128::MAX,
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as approvals::Inspect<AccountId>>::allowance(id, owner, spender)
      }
    }
  }

  fn transfer_from(
    spender: &AccountId,
    owner: &AccountId,
    to: &AccountId,
    asset: AssetKind,
    amount: u128,
  ) -> Result<(), DispatchError> {
    match asset {
      AssetKind::Native => {
        <Balances as polkadot_sdk::frame_support::traits::Currency<AccountId>>::transfer(
          owner,
          to,
          amount,
          polkadot_sdk::frame_support::traits::ExistenceRequirement::AllowDeath,
        )
      }
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as approvals::Mutate<AccountId>>::transfer_from(id, owner, spender, to, amount)
      }
    }
  }
}

fn pool_key(asset_a: AssetKind, asset_b: AssetKind) -> (AssetKind, AssetKind) {
  if asset_a < asset_b {
    (asset_a, asset_b)
  } else {
    (asset_b, asset_a)
  }
}

pub fn mock_burn(who: &AccountId, asset: AssetKind, amount: u128) -> Result<(), DispatchError> {
  match asset {
    AssetKind::Native => {
      let _ = <Balances as polkadot_sdk::frame_support::traits::Currency<AccountId>>::withdraw(
        who,
        amount,
        polkadot_sdk::frame_support::traits::WithdrawReasons::TRANSFER,
        polkadot_sdk::frame_support::traits::ExistenceRequirement::AllowDeath,
      )?;
      Ok(())
    }
    AssetKind::Local(id) | AssetKind::Foreign(id) => {
      <Assets as Mutate<AccountId>>::burn_from(
        id,
        who,
        amount,
        Preservation::Expendable,
        Precision::Exact,
        Fortitude::Polite,
      )?;
      Ok(())
    }
  }
}

pub fn mock_mint(who: &AccountId, asset: AssetKind, amount: u128) -> Result<(), DispatchError> {
  match asset {
    AssetKind::Native => {
      let _ = <Balances as polkadot_sdk::frame_support::traits::Currency<AccountId>>::deposit_creating(
        who, amount,
      );
      Ok(())
    }
    AssetKind::Local(id) | AssetKind::Foreign(id) => {
      <Assets as Mutate<AccountId>>::mint_into(id, who, amount)?;
      Ok(())
    }
  }
}

pub struct MockDex;
impl pallet_script_engine::DexOps<AccountId> for MockDex {
  fn get_quote(asset_in: AssetKind, asset_out: AssetKind, amount_in: u128) -> Option<u128> {
    let key = pool_key(asset_in, asset_out);
    let (mut reserve_in, mut reserve_out) = POOLS.with(|p| p.borrow().get(&key).cloned())?;
    if key.0 != asset_in {
      core::mem::swap(&mut reserve_in, &mut reserve_out);
    }
    if reserve_in == 0 {
      return None;
    }
    Some(amount_in.checked_mul(reserve_out)? / reserve_in)
  }

  fn get_pool_id(asset_a: AssetKind, asset_b: AssetKind) -> Option<AssetKind> {
    LP_TOKENS.with(|lp| lp.borrow().get(&pool_key(asset_a, asset_b)).cloned())
  }

  fn get_pool_reserves(asset_a: AssetKind, asset_b: AssetKind) -> Option<(u128, u128)> {
    let key = pool_key(asset_a, asset_b);
    let (reserve_1, reserve_2) = POOLS.with(|p| p.borrow().get(&key).cloned())?;
    if key.0 == asset_a {
      Some((reserve_1, reserve_2))
    } else {
      Some((reserve_2, reserve_1))
    }
  }

  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetKind,
    asset_out: AssetKind,
    amount_in: u128,
    min_out: u128,
  ) -> Result<u128, DispatchError> {
    let key = pool_key(asset_in, asset_out);
    let (mut reserve_in, mut reserve_out) = POOLS
      .with(|p| p.borrow().get(&key).cloned())
      .ok_or(DispatchError::Other("Pool not found"))?;
    if key.0 != asset_in {
      core::mem::swap(&mut reserve_in, &mut reserve_out);
    }

    // XYK: amount_out = (amount_in * reserve_out) / (reserve_in + amount_in)
    let amount_out = amount_in
      .checked_mul(reserve_out)
      .and_then(|v| v.checked_div(reserve_in.saturating_add(amount_in)))
      .ok_or(DispatchError::Arithmetic(
        polkadot_sdk::sp_runtime::ArithmeticError::Overflow,
      ))?;

    if amount_out < min_out {
      return Err(DispatchError::Other("Insufficient output amount"));
    }

    mock_burn(who, asset_in, amount_in)?;
    mock_mint(who, asset_out, amount_out)?;

    let (final_1, final_2) = if key.0 == asset_in {
      (reserve_in + amount_in, reserve_out - amount_out)
    } else {
      (reserve_out - amount_out, reserve_in + amount_in)
    };
    POOLS.with(|p| p.borrow_mut().insert(key, (final_1, final_2)));

    Ok(amount_out)
  }

  fn add_liquidity(
    who: &AccountId,
    asset_a: AssetKind,
    asset_b: AssetKind,
    amount_a: u128,
    amount_b: u128,
  ) -> Result<(u128, u128, u128), DispatchError> {
    let key = pool_key(asset_a, asset_b);
    let (amount_1, amount_2) = if key.0 == asset_a {
      (amount_a, amount_b)
    } else {
      (amount_b, amount_a)
    };

    let (reserve_1, reserve_2) = POOLS
      .with(|p| p.borrow().get(&key).cloned())
      .ok_or(DispatchError::Other("Pool not found"))?;
    let lp_token = LP_TOKENS
      .with(|lp| lp.borrow().get(&key).cloned())
      .ok_or(DispatchError::Other("LP token not found"))?;

    let (used_1, used_2, shares) = if reserve_1 == 0 && reserve_2 == 0 {
      let shares = (amount_1 * amount_2).integer_sqrt();
      (amount_1, amount_2, shares)
    } else {
      let amount_2_optimal = (amount_1 * reserve_2) / reserve_1;
      if amount_2_optimal <= amount_2 {
        let shares = (amount_1 * 1_000_000_000) / reserve_1;
        (amount_1, amount_2_optimal, shares)
      } else {
        let amount_1_optimal = (amount_2 * reserve_1) / reserve_2;
        let shares = (amount_2 * 1_000_000_000) / reserve_2;
        (amount_1_optimal, amount_2, shares)
      }
    };

    if shares == 0 {
      return Err(DispatchError::Other("Insufficient liquidity"));
    }

    mock_burn(who, key.0, used_1)?;
    mock_burn(who, key.1, used_2)?;
    mock_mint(who, lp_token, shares)?;

    POOLS.with(|p| {
      p.borrow_mut()
        .insert(key, (reserve_1 + used_1, reserve_2 + used_2))
    });

    Ok((used_1, used_2, shares))
  }

  fn remove_liquidity(
    who: &AccountId,
    asset_a: AssetKind,
    asset_b: AssetKind,
    lp_amount: u128,
  ) -> Result<(u128, u128), DispatchError> {
    let key = pool_key(asset_a, asset_b);
    let (reserve_1, reserve_2) = POOLS
      .with(|p| p.borrow().get(&key).cloned())
      .ok_or(DispatchError::Other("Pool not found"))?;
    let lp_token = LP_TOKENS
      .with(|lp| lp.borrow().get(&key).cloned())
      .ok_or(DispatchError::Other("LP token not found"))?;

    let total = match lp_token {
      AssetKind::Local(id) | AssetKind::Foreign(id) => Assets::total_issuance(id),
      AssetKind::Native => 0,
    };
    if total == 0 {
      return Err(DispatchError::Other("Empty pool"));
    }

    let out_1 = reserve_1 * lp_amount / total;
    let out_2 = reserve_2 * lp_amount / total;

    mock_burn(who, lp_token, lp_amount)?;
    mock_mint(who, key.0, out_1)?;
    mock_mint(who, key.1, out_2)?;

    POOLS.with(|p| {
      p.borrow_mut()
        .insert(key, (reserve_1 - out_1, reserve_2 - out_2))
    });

    if key.0 == asset_a {
      Ok((out_1, out_2))
    } else {
      Ok((out_2, out_1))
    }
  }
}

pub struct MockMoneyMarket;
impl pallet_script_engine::MoneyMarketOps<AccountId> for MockMoneyMarket {
  fn account_data(who: &AccountId) -> MarketAccountData {
    MARKET_ACCOUNTS.with(|m| {
      m.borrow().get(who).cloned().unwrap_or(MarketAccountData {
        collateral: 0,
        debt: 0,
        available_borrow: 0,
        health_factor: u128::MAX,
      })
    })
  }

  fn debt(who: &AccountId, debt_token: AssetKind, _rate_mode: RateMode) -> u128 {
    DEBTS.with(|d| d.borrow().get(&(*who, debt_token)).cloned().unwrap_or(0))
  }

  fn deposit(who: &AccountId, token: AssetKind, amount: u128) -> Result<(), DispatchError> {
    mock_burn(who, token, amount)?;
    mock_mint(who, AssetKind::Local(RECEIPT_A), amount)
  }

  fn withdraw(who: &AccountId, token: AssetKind, amount: u128) -> Result<(), DispatchError> {
    mock_burn(who, AssetKind::Local(RECEIPT_A), amount)?;
    mock_mint(who, token, amount)
  }

  fn borrow(
    who: &AccountId,
    token: AssetKind,
    amount: u128,
    _rate_mode: RateMode,
  ) -> Result<(), DispatchError> {
    mock_mint(who, token, amount)?;
    DEBTS.with(|d| {
      let mut debts = d.borrow_mut();
      let entry = debts.entry((*who, token)).or_insert(0);
      *entry += amount;
    });
    Ok(())
  }

  fn repay(
    who: &AccountId,
    token: AssetKind,
    amount: u128,
    _rate_mode: RateMode,
  ) -> Result<(), DispatchError> {
    mock_burn(who, token, amount)?;
    DEBTS.with(|d| {
      let mut debts = d.borrow_mut();
      let entry = debts.entry((*who, token)).or_insert(0);
      *entry = entry.saturating_sub(amount);
    });
    Ok(())
  }

  fn borrow_allowance(
    who: &AccountId,
    _delegate: &AccountId,
    debt_token: AssetKind,
    _rate_mode: RateMode,
  ) -> u128 {
    BORROW_ALLOWANCES.with(|b| b.borrow().get(&(*who, debt_token)).cloned().unwrap_or(0))
  }
}

pub struct MockVaults;
impl pallet_script_engine::VaultOps<AccountId> for MockVaults {
  fn deposit(
    who: &AccountId,
    lp_token: AssetKind,
    share_token: AssetKind,
    amount: u128,
  ) -> Result<(), DispatchError> {
    mock_burn(who, lp_token, amount)?;
    mock_mint(who, share_token, amount)
  }

  fn withdraw(
    who: &AccountId,
    lp_token: AssetKind,
    share_token: AssetKind,
    amount: u128,
  ) -> Result<(), DispatchError> {
    mock_burn(who, share_token, amount)?;
    mock_mint(who, lp_token, amount)
  }

  fn share_balance(who: &AccountId, share_token: AssetKind) -> u128 {
    match share_token {
      AssetKind::Native => 0,
      AssetKind::Local(id) | AssetKind::Foreign(id) => Assets::balance(id, who),
    }
  }
}

pub struct MockEscrow;
impl pallet_script_engine::RewardSink<AccountId> for MockEscrow {
  fn gas_balance(who: &AccountId) -> u128 {
    GAS_BALANCES.with(|g| g.borrow().get(who).cloned().unwrap_or(0))
  }

  fn tip_balance(who: &AccountId) -> u128 {
    TIP_BALANCES.with(|t| t.borrow().get(who).cloned().unwrap_or(0))
  }

  fn add_reward(
    executor: ExecutorId,
    script_id: ScriptId,
    reward: u128,
    tip: u128,
    payer: &AccountId,
    recipient: &AccountId,
  ) -> Result<(), DispatchError> {
    GAS_BALANCES.with(|g| -> Result<(), DispatchError> {
      let mut balances = g.borrow_mut();
      let balance = balances.entry(*payer).or_insert(0);
      *balance = balance
        .checked_sub(reward)
        .ok_or(DispatchError::Other("Insufficient gas"))?;
      Ok(())
    })?;
    TIP_BALANCES.with(|t| -> Result<(), DispatchError> {
      let mut balances = t.borrow_mut();
      let balance = balances.entry(*payer).or_insert(0);
      *balance = balance
        .checked_sub(tip)
        .ok_or(DispatchError::Other("Insufficient tip"))?;
      Ok(())
    })?;
    REWARDS.with(|r| {
      r.borrow_mut()
        .push((executor, script_id, reward, tip, *payer, *recipient))
    });
    Ok(())
  }
}

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::SCRIPT_ENGINE_PALLET_ID)
  }
}

impl pallet_script_engine::Config for Test {
  type Assets = MockAssets;
  type Dex = MockDex;
  type MoneyMarket = MockMoneyMarket;
  type Vaults = MockVaults;
  type Escrow = MockEscrow;
  type FollowSource = ScriptEngine;
  type TimeProvider = MockTime;
  type Public = sr25519::Public;
  type Signature = sr25519::Signature;
  type ChainId = ConstU64<CHAIN_ID>;
  type PalletId = PalletIdStub;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type WeightInfo = ();
}

/// Deterministic keypair for a named test user
pub fn keypair(name: &str) -> sr25519::Pair {
  sr25519::Pair::from_string(&format!("//{name}"), None).expect("static seed is valid")
}

pub fn alice() -> AccountId {
  keypair("Alice").public()
}

pub fn bob() -> AccountId {
  keypair("Bob").public()
}

pub fn relayer() -> AccountId {
  keypair("Relayer").public()
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![
      (TOKEN_A, alice(), true, 1),
      (TOKEN_B, alice(), true, 1),
      (RECEIPT_A, alice(), true, 1),
      (SHARE_LP, alice(), true, 1),
    ],
    metadata: alloc::vec![],
    accounts: alloc::vec![],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  NOW.with(|n| *n.borrow_mut() = 1_000_000);
  POOLS.with(|p| p.borrow_mut().clear());
  LP_TOKENS.with(|lp| lp.borrow_mut().clear());
  NEXT_LP_ID.with(|n| *n.borrow_mut() = 100);
  MARKET_ACCOUNTS.with(|m| m.borrow_mut().clear());
  DEBTS.with(|d| d.borrow_mut().clear());
  BORROW_ALLOWANCES.with(|b| b.borrow_mut().clear());
  GAS_BALANCES.with(|g| g.borrow_mut().clear());
  TIP_BALANCES.with(|t| t.borrow_mut().clear());
  REWARDS.with(|r| r.borrow_mut().clear());

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    // Native dust for approval deposits
    for who in [alice(), bob(), relayer()] {
      let _ = Balances::deposit_creating(&who, 1_000_000);
    }
  });
  ext
}
