use evm::backend::{MemoryAccount, MemoryState, Vicinity, WorldState};
use evm::executor::stack::StackExecutor;
use evm::{
	apply_message, Config, CreateScheme, ExitError, ExitReason, ExitSucceed, GasPool, GasPoolError,
	Message, Opcode, TransitionError,
};
use primitive_types::{H160, H256, U256};
use std::collections::BTreeMap;

static HOMESTEAD: Config = Config::homestead();
static FRONTIER: Config = Config::frontier();

// PUSH10 <runtime code> PUSH1 0 MSTORE PUSH1 10 PUSH1 22 RETURN
const INIT_CODE: &str = "69602a60005260206000f3600052600a6016f3";
// PUSH1 42 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
const RUNTIME_CODE: &str = "602a60005260206000f3";

fn alice() -> H160 {
	H160::repeat_byte(0xa1)
}

fn bob() -> H160 {
	H160::repeat_byte(0xb0)
}

fn contract(byte: u8) -> H160 {
	H160::repeat_byte(byte)
}

fn code(hex_code: &str) -> Vec<u8> {
	hex::decode(hex_code).unwrap()
}

fn state(alice_balance: u64, contracts: &[(H160, &str)]) -> MemoryState {
	let mut accounts = BTreeMap::new();
	accounts.insert(
		alice(),
		MemoryAccount {
			balance: U256::from(alice_balance),
			..MemoryAccount::default()
		},
	);
	for (address, hex_code) in contracts {
		accounts.insert(
			*address,
			MemoryAccount {
				code: code(hex_code),
				..MemoryAccount::default()
			},
		);
	}
	MemoryState::new(accounts)
}

fn new_executor(state: MemoryState, config: &Config) -> StackExecutor<'_, MemoryState> {
	StackExecutor::new(state, config, Vicinity::default())
}

fn slot(n: u64) -> H256 {
	H256::from_low_u64_be(n)
}

/// `CALL` (or `DELEGATECALL` when `value` is `None`) of `target` with
/// 30000 gas, an empty input and a 32 byte output window at 0.
fn call_of(target: H160, value: Option<u8>) -> String {
	let mut hex_code = String::from("6020600060006000");
	if let Some(value) = value {
		hex_code.push_str(&format!("60{value:02x}"));
	}
	hex_code.push_str(&format!("73{}617530", hex::encode(target.as_bytes())));
	hex_code.push_str(if value.is_some() { "f1" } else { "f4" });
	hex_code
}

#[test]
fn value_transfer_to_fresh_recipient() {
	let mut executor = new_executor(state(100, &[]), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), bob(), U256::from(50), 0, Vec::new(), 21_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert!(result.return_value.is_empty());
	assert_eq!(result.reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(result.used_gas, 0);
	assert_eq!(pool.gas(), 1_000_000);

	let state = executor.state();
	assert_eq!(state.balance(alice()), U256::from(50));
	assert_eq!(state.balance(bob()), U256::from(50));
	assert_eq!(state.nonce(alice()), 1);
	assert_eq!(state.nonce(bob()), 0);
}

#[test]
fn insufficient_balance_is_rejected_without_effects() {
	let initial = state(10, &[]);
	let mut executor = new_executor(initial.clone(), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), bob(), U256::from(50), 0, Vec::new(), 21_000),
		&mut pool,
	);

	assert_eq!(
		result,
		Err(TransitionError::InsufficientBalance {
			address: alice(),
			value: U256::from(50),
		})
	);
	assert_eq!(executor.state().accounts(), initial.accounts());
	assert!(!executor.state().exists(bob()));
	assert_eq!(executor.state().nonce(alice()), 0);
	assert_eq!(pool.gas(), 1_000_000);
}

#[test]
fn insufficient_balance_for_creation_is_rejected() {
	let initial = state(10, &[]);
	let mut executor = new_executor(initial.clone(), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::create(alice(), U256::from(50), 0, code(INIT_CODE), 100_000),
		&mut pool,
	);

	assert!(matches!(
		result,
		Err(TransitionError::InsufficientBalance { .. })
	));
	assert_eq!(executor.state().accounts(), initial.accounts());
	assert_eq!(pool.gas(), 1_000_000);
}

#[test]
fn nonce_mismatch_is_rejected_without_effects() {
	let initial = state(100, &[]);
	let mut executor = new_executor(initial.clone(), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), bob(), U256::from(50), 1, Vec::new(), 21_000),
		&mut pool,
	);

	assert_eq!(
		result,
		Err(TransitionError::InvalidNonce {
			address: alice(),
			expected: 0,
			got: 1,
		})
	);
	assert_eq!(executor.state().accounts(), initial.accounts());
	assert_eq!(pool.gas(), 1_000_000);

	// The same message without the nonce check goes through.
	let message = Message::call(alice(), bob(), U256::from(50), 1, Vec::new(), 21_000).unchecked();
	let result = apply_message(&mut executor, &message, &mut pool).unwrap();
	assert!(!result.failed);
	assert_eq!(executor.state().nonce(alice()), 1);
}

#[test]
fn absent_sender_is_materialized() {
	let mut executor = new_executor(MemoryState::default(), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), bob(), U256::zero(), 0, Vec::new(), 21_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert!(executor.state().exists(alice()));
	assert!(executor.state().exists(bob()));
	assert_eq!(executor.state().nonce(alice()), 1);
}

#[test]
fn gas_pool_shortage_is_rejected() {
	let initial = state(100, &[]);
	let mut executor = new_executor(initial.clone(), &HOMESTEAD);
	let mut pool = GasPool::new(50_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), bob(), U256::one(), 0, Vec::new(), 100_000),
		&mut pool,
	);

	assert_eq!(
		result,
		Err(TransitionError::GasLimitReached(GasPoolError::LimitReached {
			available: 50_000,
			requested: 100_000,
		}))
	);
	assert_eq!(executor.state().accounts(), initial.accounts());
	assert_eq!(pool.gas(), 50_000);
}

#[test]
fn failed_call_consumes_nonce_and_gas() {
	let target = contract(0xc1);
	let mut executor = new_executor(state(100, &[(target, "fe")]), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::from(10), 0, Vec::new(), 50_000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(
		result.reason,
		ExitReason::Error(ExitError::InvalidCode(Opcode(0xfe)))
	);
	assert_eq!(result.used_gas, 50_000);
	assert_eq!(pool.gas(), 950_000);

	let state = executor.state();
	assert_eq!(state.nonce(alice()), 1);
	assert_eq!(state.balance(alice()), U256::from(100));
	assert_eq!(state.balance(target), U256::zero());
}

#[test]
fn read_only_creation_cannot_store() {
	let mut executor = new_executor(state(100, &[]), &HOMESTEAD);
	executor.set_static(true);
	let mut pool = GasPool::new(1_000_000);

	// PUSH1 1 PUSH1 0 SSTORE
	let result = apply_message(
		&mut executor,
		&Message::create(alice(), U256::zero(), 0, code("6001600055"), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(result.reason, ExitReason::Error(ExitError::WriteProtection));
	assert_eq!(result.created_address, None);
	assert_eq!(result.used_gas, 100_000);
	assert!(executor
		.state()
		.accounts()
		.values()
		.all(|account| account.storage.is_empty()));
}

#[test]
fn replaying_a_message_is_deterministic() {
	let target = contract(0xc1);
	// PUSH1 42 PUSH1 0 SSTORE STOP
	let initial = state(100, &[(target, "602a60005500")]);
	let message = Message::call(alice(), target, U256::from(7), 0, Vec::new(), 100_000);

	let mut first = new_executor(initial.clone(), &HOMESTEAD);
	let mut first_pool = GasPool::new(1_000_000);
	let first_result = apply_message(&mut first, &message, &mut first_pool);

	let mut second = new_executor(initial, &HOMESTEAD);
	let mut second_pool = GasPool::new(1_000_000);
	let second_result = apply_message(&mut second, &message, &mut second_pool);

	assert_eq!(first_result, second_result);
	assert_eq!(first.state().accounts(), second.state().accounts());
	assert_eq!(first_pool, second_pool);

	let result = first_result.unwrap();
	assert_eq!(result.used_gas, 20_006);
	assert_eq!(first.state().storage(target, slot(0)), slot(42));
}

#[test]
fn creation_deploys_returned_code() {
	let mut executor = new_executor(state(100, &[]), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);
	let expected = executor.create_address(CreateScheme::Legacy { caller: alice() });

	let result = apply_message(
		&mut executor,
		&Message::create(alice(), U256::from(5), 0, code(INIT_CODE), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(result.created_address, Some(expected));
	assert_eq!(result.return_value, code(RUNTIME_CODE));
	assert_eq!(result.used_gas, 18 + 10 * 200);
	assert_eq!(executor.state().code(expected), code(RUNTIME_CODE));
	assert_eq!(executor.state().balance(expected), U256::from(5));
	assert_eq!(executor.state().nonce(alice()), 1);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), expected, U256::zero(), 1, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();
	assert!(!result.failed);
	assert_eq!(result.return_value, slot(42).as_bytes().to_vec());
	assert_eq!(executor.state().nonce(alice()), 2);
}

#[test]
fn homestead_fails_creation_without_deposit_gas() {
	let mut executor = new_executor(state(100, &[]), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);
	let address = executor.create_address(CreateScheme::Legacy { caller: alice() });

	let result = apply_message(
		&mut executor,
		&Message::create(alice(), U256::zero(), 0, code(INIT_CODE), 1000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(result.reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(result.created_address, None);
	assert_eq!(result.used_gas, 1000);
	assert!(!executor.state().exists(address));
	assert_eq!(executor.state().nonce(alice()), 1);
}

#[test]
fn frontier_keeps_account_without_deposit_gas() {
	let mut executor = new_executor(state(100, &[]), &FRONTIER);
	let mut pool = GasPool::new(1_000_000);
	let address = executor.create_address(CreateScheme::Legacy { caller: alice() });

	let result = apply_message(
		&mut executor,
		&Message::create(alice(), U256::zero(), 0, code(INIT_CODE), 1000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(result.reason, ExitReason::Error(ExitError::CodeStoreOutOfGas));
	assert_eq!(result.created_address, Some(address));
	assert!(result.return_value.is_empty());
	assert_eq!(result.used_gas, 18);
	assert_eq!(pool.gas(), 1_000_000 - 18);
	assert!(executor.state().exists(address));
	assert!(executor.state().code(address).is_empty());
	assert_eq!(executor.state().nonce(alice()), 1);
}

#[test]
fn frontier_nested_create_without_deposit_gas_pushes_address() {
	let factory = contract(0xf1);
	// PUSH19 <init code> PUSH1 0 MSTORE; CREATE(0, 13, 19);
	// PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
	let factory_code =
		String::from("72") + INIT_CODE + "600052" + "6013600d6000f0" + "600052" + "60206000f3";
	let mut executor = new_executor(state(100, &[(factory, factory_code.as_str())]), &FRONTIER);
	let mut pool = GasPool::new(1_000_000);
	let address = executor.create_address(CreateScheme::Legacy { caller: factory });

	// 32021 gas reaches CREATE, which leaves too little for the deposit.
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), factory, U256::zero(), 0, Vec::new(), 34_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(result.return_value, H256::from(address).as_bytes().to_vec());
	assert!(executor.state().exists(address));
	assert!(executor.state().code(address).is_empty());
	assert_eq!(executor.state().nonce(factory), 1);
}

#[test]
fn failing_nested_call_does_not_stop_the_caller() {
	let caller = contract(0xc1);
	let failing = contract(0xc2);
	// CALL failing; PUSH1 0 SSTORE; PUSH1 1 PUSH1 1 SSTORE; STOP
	let caller_code = call_of(failing, Some(0)) + "600055" + "600160015500";
	let mut executor = new_executor(
		state(100, &[(caller, caller_code.as_str()), (failing, "fe")]),
		&HOMESTEAD,
	);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), caller, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(executor.state().storage(caller, slot(0)), H256::zero());
	assert_eq!(executor.state().storage(caller, slot(1)), slot(1));
}

#[test]
fn nested_call_returns_data() {
	let caller = contract(0xc1);
	let callee = contract(0xc2);
	// CALL callee; POP; PUSH1 0 MLOAD; PUSH1 0 SSTORE; STOP
	let caller_code = call_of(callee, Some(0)) + "50" + "600051" + "60005500";
	let mut executor = new_executor(
		state(100, &[(caller, caller_code.as_str()), (callee, RUNTIME_CODE)]),
		&HOMESTEAD,
	);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), caller, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(executor.state().storage(caller, slot(0)), slot(42));
}

#[test]
fn delegate_call_runs_in_callers_storage() {
	let caller = contract(0xc1);
	let library = contract(0xc2);
	// DELEGATECALL library; STOP
	let caller_code = call_of(library, None) + "00";
	// PUSH1 7 PUSH1 0 SSTORE STOP
	let contracts = [(caller, caller_code.as_str()), (library, "600760005500")];

	let mut executor = new_executor(state(100, &contracts), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), caller, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(executor.state().storage(caller, slot(0)), slot(7));
	assert_eq!(executor.state().storage(library, slot(0)), H256::zero());

	let mut executor = new_executor(state(100, &contracts), &FRONTIER);
	let mut pool = GasPool::new(1_000_000);
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), caller, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(
		result.reason,
		ExitReason::Error(ExitError::InvalidCode(Opcode::DELEGATECALL))
	);
	assert_eq!(executor.state().storage(caller, slot(0)), H256::zero());
}

#[test]
fn storage_clear_refund_is_capped() {
	let target = contract(0xc1);
	// PUSH1 0 PUSH1 0 SSTORE STOP
	let mut initial = state(100, &[(target, "600060005500")]);
	initial.set_storage(target, slot(0), slot(1));
	initial.finalize();

	let mut executor = new_executor(initial, &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	// 5006 used, 15000 refunded, at most half of the used gas comes back.
	assert_eq!(result.used_gas, 2503);
	assert_eq!(pool.gas(), 1_000_000 - 2503);
	assert_eq!(executor.state().storage(target, slot(0)), H256::zero());
}

#[test]
fn self_jump_runs_out_of_gas() {
	let target = contract(0xc1);
	// JUMPDEST PUSH1 0 JUMP
	let mut executor = new_executor(state(100, &[(target, "5b600056")]), &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::zero(), 0, Vec::new(), 30_000),
		&mut pool,
	)
	.unwrap();

	assert!(result.failed);
	assert_eq!(result.reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(result.used_gas, 30_000);
}

#[test]
fn recursion_stops_at_call_stack_limit() {
	let config = Config {
		call_stack_limit: 3,
		..Config::homestead()
	};
	let target = contract(0xc1);
	// Count the frame in slot 0, then call self with all but 4096 gas.
	let recursive = String::from("600054600101600055")
		+ "60006000600060006000"
		+ "73"
		+ &hex::encode(target.as_bytes())
		+ "5a6110009003f100";

	let mut executor = new_executor(state(100, &[(target, recursive.as_str())]), &config);
	let mut pool = GasPool::new(10_000_000);
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::zero(), 0, Vec::new(), 1_000_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(executor.state().storage(target, slot(0)), slot(4));
}

#[test]
fn logs_are_collected_and_reverted() {
	let target = contract(0xc1);
	let failing = contract(0xc2);
	// PUSH1 0 PUSH1 0 LOG0 STOP
	let logging = "60006000a000";
	// LOG0, then an invalid opcode
	let failing_code = "60006000a0fe";
	let mut executor = new_executor(
		state(100, &[(target, logging), (failing, failing_code)]),
		&HOMESTEAD,
	);
	let mut pool = GasPool::new(1_000_000);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::zero(), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();
	assert!(!result.failed);
	assert_eq!(executor.state().logs().len(), 1);
	assert_eq!(executor.state().logs()[0].address, target);

	let result = apply_message(
		&mut executor,
		&Message::call(alice(), failing, U256::zero(), 1, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();
	assert!(result.failed);
	assert_eq!(executor.state().logs().len(), 1);
}

#[test]
fn self_destruct_sends_balance_and_removes_account() {
	let target = contract(0xc1);
	// PUSH20 bob SELFDESTRUCT
	let destructing = format!("73{}ff", hex::encode(bob().as_bytes()));
	let mut initial = state(100, &[(target, destructing.as_str())]);
	initial.add_balance(target, U256::from(40));
	initial.finalize();

	let mut executor = new_executor(initial, &HOMESTEAD);
	let mut pool = GasPool::new(1_000_000);
	let result = apply_message(
		&mut executor,
		&Message::call(alice(), target, U256::from(2), 0, Vec::new(), 100_000),
		&mut pool,
	)
	.unwrap();

	assert!(!result.failed);
	assert_eq!(result.reason, ExitReason::Succeed(ExitSucceed::Suicided));
	assert!(!executor.state().exists(target));
	assert_eq!(executor.state().balance(bob()), U256::from(42));
	assert_eq!(executor.state().balance(alice()), U256::from(98));
}
