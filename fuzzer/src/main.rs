use evm::backend::{MemoryAccount, MemoryState, Vicinity, WorldState};
use evm::executor::stack::StackExecutor;
use evm::{apply_message, Config, GasPool, Message};
use honggfuzz::fuzz;
use primitive_types::{H160, U256};
use std::collections::BTreeMap;

const GAS_LIMIT: u64 = 1_000_000;

fn handle_data(data: &[u8], config: &Config) {
	let contract = H160::repeat_byte(0x10);
	let caller = H160::repeat_byte(0xf0);

	let mut accounts = BTreeMap::new();
	accounts.insert(
		contract,
		MemoryAccount {
			code: data.to_vec(),
			..MemoryAccount::default()
		},
	);
	accounts.insert(
		caller,
		MemoryAccount {
			balance: U256::from(1_000_000_000u64),
			..MemoryAccount::default()
		},
	);

	let mut executor = StackExecutor::new(MemoryState::new(accounts), config, Vicinity::default());
	let mut pool = GasPool::new(GAS_LIMIT);
	let message = Message::call(caller, contract, U256::one(), 0, data.to_vec(), GAS_LIMIT);

	let result = apply_message(&mut executor, &message, &mut pool).unwrap();
	assert!(result.used_gas <= GAS_LIMIT);
	assert_eq!(pool.gas(), GAS_LIMIT - result.used_gas);
	assert_eq!(executor.state().nonce(caller), 1);
}

fn main() {
	// Nested frames recurse natively, keep them shallow enough for the
	// fuzzer's thread stack.
	let configs = [
		Config {
			call_stack_limit: 64,
			..Config::frontier()
		},
		Config {
			call_stack_limit: 64,
			..Config::homestead()
		},
	];
	loop {
		fuzz!(|data: &[u8]| {
			for config in &configs {
				handle_data(data, config);
			}
		});
	}
}
