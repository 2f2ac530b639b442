use primitive_types::{H160, U256};

/// Create scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// Legacy create scheme of `CREATE`: the address is derived from the
	/// caller and its nonce.
	Legacy {
		/// Caller of the create.
		caller: H160,
	},
}

/// Call scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
}

/// Context of the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
	/// Execution address, the owner of the storage being touched.
	pub address: H160,
	/// Caller of the EVM.
	pub caller: H160,
	/// Apparent value of the EVM.
	pub apparent_value: U256,
}

impl Context {
	/// Derive the context of a child frame entered through `scheme`.
	///
	/// `CALL` runs the target's code on the target's storage. `CALLCODE`
	/// runs the target's code on the current storage. `DELEGATECALL` also
	/// keeps the current caller and value.
	#[must_use]
	pub const fn for_call(&self, scheme: CallScheme, target: H160, value: U256) -> Self {
		match scheme {
			CallScheme::Call => Self {
				address: target,
				caller: self.address,
				apparent_value: value,
			},
			CallScheme::CallCode => Self {
				address: self.address,
				caller: self.address,
				apparent_value: value,
			},
			CallScheme::DelegateCall => Self {
				address: self.address,
				caller: self.caller,
				apparent_value: self.apparent_value,
			},
		}
	}
}

/// Transfer from source to target, with given value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transfer {
	/// Source address.
	pub source: H160,
	/// Target address.
	pub target: H160,
	/// Transfer value.
	pub value: U256,
}
