macro_rules! try_or_fail {
	( $e:expr ) => {
		match $e {
			Ok(v) => v,
			Err(e) => return Control::Exit(e.into()),
		}
	};
}

macro_rules! pop_h256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$(
			let $x = match $runtime.machine.stack_mut().pop_h256() {
				Ok(value) => value,
				Err(e) => return Control::Exit(e.into()),
			};
		)*
	);
}

macro_rules! pop_u256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$(
			let $x = match $runtime.machine.stack_mut().pop() {
				Ok(value) => value,
				Err(e) => return Control::Exit(e.into()),
			};
		)*
	);
}

macro_rules! push_h256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$(
			match $runtime.machine.stack_mut().push(U256::from_big_endian(&$x[..])) {
				Ok(()) => (),
				Err(e) => return Control::Exit(e.into()),
			}
		)*
	)
}

macro_rules! push_u256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$(
			match $runtime.machine.stack_mut().push($x) {
				Ok(()) => (),
				Err(e) => return Control::Exit(e.into()),
			}
		)*
	)
}

macro_rules! as_usize_or_fail {
	( $v:expr ) => {{
		if $v > crate::utils::USIZE_MAX {
			return Control::Exit(ExitError::OutOfGas.into());
		}

		$v.as_usize()
	}};

	( $v:expr, $reason:expr ) => {{
		if $v > crate::utils::USIZE_MAX {
			return Control::Exit($reason.into());
		}

		$v.as_usize()
	}};
}

macro_rules! op1_u256_fn {
	( $runtime:expr, $op:path ) => {{
		pop_u256!($runtime, op1);
		let ret = $op(op1);
		push_u256!($runtime, ret);

		Control::Continue
	}};
}

macro_rules! op2_u256_bool_ref {
	( $runtime:expr, $op:ident ) => {{
		pop_u256!($runtime, op1, op2);
		let ret = op1.$op(&op2);
		push_u256!($runtime, if ret { U256::one() } else { U256::zero() });

		Control::Continue
	}};
}

macro_rules! op2_u256 {
	( $runtime:expr, $op:ident ) => {{
		pop_u256!($runtime, op1, op2);
		let ret = op1.$op(op2);
		push_u256!($runtime, ret);

		Control::Continue
	}};
}

macro_rules! op2_u256_tuple {
	( $runtime:expr, $op:ident ) => {{
		pop_u256!($runtime, op1, op2);
		let (ret, ..) = op1.$op(op2);
		push_u256!($runtime, ret);

		Control::Continue
	}};
}

macro_rules! op2_u256_fn {
	( $runtime:expr, $op:path ) => {{
		pop_u256!($runtime, op1, op2);
		let ret = $op(op1, op2);
		push_u256!($runtime, ret);

		Control::Continue
	}};
}

macro_rules! op3_u256_fn {
	( $runtime:expr, $op:path ) => {{
		pop_u256!($runtime, op1, op2, op3);
		let ret = $op(op1, op2, op3);
		push_u256!($runtime, ret);

		Control::Continue
	}};
}
