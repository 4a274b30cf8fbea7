//! Property-based tests for the instruction set.
//!
//! Uses proptest to check arithmetic, flag and call/return invariants
//! across random operands.

use proptest::prelude::*;

use ssm_core::{BufferedIo, Machine, OpCode, ProgramBuilder, SsmError, Word};

fn run(program: &[u8]) -> (Machine<BufferedIo>, Result<(), SsmError>) {
    let mut vm = Machine::with_capacity(4096, BufferedIo::new());
    vm.load(program).expect("load failed");
    let result = vm.run();
    (vm, result)
}

fn binary(a: Word, b: Word, op: OpCode) -> Vec<u8> {
    let mut builder = ProgramBuilder::new();
    builder.push(a).push(b).op(op).op(OpCode::Halt);
    builder.finish()
}

proptest! {
    /// `push a; push b; div` truncates toward zero.
    #[test]
    fn prop_div_truncates(a in any::<Word>(), b in any::<Word>().prop_filter("non-zero", |b| *b != 0)) {
        let (vm, result) = run(&binary(a, b, OpCode::Div));
        prop_assert!(result.is_ok());
        prop_assert_eq!(vm.stack().as_slice(), &[a.wrapping_div(b)]);
        if a != Word::MIN {
            let exact = a as i64 / b as i64;
            prop_assert_eq!(vm.stack().as_slice()[0] as i64, exact);
        }
    }

    /// Remainder follows the dividend's sign and satisfies a = q*b + r.
    #[test]
    fn prop_mod_matches_div(a in any::<Word>(), b in any::<Word>().prop_filter("non-zero", |b| *b != 0)) {
        let (vm, _) = run(&binary(a, b, OpCode::Mod));
        let r = vm.stack().as_slice()[0];
        let q = a.wrapping_div(b);
        prop_assert_eq!(q.wrapping_mul(b).wrapping_add(r), a);
        prop_assert!(r == 0 || (r < 0) == (a < 0));
    }

    #[test]
    fn prop_zero_divisor_fails(a in any::<Word>(), modulo in any::<bool>()) {
        let op = if modulo { OpCode::Mod } else { OpCode::Div };
        let (vm, result) = run(&binary(a, 0, op));
        prop_assert_eq!(result, Err(SsmError::DivisionByZero));
        prop_assert_eq!(vm.stack().as_slice(), &[a, 0]);
    }

    /// Compare sets exactly one documented subset, whatever was set before.
    #[test]
    fn prop_compare_sets_exact_flags(a in any::<Word>(), b in any::<Word>(), prior in any::<Word>()) {
        let mut builder = ProgramBuilder::new();
        builder.push(prior).op(OpCode::Test);
        builder.push(a).push(b).op(OpCode::Compare).op(OpCode::Halt);
        let (vm, result) = run(builder.as_bytes());
        prop_assert!(result.is_ok());

        let expected: Vec<&str> = if a < b {
            vec!["not_equal", "below"]
        } else if a > b {
            vec!["not_equal", "above"]
        } else {
            vec!["equal"]
        };
        prop_assert_eq!(vm.flags().set_bits(), expected);
    }

    /// After `call` at p and the callee's `return`, execution resumes at p + 1.
    #[test]
    fn prop_call_return_resumes_after_call(pad in 0usize..200, callee in 1000usize..2000) {
        let mut builder = ProgramBuilder::new();
        for _ in 0..pad {
            builder.op(OpCode::Nop);
        }
        builder.push(callee as Word);
        let call_at = builder.position();
        builder.op(OpCode::Call).op(OpCode::Halt);
        builder.set_position(callee);
        builder.op(OpCode::Return);

        let (vm, result) = run(builder.as_bytes());
        prop_assert!(result.is_ok());
        prop_assert!(vm.stack().is_empty());
        // halt sits right after the call
        prop_assert_eq!(vm.instruction_pointer(), call_at + 2);
    }

    #[test]
    fn prop_store_load_round_trip(address in 100usize..4092, value in any::<Word>()) {
        let mut builder = ProgramBuilder::new();
        builder.push(address as Word).push(value).op(OpCode::Store);
        builder.push(address as Word).op(OpCode::Load).op(OpCode::Halt);
        let (vm, result) = run(builder.as_bytes());
        prop_assert!(result.is_ok());
        prop_assert_eq!(vm.stack().as_slice(), &[value]);
    }
}
