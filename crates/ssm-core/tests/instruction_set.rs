use ssm_core::bytecode::OpCode;
use ssm_core::vm::SIN_OVERFLOW;
use ssm_core::{BufferedIo, HostIo, Machine, MachineConfig, ProgramBuilder, SsmError, Word};

fn machine(program: &[u8], input: &[&str]) -> Machine<BufferedIo> {
    let mut vm = Machine::new(MachineConfig::new(), BufferedIo::with_input(input.iter().copied()));
    vm.load(program).expect("load failed");
    vm
}

/// Run the `setup` pushes, then single-step `op` and return the machine.
fn step_op(setup: &[Word], op: OpCode, inline: Option<Word>, input: &[&str]) -> (Machine<BufferedIo>, usize) {
    let mut b = ProgramBuilder::new();
    for value in setup {
        b.push(*value);
    }
    let at = b.position();
    b.op(op);
    if let Some(word) = inline {
        b.word(word);
    }
    b.text_at(2000, "hello");

    let mut vm = machine(b.as_bytes(), input);
    for _ in setup {
        vm.step().expect("setup failed");
    }
    assert_eq!(vm.instruction_pointer(), at);
    vm.step().unwrap_or_else(|e| panic!("{:?} failed: {}", op, e));
    (vm, at)
}

#[test]
fn non_branching_ops_land_past_their_encoding() {
    let cases: Vec<(OpCode, Vec<Word>, Option<Word>, Vec<&str>)> = vec![
        (OpCode::Nop, vec![], None, vec![]),
        (OpCode::Push, vec![], Some(9), vec![]),
        (OpCode::Pop, vec![1], None, vec![]),
        (OpCode::Test, vec![1], None, vec![]),
        (OpCode::Load, vec![2000], None, vec![]),
        (OpCode::Store, vec![3000, 1], None, vec![]),
        (OpCode::Add, vec![1, 2], None, vec![]),
        (OpCode::Sub, vec![1, 2], None, vec![]),
        (OpCode::Mul, vec![1, 2], None, vec![]),
        (OpCode::Div, vec![1, 2], None, vec![]),
        (OpCode::Mod, vec![1, 2], None, vec![]),
        (OpCode::Dup, vec![1], None, vec![]),
        (OpCode::Swap, vec![1, 2], None, vec![]),
        (OpCode::Compare, vec![1, 2], None, vec![]),
        (OpCode::Iout, vec![1], None, vec![]),
        (OpCode::Sout, vec![2000, 5], None, vec![]),
        (OpCode::Iin, vec![], None, vec!["4"]),
        (OpCode::Sin, vec![3000, 16], None, vec!["abc"]),
        (OpCode::Halt, vec![], None, vec![]),
    ];

    for (op, setup, inline, input) in cases {
        let (vm, at) = step_op(&setup, op, inline, &input);
        assert_eq!(
            vm.instruction_pointer(),
            at + op.encoded_len(),
            "{:?} left the pointer at the wrong place",
            op
        );
    }
}

#[test]
fn two_operand_ops_on_a_single_value_change_nothing() {
    let ops = [
        OpCode::Add,
        OpCode::Sub,
        OpCode::Div,
        OpCode::Store,
        OpCode::Compare,
        OpCode::Swap,
        OpCode::Sout,
        OpCode::Sin,
    ];

    for op in ops {
        let mut b = ProgramBuilder::new();
        b.push(7).op(op);
        let mut vm = machine(b.as_bytes(), &["abc"]);
        vm.step().expect("push failed");

        assert_eq!(
            vm.step(),
            Err(SsmError::StackUnderflow { required: 2, depth: 1 }),
            "{:?}",
            op
        );
        assert_eq!(vm.stack().as_slice(), &[7], "{:?}", op);
        assert_eq!(vm.instruction_pointer(), 5, "{:?}", op);
    }
}

#[test]
fn conditional_jumps_fall_through_past_operand() {
    // Fresh flags are all clear; only `jne` holds (it is `!equal`).
    for op in OpCode::ALL.into_iter().filter(|op| op.is_conditional_jump()) {
        let (vm, at) = step_op(&[], op, Some(100), &[]);
        let expected = if op == OpCode::Jne { 100 } else { at + 5 };
        assert_eq!(vm.instruction_pointer(), expected, "{:?}", op);
    }
}

#[test]
fn conditional_jump_matrix() {
    // (a, b) compared, then each jump checked for taken / not taken
    let comparisons = [(1, 2), (2, 1), (3, 3)];
    let expectations: [(OpCode, [bool; 3]); 6] = [
        (OpCode::Jl, [true, false, false]),
        (OpCode::Jle, [true, false, true]),
        (OpCode::Je, [false, false, true]),
        (OpCode::Jne, [true, true, false]),
        (OpCode::Ja, [false, true, false]),
        (OpCode::Jae, [false, true, true]),
    ];

    for (op, taken) in expectations {
        for ((a, b), taken) in comparisons.iter().zip(taken) {
            let mut bld = ProgramBuilder::new();
            bld.push(*a).push(*b).op(OpCode::Compare).jump(op, 500);
            let mut vm = machine(bld.as_bytes(), &[]);
            for _ in 0..4 {
                vm.step().expect("step failed");
            }
            let expected = if taken { 500 } else { 16 };
            assert_eq!(vm.instruction_pointer(), expected, "{:?} after compare {} {}", op, a, b);
        }
    }
}

#[test]
fn zero_test_jumps() {
    let values = [5, -5, 0];
    let expectations: [(OpCode, [bool; 3]); 4] = [
        (OpCode::Jz, [false, false, true]),
        (OpCode::Jnz, [true, true, false]),
        (OpCode::Jbz, [false, true, false]),
        (OpCode::Jaz, [true, false, false]),
    ];

    for (op, taken) in expectations {
        for (value, taken) in values.iter().zip(taken) {
            let mut bld = ProgramBuilder::new();
            bld.push(*value).op(OpCode::Test).jump(op, 700);
            let mut vm = machine(bld.as_bytes(), &[]);
            for _ in 0..3 {
                vm.step().expect("step failed");
            }
            let expected = if taken { 700 } else { 11 };
            assert_eq!(vm.instruction_pointer(), expected, "{:?} after test {}", op, value);
        }
    }
}

#[test]
fn taken_jump_to_invalid_target_fails_in_place() {
    let mut b = ProgramBuilder::new();
    b.push(0).op(OpCode::Test).jump(OpCode::Jz, -1);
    let mut vm = machine(b.as_bytes(), &[]);
    vm.step().expect("push failed");
    vm.step().expect("test failed");
    let err = vm.step().unwrap_err();
    assert!(matches!(err, SsmError::TapeOutOfBounds { address: -1, .. }));
    assert_eq!(vm.instruction_pointer(), 6);
}

#[test]
fn jmp_pops_its_target() {
    let mut b = ProgramBuilder::new();
    b.push(40).op(OpCode::Jmp);
    b.set_position(40);
    b.push(1).op(OpCode::Halt);
    let mut vm = machine(b.as_bytes(), &[]);
    vm.run().expect("execution failed");
    assert_eq!(vm.stack().as_slice(), &[1]);
    assert_eq!(vm.instruction_pointer(), 46);
}

#[test]
fn jmp_past_tape_is_rejected() {
    let mut b = ProgramBuilder::new();
    b.push(16384).op(OpCode::Jmp);
    let mut vm = machine(b.as_bytes(), &[]);
    let err = vm.run().unwrap_err();
    assert_eq!(err, SsmError::TapeOutOfBounds { address: 16384, width: 1, capacity: 16384 });
    assert_eq!(vm.stack().as_slice(), &[16384]);
}

#[test]
fn push_needs_room_for_its_operand() {
    let mut vm = Machine::with_capacity(4, BufferedIo::new());
    vm.load(&[OpCode::Push as u8, 1, 0, 0]).expect("load failed");
    let err = vm.step().unwrap_err();
    assert_eq!(err, SsmError::TapeOutOfBounds { address: 0, width: 5, capacity: 4 });
    assert!(vm.stack().is_empty());
}

#[test]
fn running_off_the_program_walks_nops_to_the_end() {
    let mut vm = Machine::with_capacity(3, BufferedIo::new());
    vm.load(&[OpCode::Nop as u8]).expect("load failed");
    let err = vm.run().unwrap_err();
    assert_eq!(err, SsmError::TapeOutOfBounds { address: 3, width: 1, capacity: 3 });
    assert_eq!(vm.steps(), 3);
}

#[test]
fn sout_prints_tape_text() {
    let mut b = ProgramBuilder::new();
    b.push(900).push(6).op(OpCode::Sout).op(OpCode::Halt);
    b.text_at(900, "Hello!");
    let mut vm = machine(b.as_bytes(), &[]);
    vm.run().expect("execution failed");
    assert_eq!(vm.host().output(), "Hello!");
    assert!(vm.stack().is_empty());
}

#[test]
fn sout_rejects_negative_length() {
    let mut b = ProgramBuilder::new();
    b.push(900).push(-1).op(OpCode::Sout);
    let mut vm = machine(b.as_bytes(), &[]);
    assert!(matches!(vm.run(), Err(SsmError::TapeOutOfBounds { address: 900, .. })));
    assert_eq!(vm.host().output(), "");
}

#[test]
fn iin_reads_and_rejects_garbage() {
    let mut b = ProgramBuilder::new();
    b.op(OpCode::Iin).op(OpCode::Iin).op(OpCode::Halt);
    let mut vm = machine(b.as_bytes(), &["  -17 ", "seven"]);
    let err = vm.run().unwrap_err();
    assert!(matches!(err, SsmError::InputFormat(_)));
    assert_eq!(vm.stack().as_slice(), &[-17]);
    assert_eq!(vm.instruction_pointer(), 1);
}

#[test]
fn sin_writes_line_and_pushes_length() {
    let mut b = ProgramBuilder::new();
    b.push(3000).push(10).op(OpCode::Sin).op(OpCode::Halt);
    let mut vm = machine(b.as_bytes(), &["hello"]);
    vm.run().expect("execution failed");
    assert_eq!(vm.stack().as_slice(), &[5]);
    assert_eq!(vm.tape().read_bytes(3000, 5), Ok(&b"hello"[..]));
}

#[test]
fn sin_oversized_line_pushes_sentinel() {
    let mut b = ProgramBuilder::new();
    b.push(3000).push(3).op(OpCode::Sin).op(OpCode::Halt);
    let mut vm = machine(b.as_bytes(), &["hello"]);
    vm.run().expect("execution failed");
    assert_eq!(vm.stack().as_slice(), &[SIN_OVERFLOW]);
    assert_eq!(vm.tape().read_bytes(3000, 5), Ok(&[0u8; 5][..]));
}

#[test]
fn sin_checks_destination_before_reading() {
    let mut b = ProgramBuilder::new();
    b.push(-4).push(10).op(OpCode::Sin);
    let mut vm = machine(b.as_bytes(), &["hello"]);
    assert!(matches!(vm.run(), Err(SsmError::TapeOutOfBounds { address: -4, .. })));
    assert_eq!(vm.host_mut().read_line(), Ok("hello".to_string()));
}

#[test]
fn return_address_shares_the_data_stack() {
    // A callee that swaps in its own address returns somewhere else.
    // 0: push 11 | 5: call | 6: halt | 7..11: unused | 11: pop | 12: push 20 | 17: return | 20: push 9 | 25: halt
    let mut b = ProgramBuilder::new();
    b.push(11).op(OpCode::Call).op(OpCode::Halt);
    b.set_position(11);
    b.op(OpCode::Pop).push(20).op(OpCode::Return);
    b.set_position(20);
    b.push(9).op(OpCode::Halt);
    let mut vm = machine(b.as_bytes(), &[]);
    vm.run().expect("execution failed");
    assert_eq!(vm.stack().as_slice(), &[9]);
    assert_eq!(vm.instruction_pointer(), 26);
}
