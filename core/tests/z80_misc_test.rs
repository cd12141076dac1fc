use zeal_core::core::ExecutionError;
use zeal_core::cpu::CpuStateTrait;
use zeal_core::cpu::z80::{Instruction, Op, Operands, Prefix, STANDARD_TABLES, Step, Z80};
mod common;
use common::{TestBus, cpu_at, run_instruction};

#[test]
fn test_nop() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    bus.load(0, &[0x00]);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.pc, 1);
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn test_pc_wraps_at_top_of_memory() {
    let mut cpu = cpu_at(0xFFFF);
    let mut bus = TestBus::new();
    bus.memory[0xFFFF] = 0x00;

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x0000);
}

#[test]
fn test_di_ei() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    bus.load(0, &[0xFB, 0x00, 0xF3]); // EI ; NOP ; DI

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.iff1 && cpu.iff2 && cpu.ei_delay);
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.ei_delay, "delay lasts one instruction");
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.iff1 && !cpu.iff2);
}

// --- Decode ---

#[test]
fn test_decode_ddcb() {
    let cpu = cpu_at(0);
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0xCB, 0x05, 0xC6]); // SET 0, (IX+5)

    let instr = cpu.decode(&mut bus).unwrap();
    assert_eq!(instr.prefix, Prefix::DDCB);
    assert_eq!(instr.opcode, 0xC6);
    assert_eq!(instr.operands, Operands::Disp(5));
    assert_eq!(instr.len(), 4);
    assert!(instr.to_string().starts_with("0000  DD CB C6 d=+5"));
    assert_eq!(cpu.regs.pc, 0, "decode does not move PC");
}

#[test]
fn test_decode_immediate_word() {
    let cpu = cpu_at(0x0100);
    let mut bus = TestBus::new();
    bus.load(0x0100, &[0xED, 0x4B, 0x34, 0x12]); // LD BC, (0x1234)

    let instr = cpu.decode(&mut bus).unwrap();
    assert_eq!(instr.operands, Operands::Word(0x1234));
    assert_eq!(instr.next_pc(), 0x0104);
}

// --- Unsupported opcodes ---

#[test]
fn test_unsupported_opcode_leaves_state_alone() {
    let tables = Box::leak(Box::new(STANDARD_TABLES.without(Prefix::ED, 0x44)));
    let mut cpu = Z80::with_tables(tables);
    cpu.regs.pc = 0x0100;
    let mut bus = TestBus::new();
    bus.load(0x0100, &[0xED, 0x44]);

    let before = cpu.snapshot();
    let err = cpu.step(&mut bus).unwrap_err();
    assert_eq!(err, ExecutionError::UnsupportedOpcode { prefix: Prefix::ED, opcode: 0x44, pc: 0x0100 });
    assert_eq!(err.to_string(), "unsupported opcode ED 44 at 0x0100");
    assert_eq!(cpu.snapshot(), before);
}

#[test]
fn test_unsupported_indexed_cb_reports_full_prefix() {
    let tables = Box::leak(Box::new(STANDARD_TABLES.without(Prefix::CB, 0x06)));
    let mut cpu = Z80::with_tables(tables);
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0xCB, 0x05, 0x06]);

    let err = cpu.step(&mut bus).unwrap_err();
    assert_eq!(err, ExecutionError::UnsupportedOpcode { prefix: Prefix::DDCB, opcode: 0x06, pc: 0 });
    assert_eq!(cpu.cycles, 0);
}

#[test]
fn test_misplaced_prefix_marker_is_unsupported() {
    let mut tables = STANDARD_TABLES.clone();
    tables.ed[0x44] = tables.unprefixed[0xCB]; // Prefix(CB) one level too deep
    tables.unprefixed[0x00] = tables.dd[0xCB]; // IndexedCb with no DD/FD in front
    let mut cpu = Z80::with_tables(Box::leak(Box::new(tables)));
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0x00]);
    bus.load(0x0100, &[0xED, 0x44]);

    let before = cpu.snapshot();
    let err = cpu.step(&mut bus).unwrap_err();
    assert_eq!(err, ExecutionError::UnsupportedOpcode { prefix: Prefix::None, opcode: 0x00, pc: 0 });
    assert_eq!(cpu.snapshot(), before);

    cpu.regs.pc = 0x0100;
    let err = cpu.step(&mut bus).unwrap_err();
    assert_eq!(err, ExecutionError::UnsupportedOpcode { prefix: Prefix::ED, opcode: 0x44, pc: 0x0100 });
    assert_eq!(cpu.cycles, 0);
}

// --- Pre-execution hook ---

#[test]
fn test_hook_sees_instruction_before_effects() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.a = 0x00;
    bus.load(0, &[0x3E, 0x42]); // LD A, 0x42

    let mut seen = Vec::new();
    {
        let mut hook = |cpu: &Z80, instr: &Instruction| seen.push((cpu.regs.a, cpu.regs.pc, instr.op()));
        cpu.step_with_hook(&mut bus, &mut hook).unwrap();
    }
    assert_eq!(seen.len(), 1);
    let (a, pc, op) = seen[0];
    assert_eq!(a, 0x00, "A not yet loaded");
    assert_eq!(pc, 0, "PC still on the instruction");
    assert!(matches!(op, Op::Ld8 { .. }));
    assert_eq!(cpu.regs.a, 0x42);
}

// --- Snapshots ---

#[test]
fn test_snapshot_restore_resumes_identically() {
    let program = [
        0x21, 0x00, 0x30, // LD HL,0x3000
        0x06, 0x05, // LD B,5
        0x7E, // loop: LD A,(HL)
        0x87, // ADD A,A
        0x77, // LD (HL),A
        0x23, // INC HL
        0x10, 0xFA, // DJNZ loop
        0x37, // SCF
        0x76, // HALT
    ];
    let mut bus = TestBus::new();
    bus.load(0, &program);
    bus.load(0x3000, &[1, 2, 3, 4, 5]);
    let mut cpu = cpu_at(0);

    for _ in 0..6 {
        run_instruction(&mut cpu, &mut bus);
    }
    let state = cpu.snapshot();
    let memory = bus.memory;

    let mut first = Vec::new();
    while !cpu.halted {
        run_instruction(&mut cpu, &mut bus);
        first.push(cpu.snapshot());
    }

    let mut replay = Z80::new();
    replay.restore(&state);
    assert_eq!(replay.snapshot(), state);
    let mut replay_bus = TestBus::new();
    replay_bus.memory = memory;
    let mut second = Vec::new();
    while !replay.halted {
        let s = replay.step(&mut replay_bus).unwrap();
        assert!(matches!(s, Step::Executed { .. }));
        second.push(replay.snapshot());
    }

    assert_eq!(first, second);
    assert_eq!(bus.memory[..], replay_bus.memory[..]);
    assert_eq!(&bus.memory[0x3000..0x3005], &[2, 4, 6, 8, 10]);
}
