use zeal_core::cpu::z80::InterruptMode;
mod common;
use common::{TestBus, cpu_at, run_instruction};

// --- Port I/O ---

#[test]
fn test_in_a_n_uses_a_as_high_byte() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.a = 0x12;
    cpu.regs.f = 0xFF;
    bus.ports.insert(0x1234, 0x56);
    bus.load(0, &[0xDB, 0x34]); // IN A, (0x34)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 11);
    assert_eq!(cpu.regs.a, 0x56);
    assert_eq!(cpu.regs.f, 0xFF, "IN A,(n) leaves flags alone");
    assert_eq!(cpu.memptr, 0x1235);
}

#[test]
fn test_out_n_a() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.a = 0x12;
    bus.load(0, &[0xD3, 0xFF]); // OUT (0xFF), A

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 11);
    assert_eq!(bus.port_writes, vec![(0x12FF, 0x12)]);
    assert_eq!(cpu.memptr, 0x1200, "low byte wraps without carrying into A");
}

#[test]
fn test_in_r_c_flags() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.set_bc(0x1080);
    cpu.regs.f = 0x01;
    bus.ports.insert(0x1080, 0x00);
    bus.load(0, &[0xED, 0x40]); // IN B, (C)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 12);
    assert_eq!(cpu.regs.b, 0x00);
    assert_eq!(cpu.regs.f, 0x45, "Z, P/V, carry kept");
    assert_eq!(cpu.memptr, 0x1081);
}

#[test]
fn test_in_f_c_only_sets_flags() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.set_bc(0x0102);
    bus.load(0, &[0xED, 0x70]); // IN F, (C) (undocumented)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.bc(), 0x0102);
    assert_eq!(cpu.regs.f, 0xAC, "unmapped port floats to 0xFF");
}

#[test]
fn test_out_c_zero() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.set_bc(0x00FE);
    bus.load(0, &[0xED, 0x71, 0xED, 0x79]); // OUT (C),0 ; OUT (C),A
    cpu.regs.a = 0x3C;

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.port_writes, vec![(0x00FE, 0x00), (0x00FE, 0x3C)]);
}

// --- Interrupt control ---

#[test]
fn test_im_modes_and_mirrors() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    // IM 2 ; IM 0 (ED 4E mirror) ; IM 1 (ED 76 mirror)
    bus.load(0, &[0xED, 0x5E, 0xED, 0x4E, 0xED, 0x76]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.im, InterruptMode::Mode2);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.im, InterruptMode::Mode0);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.im, InterruptMode::Mode1);
    assert!(!cpu.halted, "ED 76 is IM 1, not HALT");
}

#[test]
fn test_reti() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.iff1 = false;
    cpu.iff2 = true;
    bus.load(0x1000, &[0x00, 0x20]);
    bus.load(0, &[0xED, 0x4D]); // RETI

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 14);
    assert_eq!(cpu.regs.pc, 0x2000);
    assert!(cpu.iff1);
}

// --- Undefined and mirrored opcodes ---

#[test]
fn test_undefined_ed_is_two_nops() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.set_af(0x1234);
    bus.load(0, &[0xED, 0x00, 0xED, 0x77]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.pc, 2);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.pc, 4);
    assert_eq!(cpu.regs.af(), 0x1234);
    assert_eq!(cpu.regs.r, 4);
}

#[test]
fn test_neg_mirror() {
    let mut cpu = cpu_at(0);
    let mut bus = TestBus::new();
    cpu.regs.a = 0x05;
    bus.load(0, &[0xED, 0x7C]); // NEG (mirror)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0xFB);
}
