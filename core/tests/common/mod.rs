#![allow(dead_code)]

use std::collections::HashMap;

use zeal_core::core::{Bus, Memory};
use zeal_core::cpu::z80::{Step, Z80};

/// Minimal bus for testing: flat 64KB read/write memory plus a port map.
/// Unmapped ports read 0xFF; every write is logged.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports: HashMap<u16, u8>,
    pub port_writes: Vec<(u16, u8)>,
    pub port_reads: Vec<u16>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: HashMap::new(),
            port_writes: Vec::new(),
            port_reads: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Memory for TestBus {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }
}

impl Bus for TestBus {
    fn io_read(&mut self, port: u16) -> u8 {
        self.port_reads.push(port);
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}

/// Run one step and return the T-states it took.
pub fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step(bus).expect("step failed").cycles()
}

/// Run one step and return what it did.
pub fn step(cpu: &mut Z80, bus: &mut TestBus) -> Step {
    cpu.step(bus).expect("step failed")
}

/// CPU at `pc` with SP at 0x1000 and flags cleared.
pub fn cpu_at(pc: u16) -> Z80 {
    let mut cpu = Z80::new();
    cpu.regs.pc = pc;
    cpu.regs.sp = 0x1000;
    cpu.regs.f = 0x00;
    cpu
}
