use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use zeal_core::core::{Bus, Memory};
use zeal_core::cpu::z80::{InterruptMode, Z80};
use zeal_core::cpu::{CpuStateTrait, Z80State};

// --- TracingBus: flat 64KB memory plus a port queue, recording every access ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    Read,
    Write,
    PortRead,
    PortWrite,
}

impl BusOp {
    /// Pin-activity string in the SingleStepTests cycle format.
    pub fn pins(self) -> &'static str {
        match self {
            BusOp::Read => "r-m-",
            BusOp::Write => "-wm-",
            BusOp::PortRead => "r--i",
            BusOp::PortWrite => "-w-i",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: [u8; 0x10000],
    pub cycles: Vec<BusCycle>,
    /// Values handed out by port reads, oldest first. Empty reads float to 0xFF.
    pub port_queue: VecDeque<(u16, u8)>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            cycles: Vec::new(),
            port_queue: VecDeque::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[addr.wrapping_add(i as u16) as usize] = byte;
        }
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    pub fn port_writes(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.cycles
            .iter()
            .filter(|c| c.op == BusOp::PortWrite)
            .map(|c| (c.addr, c.data))
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for TracingBus {
    fn read_byte(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.cycles.push(BusCycle { addr, data, op: BusOp::Read });
        data
    }

    fn write_byte(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.cycles.push(BusCycle { addr, data, op: BusOp::Write });
    }
}

impl Bus for TracingBus {
    fn io_read(&mut self, port: u16) -> u8 {
        let data = match self.port_queue.iter().position(|&(p, _)| p == port) {
            Some(i) => self.port_queue.remove(i).map_or(0xFF, |(_, v)| v),
            None => 0xFF,
        };
        self.cycles.push(BusCycle { addr: port, data, op: BusOp::PortRead });
        data
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.cycles.push(BusCycle { addr: port, data, op: BusOp::PortWrite });
    }
}

// --- Z80 JSON test vector types (SingleStepTests/z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// One entry per T-state: address, data (absent when the bus floats), pins.
    pub cycles: Vec<(u16, Option<u8>, String)>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    pub ei: u8,
    pub wz: u16,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    pub p: u8,
    pub q: u8,
    pub iff1: u8,
    pub iff2: u8,
    pub ram: Vec<(u16, u8)>,
}

impl Z80CpuState {
    /// Capture the CPU registers; `ram` is left for the caller to fill.
    pub fn from_cpu(cpu: &Z80) -> Self {
        let s = cpu.snapshot();
        let r = &s.regs;
        Self {
            pc: r.pc,
            sp: r.sp,
            a: r.a,
            b: r.b,
            c: r.c,
            d: r.d,
            e: r.e,
            f: r.f,
            h: r.h,
            l: r.l,
            i: r.i,
            r: r.r,
            ei: s.ei_delay as u8,
            wz: s.memptr,
            ix: r.ix,
            iy: r.iy,
            af_prime: r.af_prime(),
            bc_prime: r.bc_prime(),
            de_prime: r.de_prime(),
            hl_prime: r.hl_prime(),
            im: s.im.as_u8(),
            p: s.p as u8,
            q: s.q,
            iff1: s.iff1 as u8,
            iff2: s.iff2 as u8,
            ram: Vec::new(),
        }
    }

    /// Capture the CPU in the vectors' convention. A halted CPU here keeps PC
    /// on the HALT opcode while the vectors record it one past, so shift it.
    pub fn from_halted_cpu(cpu: &Z80) -> Self {
        let mut state = Self::from_cpu(cpu);
        if cpu.halted {
            state.pc = state.pc.wrapping_add(1);
        }
        state
    }

    /// Load these registers into `cpu`. Interrupt lines are cleared.
    pub fn apply(&self, cpu: &mut Z80) {
        let mut s = Z80State { cycles: cpu.cycles, ..Z80State::default() };
        let r = &mut s.regs;
        r.pc = self.pc;
        r.sp = self.sp;
        r.a = self.a;
        r.b = self.b;
        r.c = self.c;
        r.d = self.d;
        r.e = self.e;
        r.f = self.f;
        r.h = self.h;
        r.l = self.l;
        r.i = self.i;
        r.r = self.r;
        r.ix = self.ix;
        r.iy = self.iy;
        r.set_af_prime(self.af_prime);
        r.set_bc_prime(self.bc_prime);
        r.set_de_prime(self.de_prime);
        r.set_hl_prime(self.hl_prime);
        s.ei_delay = self.ei != 0;
        s.memptr = self.wz;
        s.im = InterruptMode::from_u8(self.im).unwrap_or_default();
        s.p = self.p != 0;
        s.q = self.q;
        s.iff1 = self.iff1 != 0;
        s.iff2 = self.iff2 != 0;
        cpu.restore(&s);
    }
}

// --- Vector files ---

#[derive(Debug)]
pub enum VectorError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "malformed test vector: {e}"),
        }
    }
}

impl std::error::Error for VectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for VectorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read a `.json` or `.json.gz` vector file.
pub fn load_test_file(path: &Path) -> Result<Vec<Z80TestCase>, VectorError> {
    let file = BufReader::new(File::open(path)?);
    let tests = if is_gzip(path) {
        serde_json::from_reader(GzDecoder::new(file))?
    } else {
        serde_json::from_reader(file)?
    };
    Ok(tests)
}

/// Write vectors as JSON, gzip-compressed when the path ends in `.gz`.
pub fn write_test_file(path: &Path, tests: &[Z80TestCase]) -> Result<(), VectorError> {
    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, tests)?;
        encoder.finish()?;
    } else {
        serde_json::to_writer_pretty(file, tests)?;
    }
    Ok(())
}

/// True for vector files this crate can read.
pub fn is_vector_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    name.ends_with(".json") || name.ends_with(".json.gz")
}

// --- Running a vector ---

/// Execute one vector and return the first mismatch, if any.
pub fn run_test_case(tc: &Z80TestCase) -> Result<(), String> {
    let mut cpu = Z80::new();
    let mut bus = TracingBus::new();

    tc.initial.apply(&mut cpu);
    for &(addr, val) in &tc.initial.ram {
        bus.memory[addr as usize] = val;
    }
    for (port, value, dir) in &tc.ports {
        if dir.starts_with('r') {
            bus.port_queue.push_back((*port, *value));
        }
    }

    let step = cpu
        .step(&mut bus)
        .map_err(|e| format!("{}: {e}", tc.name))?;

    let got = Z80CpuState::from_halted_cpu(&cpu);
    let exp = &tc.final_state;

    macro_rules! check {
        ($($field:ident => $label:expr),* $(,)?) => {
            $(
                if got.$field != exp.$field {
                    return Err(format!(
                        "{}: {} (got 0x{:X} exp 0x{:X})",
                        tc.name, $label, got.$field, exp.$field
                    ));
                }
            )*
        };
    }

    check!(
        a => "A", f => "F", b => "B", c => "C", d => "D", e => "E", h => "H", l => "L",
        i => "I", r => "R", ix => "IX", iy => "IY", sp => "SP", pc => "PC", wz => "WZ",
        iff1 => "IFF1", iff2 => "IFF2", im => "IM", ei => "EI", p => "P", q => "Q",
        af_prime => "AF'", bc_prime => "BC'", de_prime => "DE'", hl_prime => "HL'",
    );

    for &(addr, expected) in &exp.ram {
        let actual = bus.memory[addr as usize];
        if actual != expected {
            return Err(format!(
                "{}: RAM[0x{addr:04X}] (got 0x{actual:02X} exp 0x{expected:02X})",
                tc.name
            ));
        }
    }

    let expected_writes: Vec<(u16, u8)> = tc
        .ports
        .iter()
        .filter(|(_, _, dir)| dir.starts_with('w'))
        .map(|&(port, value, _)| (port, value))
        .collect();
    let writes: Vec<(u16, u8)> = bus.port_writes().collect();
    if writes != expected_writes {
        return Err(format!("{}: port writes (got {writes:X?} exp {expected_writes:X?})", tc.name));
    }

    if step.cycles() as usize != tc.cycles.len() {
        return Err(format!(
            "{}: cycles (got {} exp {})",
            tc.name,
            step.cycles(),
            tc.cycles.len()
        ));
    }

    Ok(())
}
