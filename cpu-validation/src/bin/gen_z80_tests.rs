use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use zeal_core::cpu::z80::Z80;
use zeal_cpu_validation::{BusOp, TracingBus, Z80CpuState, Z80TestCase, write_test_file};

const NUM_TESTS: usize = 1000;

/// Opcode page: the bytes placed before the opcode, and whether a
/// displacement byte sits between them and the opcode (DD CB d op).
#[derive(Clone, Copy)]
struct Page {
    prefix: &'static [u8],
    displaced: bool,
}

const PAGES: [(&str, Page); 7] = [
    ("base", Page { prefix: &[], displaced: false }),
    ("cb", Page { prefix: &[0xCB], displaced: false }),
    ("ed", Page { prefix: &[0xED], displaced: false }),
    ("dd", Page { prefix: &[0xDD], displaced: false }),
    ("fd", Page { prefix: &[0xFD], displaced: false }),
    ("ddcb", Page { prefix: &[0xDD, 0xCB], displaced: true }),
    ("fdcb", Page { prefix: &[0xFD, 0xCB], displaced: true }),
];

impl Page {
    /// Prefix bytes in an unprefixed or DD/FD page open a different page.
    fn covers(self, opcode: u8) -> bool {
        match self.prefix {
            [] => !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD),
            [0xDD] | [0xFD] => !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD),
            _ => true,
        }
    }

    fn file_name(self, opcode: u8) -> String {
        let mut parts: Vec<String> = self.prefix.iter().map(|b| format!("{b:02x}")).collect();
        if self.displaced {
            parts.push("__".into());
        }
        parts.push(format!("{opcode:02x}"));
        parts.join(" ")
    }
}

fn build_ram(memory: &[u8; 0x10000], addresses: &BTreeSet<u16>) -> Vec<(u16, u8)> {
    addresses
        .iter()
        .map(|&addr| (addr, memory[addr as usize]))
        .collect()
}

fn random_state(rng: &mut impl Rng) -> Z80CpuState {
    Z80CpuState {
        pc: rng.r#gen(),
        sp: rng.r#gen(),
        a: rng.r#gen(),
        b: rng.r#gen(),
        c: rng.r#gen(),
        d: rng.r#gen(),
        e: rng.r#gen(),
        f: rng.r#gen(),
        h: rng.r#gen(),
        l: rng.r#gen(),
        i: rng.r#gen(),
        r: rng.r#gen(),
        ei: 0,
        wz: rng.r#gen(),
        ix: rng.r#gen(),
        iy: rng.r#gen(),
        af_prime: rng.r#gen(),
        bc_prime: rng.r#gen(),
        de_prime: rng.r#gen(),
        hl_prime: rng.r#gen(),
        im: rng.gen_range(0..=2),
        p: 0,
        q: rng.r#gen(),
        iff1: rng.gen_range(0..=1),
        iff2: rng.gen_range(0..=1),
        ram: Vec::new(),
    }
}

/// Generate NUM_TESTS randomized vectors for one opcode of one page.
fn generate_opcode(rng: &mut impl Rng, page: Page, opcode: u8) -> Vec<Z80TestCase> {
    let mut tests = Vec::with_capacity(NUM_TESTS);

    for _ in 0..NUM_TESTS {
        let mut cpu = Z80::new();
        let mut bus = TracingBus::new();
        rng.fill(&mut bus.memory[..]);

        let mut initial = random_state(rng);
        let pc = initial.pc;
        let mut bytes = page.prefix.to_vec();
        if page.displaced {
            bytes.push(rng.r#gen());
        }
        bytes.push(opcode);
        bus.load(pc, &bytes);

        // Port reads float to 0xFF and are recorded for replay.
        initial.apply(&mut cpu);
        let pre_memory = bus.memory;

        let step = match cpu.step(&mut bus) {
            Ok(step) => step,
            Err(e) => {
                eprintln!("Skipping {}: {e}", page.file_name(opcode));
                return Vec::new();
            }
        };

        let mut final_state = Z80CpuState::from_halted_cpu(&cpu);
        let addresses: BTreeSet<u16> = bus
            .cycles
            .iter()
            .filter(|c| matches!(c.op, BusOp::Read | BusOp::Write))
            .map(|c| c.addr)
            .collect();
        initial.ram = build_ram(&pre_memory, &addresses);
        final_state.ram = build_ram(&bus.memory, &addresses);

        let ports = bus
            .cycles
            .iter()
            .filter_map(|c| match c.op {
                BusOp::PortRead => Some((c.addr, c.data, "r".to_string())),
                BusOp::PortWrite => Some((c.addr, c.data, "w".to_string())),
                _ => None,
            })
            .collect();

        // One entry per T-state: bus accesses first, internal states after.
        let mut cycles: Vec<(u16, Option<u8>, String)> = bus
            .cycles
            .iter()
            .map(|c| (c.addr, Some(c.data), c.op.pins().to_string()))
            .collect();
        cycles.resize(step.cycles() as usize, (0, None, "----".to_string()));

        let name = bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ");

        tests.push(Z80TestCase { name, initial, final_state, cycles, ports });
    }

    tests
}

fn generate_and_write(rng: &mut impl Rng, page: Page, opcode: u8, out_dir: &Path, gzip: bool) {
    let tests = generate_opcode(rng, page, opcode);
    if tests.is_empty() {
        return;
    }
    let ext = if gzip { "json.gz" } else { "json" };
    let out_path: PathBuf = out_dir.join(format!("{}.{ext}", page.file_name(opcode)));
    write_test_file(&out_path, &tests).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {e}", out_path.display());
        std::process::exit(1);
    });
    println!("Generated {} tests for {} -> {}", tests.len(), page.file_name(opcode), out_path.display());
}

fn usage() -> ! {
    eprintln!("Usage: gen_z80_tests [--gzip] <page> <opcode_hex | all>");
    eprintln!("Pages: base, cb, ed, dd, fd, ddcb, fdcb");
    eprintln!("Examples:");
    eprintln!("  gen_z80_tests base 0x3e");
    eprintln!("  gen_z80_tests --gzip ed all");
    std::process::exit(1);
}

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let gzip = match args.iter().position(|a| a == "--gzip") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    if args.len() != 2 {
        usage();
    }

    let Some(&(_, page)) = PAGES.iter().find(|(name, _)| *name == args[0]) else {
        eprintln!("Unknown page: {}", args[0]);
        usage();
    };

    let out_dir = Path::new("test_data/z80/generated");
    fs::create_dir_all(out_dir).expect("Failed to create output directory");

    let mut rng = rand::thread_rng();

    if args[1] == "all" {
        let mut count = 0;
        for opcode in (0x00..=0xFFu8).filter(|&op| page.covers(op)) {
            generate_and_write(&mut rng, page, opcode, out_dir, gzip);
            count += 1;
        }
        println!("Generated tests for {count} opcodes");
    } else {
        let opcode_str = args[1].trim_start_matches("0x").trim_start_matches("0X");
        let opcode = u8::from_str_radix(opcode_str, 16).unwrap_or_else(|_| {
            eprintln!("Invalid hex opcode: {}", args[1]);
            std::process::exit(1);
        });
        if !page.covers(opcode) {
            eprintln!("Opcode 0x{opcode:02X} is a prefix, not an instruction, on this page");
            std::process::exit(1);
        }
        generate_and_write(&mut rng, page, opcode, out_dir, gzip);
    }
}
