use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zeal_core::prelude::*;
use zeal_cpu_validation::Z80CpuState;

const STEPS: usize = 2_000;

fn random_machine(seed: u64) -> (Vec<u8>, ResetOverrides) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut memory = vec![0u8; 0x10000];
    rng.fill(&mut memory[..]);
    let overrides = ResetOverrides {
        af: Some(rng.r#gen()),
        bc: Some(rng.r#gen()),
        de: Some(rng.r#gen()),
        hl: Some(rng.r#gen()),
        ix: Some(rng.r#gen()),
        iy: Some(rng.r#gen()),
        sp: Some(rng.r#gen()),
        pc: Some(rng.r#gen()),
        i: Some(rng.r#gen()),
        r: Some(rng.r#gen()),
        interrupt_mode: Some(rng.gen_range(0..=2)),
    };
    (memory, overrides)
}

fn engine(memory: Vec<u8>, overrides: ResetOverrides) -> Engine<Vec<u8>> {
    Engine::new(memory, EngineConfig::new().with_reset_overrides(overrides)).unwrap()
}

fn advance(engine: &Engine<Vec<u8>>, steps: usize) {
    for _ in 0..steps {
        engine.step().unwrap();
    }
}

#[test]
fn test_random_programs_are_deterministic() {
    for seed in 0..8 {
        let (memory, overrides) = random_machine(seed);
        let a = engine(memory.clone(), overrides);
        let b = engine(memory, overrides);

        advance(&a, STEPS);
        advance(&b, STEPS);

        assert_eq!(a.state(), b.state(), "seed {seed}");
        assert!(a.into_memory() == b.into_memory(), "seed {seed}: memory diverged");
    }
}

#[test]
fn test_snapshot_resume_matches_uninterrupted_run() {
    for seed in 100..108 {
        let (memory, overrides) = random_machine(seed);
        let original = engine(memory, overrides);
        advance(&original, STEPS / 4);

        let saved = original.state();
        let saved_memory = original.with_memory(|m| m.clone());
        advance(&original, STEPS - STEPS / 4);

        let resumed = engine(saved_memory, ResetOverrides::default());
        resumed.load_snapshot(saved);
        advance(&resumed, STEPS - STEPS / 4);

        assert_eq!(original.state(), resumed.state(), "seed {seed}");
        assert_eq!(original.cycles(), resumed.cycles());
    }
}

#[test]
fn test_vector_state_survives_cpu_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x2A);
    for _ in 0..64 {
        let state = Z80CpuState {
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
            ei: rng.gen_range(0..=1),
            wz: rng.r#gen(),
            ix: rng.r#gen(),
            iy: rng.r#gen(),
            af_prime: rng.r#gen(),
            bc_prime: rng.r#gen(),
            de_prime: rng.r#gen(),
            hl_prime: rng.r#gen(),
            im: rng.gen_range(0..=2),
            p: rng.gen_range(0..=1),
            q: rng.r#gen(),
            iff1: rng.gen_range(0..=1),
            iff2: rng.gen_range(0..=1),
            ram: Vec::new(),
        };
        let mut cpu = Z80::new();
        state.apply(&mut cpu);
        assert_eq!(Z80CpuState::from_cpu(&cpu), state);
    }
}
