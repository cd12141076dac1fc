//! Minimal CP/M environment for the ZEXDOC/ZEXALL exercisers.
//!
//! Memory layout:
//! - 0x0000: warm boot, a HALT that ends the run
//! - 0x0005: BDOS entry, a RET; calls are observed just before it executes
//! - 0x0006: top of the TPA (programs load SP from here)
//! - 0x0100: program load address

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use zeal_core::prelude::*;

use crate::error::RunnerError;

pub const WARM_BOOT: u16 = 0x0000;
pub const BDOS: u16 = 0x0005;
pub const TPA_START: u16 = 0x0100;
pub const TPA_TOP: u16 = 0xFE00;

/// Register values captured on entry to the BDOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdosCall {
    pub function: u8,
    pub e: u8,
    pub de: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The program returned to 0x0000.
    WarmBoot,
    /// BDOS function 0.
    SystemReset,
    /// Some other HALT.
    Halted,
    CycleLimit,
}

/// Shared slot the pre-execution hook fills when PC reaches the BDOS.
#[derive(Clone, Default)]
pub struct BdosTrap(Arc<Mutex<Option<BdosCall>>>);

impl BdosTrap {
    fn take(&self) -> Option<BdosCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// The hook to install in the engine configuration.
    pub fn hook(&self) -> impl ExecHook + Send + 'static {
        let slot = Arc::clone(&self.0);
        move |cpu: &Z80, instr: &Instruction| {
            if instr.pc == BDOS {
                let regs = &cpu.regs;
                let call = BdosCall { function: regs.c, e: regs.e, de: regs.de() };
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(call);
            }
        }
    }
}

/// Build the 64K memory image with `com` loaded at the TPA start.
pub fn memory_image(com: &[u8]) -> Result<Vec<u8>, RunnerError> {
    let start = TPA_START as usize;
    if com.len() > TPA_TOP as usize - start {
        return Err(RunnerError::ImageTooLarge { len: com.len(), load_address: TPA_START });
    }
    let mut memory = vec![0u8; 0x10000];
    memory[WARM_BOOT as usize] = 0x76; // HALT
    memory[BDOS as usize] = 0xC9; // RET
    memory[BDOS as usize + 1..BDOS as usize + 3].copy_from_slice(&TPA_TOP.to_le_bytes());
    memory[start..start + com.len()].copy_from_slice(com);
    Ok(memory)
}

/// Initial registers: PC at the TPA, with 0x0000 already pushed as the
/// return address so a final RET warm-boots.
pub fn reset_overrides() -> ResetOverrides {
    ResetOverrides {
        pc: Some(TPA_START),
        sp: Some(TPA_TOP.wrapping_sub(2)),
        ..ResetOverrides::default()
    }
}

/// Run until warm boot, system reset, HALT or `max_cycles`, writing console
/// output to `out`.
pub fn run(
    engine: &Engine<Vec<u8>>,
    trap: &BdosTrap,
    max_cycles: u64,
    out: &mut impl Write,
) -> Result<Exit, RunnerError> {
    loop {
        if engine.cycles() >= max_cycles {
            return Ok(Exit::CycleLimit);
        }
        engine.step()?;

        if let Some(call) = trap.take() {
            log::debug!("BDOS function {} (DE={:04X})", call.function, call.de);
            match call.function {
                0 => return Ok(Exit::SystemReset),
                2 => console_write(out, &[call.e]),
                9 => {
                    let text = engine.with_memory(|m| dollar_string(m, call.de));
                    console_write(out, &text);
                }
                f => log::warn!("unsupported BDOS function {f}"),
            }
        }

        if engine.halted() {
            let pc = engine.state().regs.pc;
            return Ok(if pc == WARM_BOOT { Exit::WarmBoot } else { Exit::Halted });
        }
    }
}

fn console_write(out: &mut impl Write, bytes: &[u8]) {
    if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
        log::warn!("console write failed: {e}");
    }
}

/// Bytes from `addr` up to (not including) the first `$`.
fn dollar_string(memory: &[u8], addr: u16) -> Vec<u8> {
    let mut text = Vec::new();
    let mut addr = addr;
    loop {
        let byte = memory[addr as usize];
        if byte == b'$' || text.len() == memory.len() {
            return text;
        }
        text.push(byte);
        addr = addr.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(com: &[u8], trap: &BdosTrap) -> Engine<Vec<u8>> {
        let config = EngineConfig::new()
            .with_interrupts(false)
            .with_hook(trap.hook())
            .with_reset_overrides(reset_overrides());
        Engine::new(memory_image(com).unwrap(), config).unwrap()
    }

    #[test]
    fn prints_and_returns_to_warm_boot() {
        #[rustfmt::skip]
        let com = [
            0x0E, 0x09,             // LD C,9
            0x11, 0x10, 0x01,       // LD DE,msg
            0xCD, 0x05, 0x00,       // CALL BDOS
            0x0E, 0x02,             // LD C,2
            0x1E, b'!',             // LD E,'!'
            0xCD, 0x05, 0x00,       // CALL BDOS
            0xC9,                   // RET
            b'H', b'I', b'$',       // msg
        ];
        let trap = BdosTrap::default();
        let engine = engine_for(&com, &trap);
        let mut out = Vec::new();

        let exit = run(&engine, &trap, 10_000, &mut out).unwrap();
        assert_eq!(exit, Exit::WarmBoot);
        assert_eq!(out, b"HI!");
    }

    #[test]
    fn function_zero_ends_the_run() {
        let com = [0x0E, 0x00, 0xCD, 0x05, 0x00, 0x76]; // LD C,0 ; CALL BDOS ; HALT
        let trap = BdosTrap::default();
        let engine = engine_for(&com, &trap);

        let exit = run(&engine, &trap, 10_000, &mut Vec::new()).unwrap();
        assert_eq!(exit, Exit::SystemReset);
        assert_eq!(engine.state().regs.pc, 0x0105, "the BDOS RET has already returned");
    }

    #[test]
    fn stack_starts_below_tpa_top() {
        let com = [0x2A, 0x06, 0x00, 0xF9, 0x76]; // LD HL,(6) ; LD SP,HL ; HALT
        let trap = BdosTrap::default();
        let engine = engine_for(&com, &trap);

        assert_eq!(run(&engine, &trap, 10_000, &mut Vec::new()).unwrap(), Exit::Halted);
        assert_eq!(engine.state().regs.sp, TPA_TOP);
    }

    #[test]
    fn cycle_limit_stops_a_spinning_program() {
        let com = [0x18, 0xFE]; // JR $
        let trap = BdosTrap::default();
        let engine = engine_for(&com, &trap);

        assert_eq!(run(&engine, &trap, 1_000, &mut Vec::new()).unwrap(), Exit::CycleLimit);
        assert!(engine.cycles() >= 1_000);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let com = vec![0u8; 0x10000];
        assert!(matches!(memory_image(&com), Err(RunnerError::ImageTooLarge { .. })));
    }
}
