/// Generic CPU interface
pub trait Cpu: CpuStateTrait {
    /// Return to the power-on state
    fn reset(&mut self);

    /// Latch a non-maskable interrupt request (edge triggered)
    fn signal_nmi(&mut self);

    /// Drive the maskable interrupt line (level triggered)
    fn set_int_line(&mut self, active: bool);

    /// Query if CPU is halted internally (HALT instruction)
    fn is_sleeping(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, Z80State};

pub mod z80;
pub use z80::Z80;
