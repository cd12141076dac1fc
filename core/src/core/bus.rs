/// Byte-addressable memory seen by the CPU over a flat 16-bit address space.
///
/// Implementations are total: every address reads and writes without failing.
/// Banking, mirroring and ROM write-protection are the implementor's concern.
pub trait Memory {
    fn read_byte(&mut self, addr: u16) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8);

    /// Little-endian word read; the high byte comes from `addr + 1` (wrapping).
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian word write; the high byte goes to `addr + 1` (wrapping).
    fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, value as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }
}

/// Z80 I/O port space (separate from memory). The full 16-bit port address is
/// passed through; most hardware only decodes the low byte.
pub trait IoPorts {
    fn in_port(&mut self, port: u16) -> u8;
    fn out_port(&mut self, port: u16, value: u8);
}

/// Everything the interpreter talks to during a step.
///
/// I/O defaults model an empty port space: reads float high, writes vanish.
pub trait Bus: Memory {
    fn io_read(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn io_write(&mut self, _port: u16, _value: u8) {}
}

impl Memory for [u8; 0x10000] {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self[addr as usize] = value;
    }
}

impl Memory for Box<[u8; 0x10000]> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self[addr as usize] = value;
    }
}

/// Short images: addresses past the end read as 0xFF and ignore writes.
impl Memory for Vec<u8> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0xFF)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        if let Some(slot) = self.get_mut(addr as usize) {
            *slot = value;
        }
    }
}

/// Joins a host memory with an optional I/O handler for the duration of a step.
pub struct HostBus<'a, M: Memory + ?Sized> {
    pub memory: &'a mut M,
    pub io: Option<&'a mut (dyn IoPorts + Send)>,
}

impl<'a, M: Memory + ?Sized> HostBus<'a, M> {
    pub fn new(memory: &'a mut M, io: Option<&'a mut (dyn IoPorts + Send)>) -> Self {
        Self { memory, io }
    }
}

impl<M: Memory + ?Sized> Memory for HostBus<'_, M> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.memory.read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory.write_byte(addr, value);
    }
}

impl<M: Memory + ?Sized> Bus for HostBus<'_, M> {
    fn io_read(&mut self, port: u16) -> u8 {
        match self.io.as_deref_mut() {
            Some(io) => io.in_port(port),
            None => 0xFF,
        }
    }

    fn io_write(&mut self, port: u16, value: u8) {
        if let Some(io) = self.io.as_deref_mut() {
            io.out_port(port, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_access_wraps_at_top_of_memory() {
        let mut mem = Box::new([0u8; 0x10000]);
        mem.write_word(0xFFFF, 0x1234);
        assert_eq!(mem[0xFFFF], 0x34);
        assert_eq!(mem[0x0000], 0x12);
        assert_eq!(mem.read_word(0xFFFF), 0x1234);
    }

    #[test]
    fn short_vec_reads_open_bus_past_end() {
        let mut mem = vec![0x3C; 4];
        assert_eq!(mem.read_byte(3), 0x3C);
        assert_eq!(mem.read_byte(4), 0xFF);
        mem.write_byte(100, 0x00);
        assert_eq!(mem.len(), 4);
    }

    #[test]
    fn host_bus_without_io_floats_high() {
        let mut mem = Box::new([0u8; 0x10000]);
        let mut bus = HostBus::new(&mut mem, None);
        assert_eq!(bus.io_read(0x00FE), 0xFF);
        bus.io_write(0x00FE, 0x12);
    }
}
