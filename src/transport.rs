//! The seams to the debug link: memory mapped accesses and a millisecond clock.

/// Width of a single access in a memory block transfer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSize {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
}

impl UnitSize {
    /// Size of one unit in bytes
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Memory mapped access to the target, usually a debug probe session.
///
/// Implementations pass requests through to the link without retrying or interpreting them.
/// Blocks are handed over as little endian byte buffers whose length is a multiple of the
/// unit size; the number of units is `buf.len() / unit.bytes()`.
pub trait MemAccess {
    type Error;

    /// Read one 32-bit register
    fn read_word(&mut self, address: u32) -> Result<u32, Self::Error>;

    /// Write one 32-bit register
    fn write_word(&mut self, address: u32, value: u32) -> Result<(), Self::Error>;

    /// Read a block of memory using accesses of `unit` width
    fn read_block(
        &mut self,
        address: u32,
        unit: UnitSize,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Write a block of memory using accesses of `unit` width
    fn write_block(&mut self, address: u32, unit: UnitSize, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: MemAccess + ?Sized> MemAccess for &mut T {
    type Error = T::Error;

    fn read_word(&mut self, address: u32) -> Result<u32, Self::Error> {
        T::read_word(self, address)
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), Self::Error> {
        T::write_word(self, address, value)
    }

    fn read_block(
        &mut self,
        address: u32,
        unit: UnitSize,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::read_block(self, address, unit, buf)
    }

    fn write_block(
        &mut self,
        address: u32,
        unit: UnitSize,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        T::write_block(self, address, unit, data)
    }
}

/// Monotonic millisecond time source used to bound status polling.
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&mut self) -> u64 {
        T::now_ms(self)
    }
}

/// Wall clock for host side tools
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&mut self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
