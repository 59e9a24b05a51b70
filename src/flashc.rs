use crate::{
    command::{Command, CommandWord},
    descriptor::Descriptor,
    error::Error,
    register::*,
    transport::{Clock, MemAccess, UnitSize},
    READY_TIMEOUT_MS,
};

/// Driver for the FLASHC controller of one target, reached through a debug transport.
///
/// The driver owns the transport for its lifetime; pass `&mut transport` to only lend it.
/// Every operation takes `&mut self`, so only one command sequence can be in flight.
pub struct Flashc<M, C>
where
    M: MemAccess,
    C: Clock,
{
    mem: M,
    clock: C,
    pub(crate) desc: Descriptor,
}

impl<M, C, E> Flashc<M, C>
where
    M: MemAccess<Error = E>,
    C: Clock,
{
    /// Create a new instance, fails with [`Error::Value`] if the descriptor is inconsistent
    pub fn new(mem: M, clock: C, desc: Descriptor) -> Result<Self, Error<E>> {
        if !desc.is_valid() {
            return Err(Error::Value);
        }
        Ok(Self { mem, clock, desc })
    }

    /// Release the transport and the clock
    pub fn free(self) -> (M, C) {
        (self.mem, self.clock)
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    fn read_register(&mut self, offset: u32) -> Result<u32, Error<E>> {
        let address = self.desc.register(offset);
        self.mem.read_word(address).map_err(Error::Transport)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<(), Error<E>> {
        let address = self.desc.register(offset);
        self.mem.write_word(address, value).map_err(Error::Transport)
    }

    fn check_unit(address: u32, unit: UnitSize, len: usize) -> Result<(), Error<E>> {
        let bytes = unit.bytes();
        if address as usize % bytes != 0 || len % bytes != 0 {
            return Err(Error::NotAligned);
        }
        Ok(())
    }

    /// Read flash content at `offset` from the flash base address
    pub(crate) fn read_memory(
        &mut self,
        offset: u32,
        unit: UnitSize,
        buf: &mut [u8],
    ) -> Result<(), Error<E>> {
        let address = self.desc.address(offset);
        Self::check_unit(address, unit, buf.len())?;
        self.mem.read_block(address, unit, buf).map_err(Error::Transport)
    }

    /// Fill the page buffer through the flash window at `offset` from the flash base address
    pub(crate) fn write_memory(
        &mut self,
        offset: u32,
        unit: UnitSize,
        data: &[u8],
    ) -> Result<(), Error<E>> {
        let address = self.desc.address(offset);
        Self::check_unit(address, unit, data.len())?;
        let res = self
            .mem
            .write_block(address, unit, data)
            .map_err(Error::WriteFailed);
        #[cfg(feature = "defmt")]
        if res.is_err() {
            defmt::error!("memory write at {=u32:#x} failed", address);
        }
        res
    }

    /// Read the status register once
    pub fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let fsr = self.read_register(self.desc.registers.status)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("fsr: {=u32:#x}", fsr);
        Ok(fsr.into())
    }

    /// Poll the status register until the controller is ready.
    ///
    /// Lock and programming errors are reported as soon as they are seen, the poll gives up
    /// with [`Error::Timeout`] after [`READY_TIMEOUT_MS`].
    pub fn wait_ready(&mut self) -> Result<StatusRegister, Error<E>> {
        let start = self.clock.now_ms();
        loop {
            let status = self.read_status()?;
            if status.lock_error {
                return Err(Error::LockError);
            }
            if status.program_error {
                return Err(Error::ProgramError);
            }
            if status.ready {
                return Ok(status);
            }
            if self.clock.now_ms().saturating_sub(start) >= READY_TIMEOUT_MS {
                #[cfg(feature = "defmt")]
                defmt::debug!("flash not ready after {=u64} ms", READY_TIMEOUT_MS);
                return Err(Error::Timeout);
            }
        }
    }

    /// Issue `cmd` on `page`, waiting for the controller before and after
    pub(crate) fn command(&mut self, cmd: Command, page: u32) -> Result<(), Error<E>> {
        let word = CommandWord::new(&self.desc, cmd, page);
        self.wait_ready()?;
        #[cfg(feature = "defmt")]
        defmt::debug!("command {}: {=u32:#x}", cmd, word.0);
        self.write_register(self.desc.registers.command, word.into())?;
        self.wait_ready()?;
        Ok(())
    }

    /// Clear the page buffer. Required before each fill of the buffer.
    pub fn clear_page_buffer(&mut self) -> Result<(), Error<E>> {
        self.command(Command::ClearPageBuffer, 0)
    }

    /// Read the parameter register
    pub fn read_parameter(&mut self) -> Result<ParameterRegister, Error<E>> {
        Ok(self.read_register(self.desc.registers.parameter)?.into())
    }

    /// Size of the main array as reported by the controller, `None` if the size class is unknown
    pub fn flash_size(&mut self) -> Result<Option<u32>, Error<E>> {
        let pr = self.read_parameter()?;
        let size = pr.flash_size.bytes();
        #[cfg(feature = "defmt")]
        match size {
            Some(size) => defmt::debug!("flash size is {=u32} bytes", size),
            None => defmt::debug!("unknown flash size class {=u8}", pr.flash_size.0),
        }
        Ok(size)
    }

    /// Replace the descriptor's main array size with the one reported by the controller
    pub fn detect_device_size(&mut self) -> Result<u32, Error<E>> {
        let size = self.flash_size()?.ok_or(Error::Value)?;
        let desc = self.desc.with_device_size(size);
        if !desc.is_valid() {
            return Err(Error::Value);
        }
        self.desc = desc;
        Ok(size)
    }

    /// Read the version register
    pub fn read_version(&mut self) -> Result<VersionRegister, Error<E>> {
        Ok(self.read_register(self.desc.registers.version)?.into())
    }

    /// Read the general purpose fuses, including the region lock bits
    pub fn read_fuses(&mut self) -> Result<GpFuses, Error<E>> {
        let high = self.read_register(self.desc.registers.fuses_high)?;
        let low = self.read_register(self.desc.registers.fuses_low)?;
        Ok(GpFuses { high, low })
    }

    /// Issue `cmd` once for every page from `offset / page_size` to `(offset + size) / page_size`,
    /// both included
    fn walk_pages(&mut self, cmd: Command, offset: u32, size: u32) -> Result<(), Error<E>> {
        let device_size = self.desc.device_size;
        if offset >= device_size || size > device_size - offset {
            #[cfg(feature = "defmt")]
            defmt::error!("region {=u32:#x}+{=u32:#x} outside of the flash", offset, size);
            return Err(Error::OutOfRange);
        }
        let first = offset / self.desc.page_size;
        let last = (offset + size) / self.desc.page_size;
        for page in first..=last {
            self.command(cmd, page)?;
        }
        Ok(())
    }

    /// Unlock every page touched by `[offset, offset + size)`.
    ///
    /// A range inside the user page is accepted without any command, the user page has no lock.
    pub fn unlock_region(&mut self, offset: u32, size: u32) -> Result<(), Error<E>> {
        if self.desc.in_user_page(offset, size) {
            return Ok(());
        }
        self.walk_pages(Command::UnlockRegion, offset, size)
    }

    /// Unlock the whole main array
    pub fn unlock_entire_flash(&mut self) -> Result<(), Error<E>> {
        self.unlock_region(0, self.desc.device_size)
    }

    /// Lock every page touched by `[offset, offset + size)`. Same rules as [`Self::unlock_region`].
    pub fn lock_region(&mut self, offset: u32, size: u32) -> Result<(), Error<E>> {
        if self.desc.in_user_page(offset, size) {
            return Ok(());
        }
        self.walk_pages(Command::LockRegion, offset, size)
    }

    /// Erase the whole main array
    pub fn erase_all(&mut self) -> Result<(), Error<E>> {
        self.command(Command::EraseAll, 0)
    }

    /// Erase a single page of the main array
    pub fn erase_page(&mut self, page: u32) -> Result<(), Error<E>> {
        if page >= self.desc.page_count() {
            return Err(Error::OutOfRange);
        }
        self.command(Command::ErasePage, page)
    }

    /// Erase the user page
    pub fn erase_user_page(&mut self) -> Result<(), Error<E>> {
        self.command(Command::EraseUserPage, 0)
    }
}

/// Implementation of the `NorFlash` traits of the `embedded_storage` crate over the main array.
/// Regions must be unlocked before writing or erasing, see [`Flashc::unlock_region`].
mod es {
    use super::*;
    use crate::{check_erase, check_write};
    use core::fmt::Debug;
    use embedded_storage::nor_flash::{
        ErrorType, MultiwriteNorFlash, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
    };

    impl<E> From<NorFlashErrorKind> for Error<E> {
        fn from(e: NorFlashErrorKind) -> Self {
            match e {
                NorFlashErrorKind::NotAligned => Error::NotAligned,
                NorFlashErrorKind::OutOfBounds => Error::OutOfRange,
                _ => Error::Value,
            }
        }
    }

    impl<E> NorFlashError for Error<E>
    where
        E: Debug,
    {
        fn kind(&self) -> NorFlashErrorKind {
            match self {
                Error::OutOfRange => NorFlashErrorKind::OutOfBounds,
                Error::NotAligned => NorFlashErrorKind::NotAligned,
                _ => NorFlashErrorKind::Other,
            }
        }
    }

    impl<M, C, E> ErrorType for Flashc<M, C>
    where
        M: MemAccess<Error = E>,
        C: Clock,
        E: Debug,
    {
        type Error = Error<E>;
    }

    impl<M, C, E> ReadNorFlash for Flashc<M, C>
    where
        M: MemAccess<Error = E>,
        C: Clock,
        E: Debug,
    {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            Flashc::read(self, offset, bytes)
        }

        fn capacity(&self) -> usize {
            self.desc.device_size as usize
        }
    }

    impl<M, C, E> NorFlash for Flashc<M, C>
    where
        M: MemAccess<Error = E>,
        C: Clock,
        E: Debug,
    {
        const WRITE_SIZE: usize = 1;
        /// UC3 parts all use 512 byte pages. Erasing through this trait fails with
        /// [`Error::Value`] on a descriptor with another page size, use
        /// [`Flashc::erase_page`] there.
        const ERASE_SIZE: usize = crate::MAX_PAGE_SIZE;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            let page_size = self.desc.page_size;
            if page_size as usize != Self::ERASE_SIZE {
                return Err(Error::Value);
            }
            check_erase(self.desc.device_size, page_size, from, to)?;
            for page in from / page_size..to / page_size {
                self.erase_page(page)?;
            }
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            check_write(self.desc.device_size, offset, bytes.len())?;
            self.program(offset, bytes)
        }
    }

    impl<M, C, E> MultiwriteNorFlash for Flashc<M, C>
    where
        M: MemAccess<Error = E>,
        C: Clock,
        E: Debug,
    {
    }
}
