//! Programming of the main array and of the user page through the page buffer.

use crate::{
    check_read, check_write,
    command::Command,
    error::Error,
    flashc::Flashc,
    transport::{Clock, MemAccess, UnitSize},
    MAX_PAGE_SIZE,
};

impl<M, C, E> Flashc<M, C>
where
    M: MemAccess<Error = E>,
    C: Clock,
{
    /// Program `data` at `offset` from the flash base.
    ///
    /// An `offset` inside the user page window is handed to [`Self::program_user_page`] as a
    /// whole. Otherwise the range must fit in the main array. Each touched page is written
    /// through the page buffer; bytes of a partially covered page keep their current value.
    /// Pages committed before a failure stay committed. The pages must be unlocked beforehand.
    pub fn program(&mut self, offset: u32, data: &[u8]) -> Result<(), Error<E>> {
        let desc = self.desc;
        if offset >= desc.user_page_offset && offset - desc.user_page_offset < desc.user_page_size {
            return self.program_user_page(offset - desc.user_page_offset, data);
        }
        if let Err(e) = check_write(desc.device_size, offset, data.len()) {
            #[cfg(feature = "defmt")]
            defmt::error!("region to program lies outside of the flash");
            return Err(e);
        }

        let page_size = desc.page_size;
        let mut buff = [0xFF; MAX_PAGE_SIZE];
        let buff = &mut buff[..page_size as usize];
        let mut offset = offset;
        let mut remaining = data;
        while !remaining.is_empty() {
            let page = offset & !(page_size - 1);
            let start = (offset - page) as usize;
            let len = ((page + page_size - offset) as usize).min(remaining.len());

            self.clear_page_buffer()?;
            if start != 0 || len != buff.len() {
                self.read_memory(page, UnitSize::Word, buff)?;
            } else {
                buff.fill(0xFF);
            }
            buff[start..start + len].copy_from_slice(&remaining[..len]);

            #[cfg(feature = "defmt")]
            defmt::trace!("page {=u32:#x}: {=[u8]:x}", page, &buff[..]);
            self.write_memory(page, UnitSize::Word, buff)?;
            self.command(Command::WritePage, offset / page_size)?;
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "page {=u32} written, {=usize} bytes left",
                offset / page_size,
                remaining.len() - len
            );

            offset = page + page_size;
            remaining = &remaining[len..];
        }
        Ok(())
    }

    /// Program `data` at `offset` within the user page, keeping the other bytes of the page.
    pub fn program_user_page(&mut self, offset: u32, data: &[u8]) -> Result<(), Error<E>> {
        let page_size = self.desc.user_page_size;
        let user_page = self.desc.user_page_offset;
        if let Err(e) = check_write(page_size, offset, data.len()) {
            #[cfg(feature = "defmt")]
            defmt::error!("tried to program past the user page boundary");
            return Err(e);
        }
        if data.is_empty() {
            return Ok(());
        }

        let mut buff = [0xFF; MAX_PAGE_SIZE];
        let buff = &mut buff[..page_size as usize];
        let start = offset as usize;
        if start != 0 || data.len() < buff.len() {
            self.read_memory(user_page, UnitSize::Byte, buff)?;
        }
        self.clear_page_buffer()?;
        buff[start..start + data.len()].copy_from_slice(data);

        self.write_memory(user_page, UnitSize::Byte, buff)?;
        self.command(Command::WriteUserPage, 0)
    }

    /// Read `buf.len()` bytes of the main array at `offset`
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Error<E>> {
        check_read(self.desc.device_size, offset, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        self.read_memory(offset, UnitSize::Byte, buf)
    }

    /// Read `buf.len()` bytes of the user page at `offset` within the page
    pub fn read_user_page(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Error<E>> {
        check_read(self.desc.user_page_size, offset, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        let address = self.desc.user_page_offset + offset;
        self.read_memory(address, UnitSize::Byte, buf)
    }
}
