//! Per-device description of the flash controller and its memory map.

use crate::MAX_PAGE_SIZE;

/// Offsets of the FLASHC registers, relative to [`Descriptor::controller_base`]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Control register (FCR)
    pub control: u32,
    /// Command register (FCMD)
    pub command: u32,
    /// Status register (FSR)
    pub status: u32,
    /// Parameter register (PR)
    pub parameter: u32,
    /// Version register (VR)
    pub version: u32,
    /// General purpose fuse register, high word (FGPFRHI)
    pub fuses_high: u32,
    /// General purpose fuse register, low word (FGPFRLO)
    pub fuses_low: u32,
}

impl RegisterMap {
    pub const FLASHC: RegisterMap = RegisterMap {
        control: 0x00,
        command: 0x04,
        status: 0x08,
        parameter: 0x0C,
        version: 0x10,
        fuses_high: 0x14,
        fuses_low: 0x18,
    };
}

/// Opcodes written into the FCMD field of the command register
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcodes {
    pub write_page: u8,
    pub erase_page: u8,
    pub clear_page_buffer: u8,
    pub lock_region: u8,
    pub unlock_region: u8,
    pub erase_all: u8,
    pub write_user_page: u8,
    pub erase_user_page: u8,
}

impl Opcodes {
    pub const FLASHC: Opcodes = Opcodes {
        write_page: 1,
        erase_page: 2,
        clear_page_buffer: 3,
        lock_region: 4,
        unlock_region: 5,
        erase_all: 6,
        write_user_page: 13,
        erase_user_page: 14,
    };
}

/// Everything the driver needs to know about one device model.
///
/// Addresses of the main array and of the user page are given as offsets from `base_address`,
/// which is where the flash is mapped in the target's address space.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Address the flash is mapped at
    pub base_address: u32,
    /// Address of the FLASHC register block
    pub controller_base: u32,
    pub registers: RegisterMap,
    /// Size of the main array in bytes
    pub device_size: u32,
    /// Page size in bytes, a power of two no larger than [`MAX_PAGE_SIZE`]
    pub page_size: u32,
    /// Offset of the user page from `base_address`
    pub user_page_offset: u32,
    /// Size of the user page in bytes, at most [`MAX_PAGE_SIZE`]
    pub user_page_size: u32,
    /// Write protection key placed in the top byte of every command
    pub key: u8,
    /// Bit position of the page number field in the command register
    pub page_number_shift: u32,
    /// Width of the page number field in bits
    pub page_number_width: u32,
    pub opcodes: Opcodes,
}

impl Descriptor {
    /// FLASHC layout shared by the UC3A/UC3B parts, with the given main array size
    pub const fn uc3(device_size: u32) -> Self {
        Descriptor {
            base_address: 0x8000_0000,
            controller_base: 0xFFFE_0000,
            registers: RegisterMap::FLASHC,
            device_size,
            page_size: 512,
            user_page_offset: 0x0080_0000,
            user_page_size: 512,
            key: 0xA5,
            page_number_shift: 8,
            page_number_width: 16,
            opcodes: Opcodes::FLASHC,
        }
    }

    /// The same descriptor with another main array size, see
    /// [`crate::flashc::Flashc::detect_device_size`]
    pub const fn with_device_size(self, device_size: u32) -> Self {
        Descriptor { device_size, ..self }
    }

    pub(crate) fn is_valid(&self) -> bool {
        let max = MAX_PAGE_SIZE as u32;
        self.page_size.is_power_of_two()
            && self.page_size >= 4
            && self.page_size <= max
            && self.user_page_size > 0
            && self.user_page_size <= max
            && self.device_size % self.page_size == 0
            && self.page_number_width > 0
            && self.page_number_shift + self.page_number_width <= 24
            && self.user_page_offset >= self.device_size
            && self.fits_address_space()
    }

    /// The main array, the user page window and the register block all lie below 4 GiB
    fn fits_address_space(&self) -> bool {
        let r = &self.registers;
        let last_register = [
            r.control,
            r.command,
            r.status,
            r.parameter,
            r.version,
            r.fuses_high,
            r.fuses_low,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        self.base_address.checked_add(self.device_size).is_some()
            && self
                .base_address
                .checked_add(self.user_page_offset)
                .and_then(|a| a.checked_add(self.user_page_size))
                .is_some()
            && self
                .controller_base
                .checked_add(last_register)
                .and_then(|a| a.checked_add(4))
                .is_some()
    }

    /// Number of pages in the main array
    pub const fn page_count(&self) -> u32 {
        self.device_size / self.page_size
    }

    pub(crate) fn register(&self, offset: u32) -> u32 {
        self.controller_base.wrapping_add(offset)
    }

    /// Address of `offset` from the flash base
    pub(crate) fn address(&self, offset: u32) -> u32 {
        self.base_address.wrapping_add(offset)
    }

    /// Whether `[offset, offset + size)` lies wholly inside the user page window
    pub(crate) fn in_user_page(&self, offset: u32, size: u32) -> bool {
        let start = self.user_page_offset;
        let end = start.saturating_add(self.user_page_size);
        offset >= start && offset < end && size <= end - offset
    }
}

/// AT32UC3A0512 / AT32UC3A1512, 512 KiB
pub const AT32UC3A0512: Descriptor = Descriptor::uc3(512 * 1024);

/// AT32UC3A0256 / AT32UC3A1256 / AT32UC3B0256, 256 KiB
pub const AT32UC3A0256: Descriptor = Descriptor::uc3(256 * 1024);

/// AT32UC3A0128 / AT32UC3A1128 / AT32UC3B0128, 128 KiB
pub const AT32UC3A0128: Descriptor = Descriptor::uc3(128 * 1024);

/// AT32UC3B064, 64 KiB
pub const AT32UC3B064: Descriptor = Descriptor::uc3(64 * 1024);
