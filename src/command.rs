use bit::BitIndex;

use crate::descriptor::{Descriptor, Opcodes};

/// Commands understood by the flash controller
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    WritePage,
    ErasePage,
    ClearPageBuffer,
    LockRegion,
    UnlockRegion,
    EraseAll,
    WriteUserPage,
    EraseUserPage,
}

impl Command {
    pub fn opcode(self, opcodes: &Opcodes) -> u8 {
        match self {
            Command::WritePage => opcodes.write_page,
            Command::ErasePage => opcodes.erase_page,
            Command::ClearPageBuffer => opcodes.clear_page_buffer,
            Command::LockRegion => opcodes.lock_region,
            Command::UnlockRegion => opcodes.unlock_region,
            Command::EraseAll => opcodes.erase_all,
            Command::WriteUserPage => opcodes.write_user_page,
            Command::EraseUserPage => opcodes.erase_user_page,
        }
    }
}

/// A value for the command register: key, page number and opcode.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandWord(pub u32);

impl CommandWord {
    /// Build the word for `cmd`. `page` is truncated to the page number field, commands that
    /// don't target a page take 0.
    pub(crate) fn new(desc: &Descriptor, cmd: Command, page: u32) -> Self {
        let shift = desc.page_number_shift as usize;
        let width = desc.page_number_width;
        let mut word: u32 = 0;
        word.set_bit_range(0..5, cmd.opcode(&desc.opcodes) as u32 & 0x1F);
        word.set_bit_range(shift..shift + width as usize, page & field_mask(width));
        word.set_bit_range(24..32, desc.key as u32);
        CommandWord(word)
    }

    pub fn opcode(self) -> u8 {
        self.0.bit_range(0..5) as u8
    }

    pub fn page(self, desc: &Descriptor) -> u32 {
        let shift = desc.page_number_shift as usize;
        self.0.bit_range(shift..shift + desc.page_number_width as usize)
    }

    pub fn key(self) -> u8 {
        self.0.bit_range(24..32) as u8
    }
}

/// Mask of the low `width` bits
const fn field_mask(width: u32) -> u32 {
    match 1u32.checked_shl(width) {
        Some(bit) => bit - 1,
        None => u32::MAX,
    }
}

impl From<CommandWord> for u32 {
    fn from(word: CommandWord) -> u32 {
        word.0
    }
}
