#![allow(dead_code)]

use uc3_flash::{
    command::CommandWord,
    descriptor::Descriptor,
    flashc::Flashc,
    transport::{Clock, MemAccess, UnitSize},
};

pub const FSR_READY: u32 = 1 << 0;
pub const FSR_LOCKE: u32 = 1 << 2;
pub const FSR_PROGE: u32 = 1 << 3;

/// One transaction seen by the simulated target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ReadWord(u32),
    WriteWord(u32, u32),
    ReadBlock { address: u32, unit: UnitSize, len: usize },
    WriteBlock { address: u32, unit: UnitSize, data: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFault;

/// A FLASHC model behind a debug link.
///
/// Writes into the flash windows land in the page buffer, commands commit it. Commits copy the
/// buffer as is, there is no bit-clearing model.
pub struct SimFlash {
    pub desc: Descriptor,
    pub flash: Vec<u8>,
    pub user_page: Vec<u8>,
    pub page_buffer: Vec<u8>,
    pub locked: Vec<bool>,
    pub ops: Vec<Op>,
    pub parameter: u32,
    pub version: u32,
    pub fuses: (u32, u32),
    /// Replaces every status read when set
    pub status_override: Option<u32>,
    /// Status reads answering busy after each command
    pub busy_reads: usize,
    /// Index of the block write that fails
    pub fail_block_write: Option<usize>,
    /// Register address whose accesses fail
    pub fault_register: Option<u32>,
    block_writes: usize,
    busy_left: usize,
    pending_error: u32,
}

impl SimFlash {
    pub fn new(desc: Descriptor) -> Self {
        let flash = (0..desc.device_size).map(|i| (i as u8).wrapping_mul(7) ^ 0x5A).collect();
        let user_page = (0..desc.user_page_size).map(|i| (i as u8) ^ 0xC3).collect();
        SimFlash {
            flash,
            user_page,
            page_buffer: vec![0xFF; desc.page_size as usize],
            locked: vec![false; desc.page_count() as usize],
            ops: Vec::new(),
            // FSZ = 11, 512 KiB
            parameter: 0x0000_000B,
            version: 0x0002_0102,
            fuses: (0xFFFF_FFFF, 0xFFFF_FFFF),
            status_override: None,
            busy_reads: 0,
            fail_block_write: None,
            fault_register: None,
            block_writes: 0,
            busy_left: 0,
            pending_error: 0,
            desc,
        }
    }

    fn reg(&self, offset: u32) -> u32 {
        self.desc.controller_base + offset
    }

    pub fn page(&self, page: u32) -> &[u8] {
        let ps = self.desc.page_size as usize;
        &self.flash[page as usize * ps..(page as usize + 1) * ps]
    }

    /// Every command word written, in order
    pub fn commands(&self) -> Vec<CommandWord> {
        let fcmd = self.reg(self.desc.registers.command);
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::WriteWord(address, value) if *address == fcmd => Some(CommandWord(*value)),
                _ => None,
            })
            .collect()
    }

    /// Page numbers of the commands with `opcode`, in order
    pub fn pages_of(&self, opcode: u8) -> Vec<u32> {
        self.commands()
            .into_iter()
            .filter(|c| c.opcode() == opcode)
            .map(|c| c.page(&self.desc))
            .collect()
    }

    pub fn block_writes(&self) -> Vec<(u32, UnitSize, Vec<u8>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::WriteBlock { address, unit, data } => Some((*address, *unit, data.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn block_reads(&self) -> Vec<(u32, UnitSize, usize)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::ReadBlock { address, unit, len } => Some((*address, *unit, *len)),
                _ => None,
            })
            .collect()
    }

    /// Assert that every command write sits between two status reads
    pub fn assert_bracketed(&self) {
        let fcmd = self.reg(self.desc.registers.command);
        let fsr = Op::ReadWord(self.reg(self.desc.registers.status));
        for (i, op) in self.ops.iter().enumerate() {
            if let Op::WriteWord(address, _) = op {
                if *address == fcmd {
                    assert!(i > 0 && self.ops[i - 1] == fsr, "no ready poll before op {}", i);
                    assert!(self.ops.get(i + 1) == Some(&fsr), "no ready poll after op {}", i);
                }
            }
        }
    }

    fn window(&self, address: u32) -> Option<(bool, usize)> {
        let base = self.desc.base_address;
        let user = base + self.desc.user_page_offset;
        if address >= base && address < base + self.desc.device_size {
            Some((false, (address - base) as usize))
        } else if address >= user && address < user + self.desc.user_page_size {
            Some((true, (address - user) as usize))
        } else {
            None
        }
    }

    fn execute(&mut self, word: CommandWord) {
        self.busy_left = self.busy_reads;
        let o = self.desc.opcodes;
        let ps = self.desc.page_size as usize;
        let page = word.page(&self.desc) as usize;
        let pages = self.locked.len();
        if word.key() != self.desc.key {
            self.pending_error |= FSR_PROGE;
            return;
        }
        match word.opcode() {
            op if op == o.clear_page_buffer => self.page_buffer.fill(0xFF),
            op if op == o.write_page || op == o.erase_page => {
                if page >= pages {
                    self.pending_error |= FSR_PROGE;
                } else if self.locked[page] {
                    self.pending_error |= FSR_LOCKE;
                } else if op == o.write_page {
                    self.flash[page * ps..(page + 1) * ps].copy_from_slice(&self.page_buffer);
                } else {
                    self.flash[page * ps..(page + 1) * ps].fill(0xFF);
                }
            }
            op if op == o.lock_region || op == o.unlock_region => {
                if page < pages {
                    self.locked[page] = op == o.lock_region;
                }
            }
            op if op == o.erase_all => {
                if self.locked.iter().any(|l| *l) {
                    self.pending_error |= FSR_LOCKE;
                } else {
                    self.flash.fill(0xFF);
                }
            }
            op if op == o.write_user_page => {
                let len = self.user_page.len();
                self.user_page.copy_from_slice(&self.page_buffer[..len]);
            }
            op if op == o.erase_user_page => self.user_page.fill(0xFF),
            _ => self.pending_error |= FSR_PROGE,
        }
    }
}

impl MemAccess for SimFlash {
    type Error = LinkFault;

    fn read_word(&mut self, address: u32) -> Result<u32, LinkFault> {
        self.ops.push(Op::ReadWord(address));
        if self.fault_register == Some(address) {
            return Err(LinkFault);
        }
        let r = self.desc.registers;
        if address == self.reg(r.status) {
            if let Some(fsr) = self.status_override {
                return Ok(fsr);
            }
            if self.busy_left > 0 {
                self.busy_left -= 1;
                return Ok(0);
            }
            let fsr = FSR_READY | self.pending_error;
            self.pending_error = 0;
            Ok(fsr)
        } else if address == self.reg(r.parameter) {
            Ok(self.parameter)
        } else if address == self.reg(r.version) {
            Ok(self.version)
        } else if address == self.reg(r.fuses_high) {
            Ok(self.fuses.0)
        } else if address == self.reg(r.fuses_low) {
            Ok(self.fuses.1)
        } else {
            Ok(0)
        }
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), LinkFault> {
        self.ops.push(Op::WriteWord(address, value));
        if self.fault_register == Some(address) {
            return Err(LinkFault);
        }
        if address == self.reg(self.desc.registers.command) {
            self.execute(CommandWord(value));
        }
        Ok(())
    }

    fn read_block(
        &mut self,
        address: u32,
        unit: UnitSize,
        buf: &mut [u8],
    ) -> Result<(), LinkFault> {
        self.ops.push(Op::ReadBlock {
            address,
            unit,
            len: buf.len(),
        });
        match self.window(address) {
            Some((false, start)) => buf.copy_from_slice(&self.flash[start..start + buf.len()]),
            Some((true, start)) => buf.copy_from_slice(&self.user_page[start..start + buf.len()]),
            None => return Err(LinkFault),
        }
        Ok(())
    }

    fn write_block(&mut self, address: u32, unit: UnitSize, data: &[u8]) -> Result<(), LinkFault> {
        self.ops.push(Op::WriteBlock {
            address,
            unit,
            data: data.to_vec(),
        });
        let index = self.block_writes;
        self.block_writes += 1;
        if self.fail_block_write == Some(index) {
            return Err(LinkFault);
        }
        let ps = self.page_buffer.len();
        match self.window(address) {
            Some((_, start)) => {
                for (i, b) in data.iter().enumerate() {
                    self.page_buffer[(start + i) % ps] = *b;
                }
                Ok(())
            }
            None => Err(LinkFault),
        }
    }
}

/// Clock advancing by `step` milliseconds on every reading
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    pub now: u64,
    pub step: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        SimClock { now: 0, step: 1 }
    }
}

impl Clock for SimClock {
    fn now_ms(&mut self) -> u64 {
        let now = self.now;
        self.now += self.step;
        now
    }
}

pub fn flashc(sim: &mut SimFlash) -> Flashc<&mut SimFlash, SimClock> {
    let desc = sim.desc;
    Flashc::new(sim, SimClock::default(), desc).unwrap()
}
