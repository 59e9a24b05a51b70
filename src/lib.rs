#![cfg_attr(not(any(test, feature = "std")), no_std)]
//! This is a platform agnostic flash programming algorithm for the internal flash of the
//! Atmel/Microchip AVR32 UC3 family, driven through a debug probe.
//!
//! The driver talks to the FLASHC controller through memory mapped register accesses provided
//! by a [`transport::MemAccess`] implementation (a JTAG or aWire session, for example) and
//! sequences its commands by polling the status register.
//!
//! Supported operations:
//! * programming arbitrary byte ranges of the main array, merging partial pages with the current
//!   flash content
//! * programming the user page
//! * unlocking and locking regions, erasing pages or the whole chip
//! * reading the flash size from the parameter register
//!
//! Programming never unlocks or erases implicitly, see [`flashc::Flashc::unlock_region`] and
//! [`flashc::Flashc::erase_all`].

pub mod command;
pub mod descriptor;
pub mod error;
pub mod flashc;
mod program;
pub mod register;
pub mod transport;

use crate::error::Error;

/// Largest page the driver can merge, in bytes.
pub const MAX_PAGE_SIZE: usize = 512;

/// How long a single status wait may last before giving up.
pub const READY_TIMEOUT_MS: u64 = 1000;

pub(crate) fn check_write<E>(capacity: u32, offset: u32, length: usize) -> Result<(), Error<E>> {
    let length = u32::try_from(length).map_err(|_| Error::OutOfRange)?;
    if offset >= capacity || length > capacity - offset {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

pub(crate) fn check_read<E>(capacity: u32, offset: u32, length: usize) -> Result<(), Error<E>> {
    let length = u32::try_from(length).map_err(|_| Error::OutOfRange)?;
    if offset > capacity || length > capacity - offset {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

pub(crate) fn check_erase<E>(
    capacity: u32,
    page_size: u32,
    from: u32,
    to: u32,
) -> Result<(), Error<E>> {
    if from > to || to > capacity {
        return Err(Error::OutOfRange);
    }
    if from % page_size != 0 || to % page_size != 0 {
        return Err(Error::NotAligned);
    }
    Ok(())
}
