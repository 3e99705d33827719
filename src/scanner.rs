//! Entry procedure boundary scanner.
//!
//! A linear sweep from the entry point that stops at the first return or
//! halt instruction. Branches are not followed, so procedures that jump over
//! their own `ret` are underestimated; the result is deterministic and the
//! scan always terminates.

use crate::region::{Region, RegionKind, START};
use crate::{Address, Decoder, Sweep};

/// Measure the entry procedure.
///
/// `code` starts at the entry point's file offset and `entry` is the entry
/// point's virtual address. The returned region covers every instruction up
/// to and including the first terminator, or everything the decoder accepted
/// if there is none.
pub fn scan_entry_procedure(code: &[u8], entry: Address, decoder: &dyn Decoder) -> Region {
    let mut region = Region::new(START, RegionKind::Code, entry, 0);
    let mut terminator = None;

    for insn in Sweep::new(decoder, code, entry) {
        region.size += insn.size as u64;
        if insn.is_terminator() {
            terminator = Some(insn);
            break;
        }
    }

    match terminator {
        Some(insn) => log::debug!(
            "{} ends with `{}` at 0x{:x} ({} bytes)",
            START,
            insn,
            insn.addr,
            region.size
        ),
        None => log::debug!(
            "{} has no return/halt, stopped after {} of {} bytes",
            START,
            region.size,
            code.len()
        ),
    }

    region
}
