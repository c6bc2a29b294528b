#![no_main]

use elfscope::elf::{CopyPolicy, ElfBinary, SliceRegion};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut binary) = ElfBinary::parse(data) else {
        return;
    };

    let Ok(footprint) = binary.compute_footprint() else {
        return;
    };

    let _ = binary.plan_embedded_symtab(footprint.map_or(0, |range| range.end));
    let _ = binary.symbol_address("start");

    // Bounded destination: a hostile image must never write past it
    if let Some(footprint) = footprint {
        let mut memory = vec![0u8; footprint.len().min(1 << 20) as usize];
        let mut region = SliceRegion::new(footprint.start, &mut memory);
        let _ = binary.load(&mut region, CopyPolicy::Defensive);
        let mut region = SliceRegion::new(footprint.start, &mut memory);
        let _ = binary.load(&mut region, CopyPolicy::Trusted);
    }
});
