//! Fuzz target: Address parsing
//!
//! Feeds arbitrary strings to `Address::from_str` to ensure:
//! 1. No panics on any input
//! 2. Anything that parses round-trips through Display
//!
//! Run: cargo +nightly fuzz run fuzz_address_parse -- -max_len=256

#![no_main]
use libfuzzer_sys::fuzz_target;
use tally_core::Address;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(addr) = s.parse::<Address>() {
            let again: Address = addr
                .to_string()
                .parse()
                .expect("displayed address must parse");
            assert_eq!(addr, again);
        }
    }

    // Raw 20-byte inputs always form a valid address
    if data.len() >= 20 {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&data[..20]);
        let addr = Address::from(bytes);
        assert_eq!(addr.to_string().len(), 42);
    }
});
