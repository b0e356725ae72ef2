//! Fuzz target for connection string resolution.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_resolve
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlfront_options::{Resolver, StaticHost};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let resolver = Resolver::with_host(StaticHost::new().machine_name("fuzz01").data_directory("/data"));
    if let Ok(opts) = resolver.resolve(input) {
        // Anything that resolves must resolve again to the same options.
        let again = resolver.resolve(&opts.to_connection_string());
        assert_eq!(again.as_ref(), Ok(&opts));
    }
});
