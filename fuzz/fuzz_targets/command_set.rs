//! Fuzz target for appending commands to a batch.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_command_set
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sqlfront_batch::{Command, CommandSet, SqlParameter};

#[derive(Debug, Arbitrary)]
struct FuzzParameter {
    name: String,
    payload: Vec<u8>,
    offset: usize,
    size: usize,
}

#[derive(Debug, Arbitrary)]
struct FuzzCommand {
    text: String,
    procedure: bool,
    parameters: Vec<FuzzParameter>,
}

fuzz_target!(|commands: Vec<FuzzCommand>| {
    let mut set = CommandSet::new();
    let mut appended = 0;

    for fuzz in commands {
        let command = if fuzz.procedure {
            Command::procedure(fuzz.text)
        } else {
            Command::text(fuzz.text)
        };
        let command = command.params(fuzz.parameters.into_iter().map(|p| {
            SqlParameter::new(p.name, p.payload)
                .with_offset(p.offset)
                .with_size(p.size)
        }));

        match set.append(&command) {
            Ok(ordinal) => {
                assert_eq!(ordinal, appended);
                appended += 1;
            }
            Err(err) => assert!(err.is_append_error()),
        }
    }

    assert_eq!(set.command_count().ok(), Some(appended));
});
