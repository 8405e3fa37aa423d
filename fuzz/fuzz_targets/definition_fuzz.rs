//! Definition fuzz target: feed arbitrary bytes to the definition parser and builder.
//! Both must return Ok or Err without panicking.
//! Build with: cargo fuzz run definition_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = devwire::Protocol::from_source(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run definition_fuzz");
}
