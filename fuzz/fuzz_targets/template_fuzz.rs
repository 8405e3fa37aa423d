//! Template fuzz target: compile arbitrary template source and format it.
//! Compilation may fail but must not panic; a compiled template must format.
//! Build with: cargo fuzz run template_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(template) = devwire::MessageTemplate::compile("fuzz", s) {
        let record = devwire::MapRecord::new("fuzz").with("a", "1").with("b", "text");
        let _ = template.format(&record);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run template_fuzz");
}
