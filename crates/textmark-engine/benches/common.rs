// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_paragraph_content(size: usize) -> String {
    let base = "The quick brown fox jumps over the lazy dog. Pack my box with five dozen liquor jugs.\n\n";
    base.repeat(size)
}
