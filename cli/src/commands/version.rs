//! Command: print version information.

/// Version string: the release or `git describe` value baked in at build
/// time, otherwise the crate version.
#[must_use]
pub fn string() -> &'static str {
    option_env!("BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("bootstrap {}", string());
}
