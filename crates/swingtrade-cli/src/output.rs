use swingtrade_core::engine_name;

pub fn build_info() -> String {
    format!(
        "{} {} (git {}, target {}, built {})",
        engine_name(),
        env!("CARGO_PKG_VERSION"),
        env!("SWINGTRADE_GIT_SHA"),
        env!("SWINGTRADE_TARGET"),
        env!("SWINGTRADE_BUILD_UNIX_EPOCH"),
    )
}

/// Printed to stderr so stdout stays clean for command output.
pub fn print_banner() {
    eprintln!("{}", build_info());
}
