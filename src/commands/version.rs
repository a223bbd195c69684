//! Command: print version information.
use crate::schema::builtin;

/// Binary version, from `git describe` when available.
#[must_use]
pub fn binary_version() -> &'static str {
    option_env!("WARDEN_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Version line printed by `warden version`.
#[must_use]
pub fn describe() -> String {
    format!("warden {} (schema {})", binary_version(), builtin::VERSION)
}

/// Print the version to stdout.
pub fn run() {
    println!("{}", describe());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_schema_version() {
        let line = describe();
        assert!(line.starts_with("warden "));
        assert!(line.ends_with(&format!("(schema {})", builtin::VERSION)));
    }
}
