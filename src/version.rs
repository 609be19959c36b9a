//! Version information.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable service banner: `{name} {version}`.
pub fn banner(service: &str) -> String {
    format!("{service} {PKG_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_contains_pkg_version() {
        assert!(banner("summarizerd").ends_with(PKG_VERSION));
    }
}
