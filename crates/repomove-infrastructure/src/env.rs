//! Process environment as an [`EnvSource`].

use repomove_core::EnvSource;

/// Reads environment defaults from the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_is_none() {
        assert_eq!(ProcessEnv.var("REPOMOVE_TEST_SURELY_UNSET_VARIABLE"), None);
    }

    #[test]
    fn test_reads_path() {
        // PATH is present on every supported host
        assert!(ProcessEnv.var("PATH").is_some());
    }
}
