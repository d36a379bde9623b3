//! Facts published by the distributed launcher

use std::fmt;
use tracing::warn;

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads `WORLD_SIZE`, `RANK` and `LOCAL_RANK`
///
/// The lookup is injectable so tests do not touch the process environment.
pub struct LauncherEnv {
    lookup: Lookup,
}

impl LauncherEnv {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    pub fn world_size(&self) -> Option<u64> {
        self.read("WORLD_SIZE")
    }

    pub fn rank(&self) -> Option<u64> {
        self.read("RANK")
    }

    pub fn local_rank(&self) -> Option<u64> {
        self.read("LOCAL_RANK")
    }

    /// An unparsable variable is treated as absent
    fn read(&self, key: &str) -> Option<u64> {
        let raw = (self.lookup)(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(variable = key, value = %raw, "ignoring non-numeric launcher variable");
                None
            }
        }
    }
}

impl Default for LauncherEnv {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for LauncherEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LauncherEnv")
            .field("world_size", &self.world_size())
            .field("rank", &self.rank())
            .field("local_rank", &self.local_rank())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> LauncherEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LauncherEnv::with_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_reads_launcher_variables() {
        let launcher = env(&[("WORLD_SIZE", "16"), ("RANK", "5"), ("LOCAL_RANK", " 1 ")]);
        assert_eq!(launcher.world_size(), Some(16));
        assert_eq!(launcher.rank(), Some(5));
        assert_eq!(launcher.local_rank(), Some(1));
    }

    #[test]
    fn test_missing_and_invalid_are_absent() {
        let launcher = env(&[("WORLD_SIZE", "many")]);
        assert_eq!(launcher.world_size(), None);
        assert_eq!(launcher.rank(), None);
    }
}
