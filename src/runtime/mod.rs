//! Runtime facts: values only known once the process is launched
//!
//! A [`RuntimeFacts`] provider is queried once at startup and its answers
//! are written into the configuration through the runtime setter path, so
//! they get the same type check as any other late write.

mod context;
mod launcher;
mod revision;
mod vocab;

pub use context::{Handle, RuntimeContext};
pub use launcher::LauncherEnv;
pub use revision::{GitRevision, UNAVAILABLE};
pub use vocab::{apply_padded_vocab, pad_vocab_size};

use crate::config::MergedConfig;
use crate::error::Result;
use serde_json::Value;
use tracing::info;

/// Source of launch-time facts
pub trait RuntimeFacts {
    /// Source revision, or [`UNAVAILABLE`]
    fn revision(&self) -> String;
    fn world_size(&self) -> Option<u64>;
    fn rank(&self) -> Option<u64>;
    fn local_rank(&self) -> Option<u64>;
}

/// Facts of the running process: git revision plus launcher variables
///
/// The revision is looked up once, in [`discover`](Self::discover).
#[derive(Debug)]
pub struct ProcessFacts {
    revision: String,
    launcher: LauncherEnv,
}

impl ProcessFacts {
    pub fn discover() -> Self {
        Self::with(GitRevision::new(), LauncherEnv::from_env())
    }

    pub fn with(revision: GitRevision, launcher: LauncherEnv) -> Self {
        Self {
            revision: revision.describe(),
            launcher,
        }
    }
}

impl RuntimeFacts for ProcessFacts {
    fn revision(&self) -> String {
        self.revision.clone()
    }

    fn world_size(&self) -> Option<u64> {
        self.launcher.world_size()
    }

    fn rank(&self) -> Option<u64> {
        self.launcher.rank()
    }

    fn local_rank(&self) -> Option<u64> {
        self.launcher.local_rank()
    }
}

/// Fixed facts, for tests and for callers that discover them elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFacts {
    pub revision: String,
    pub world_size: Option<u64>,
    pub rank: Option<u64>,
    pub local_rank: Option<u64>,
}

impl Default for StaticFacts {
    fn default() -> Self {
        Self {
            revision: UNAVAILABLE.to_string(),
            world_size: None,
            rank: None,
            local_rank: None,
        }
    }
}

impl RuntimeFacts for StaticFacts {
    fn revision(&self) -> String {
        self.revision.clone()
    }

    fn world_size(&self) -> Option<u64> {
        self.world_size
    }

    fn rank(&self) -> Option<u64> {
        self.rank
    }

    fn local_rank(&self) -> Option<u64> {
        self.local_rank
    }
}

/// Write runtime facts into the configuration
///
/// Sets `git_hash`, `world_size`, `global_num_gpus` (the world size),
/// `rank` and `local_rank`. Facts the provider does not know leave their
/// fields untouched, as do fields the schema does not declare.
pub fn inject(config: &mut MergedConfig, facts: &dyn RuntimeFacts) -> Result<()> {
    let revision = facts.revision();
    let world_size = facts.world_size();

    let writes = [
        ("git_hash", Some(Value::from(revision.clone()))),
        ("world_size", world_size.map(Value::from)),
        ("global_num_gpus", world_size.map(Value::from)),
        ("rank", facts.rank().map(Value::from)),
        ("local_rank", facts.local_rank().map(Value::from)),
    ];
    for (name, value) in writes {
        if let (true, Some(value)) = (config.contains(name), value) {
            config.set(name, value)?;
        }
    }

    info!(
        revision = %revision,
        world_size = ?world_size,
        rank = ?facts.rank(),
        "runtime facts recorded"
    );
    Ok(())
}
