//! Checkpoint persistence for graph variables.
//!
//! Checkpoints are JSON documents mapping variable names to dtype-tagged
//! value buffers, written as `{prefix}-{step}.json`. Restoration flows
//! through the uniform [`Session`] interface, so it works against any
//! session creation path.

use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    graph::{DType, TensorValue},
    runtime::{Session, SessionErr},
};

/// The checkpoint module's result type.
pub type Result<T> = std::result::Result<T, CheckpointErr>;

/// Checkpoint persistence failures.
#[derive(Debug)]
pub enum CheckpointErr {
    Io(io::Error),
    Json(serde_json::Error),
    /// Reading or writing variable state through the session failed.
    Session(SessionErr),
    /// The checkpoint lacks a variable the graph declares.
    MissingVariable { variable: String, path: PathBuf },
    /// A stored tensor's dtype disagrees with the graph's declaration.
    DtypeMismatch {
        variable: String,
        expected: DType,
        got: DType,
    },
    /// A stored tensor's element count disagrees with the graph's shape.
    ShapeMismatch {
        variable: String,
        expected: usize,
        got: usize,
    },
}

impl Display for CheckpointErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointErr::Io(e) => write!(f, "checkpoint io error: {e}"),
            CheckpointErr::Json(e) => write!(f, "checkpoint encoding error: {e}"),
            CheckpointErr::Session(e) => write!(f, "checkpoint session error: {e}"),
            CheckpointErr::MissingVariable { variable, path } => write!(
                f,
                "checkpoint {} does not contain variable {variable:?}",
                path.display()
            ),
            CheckpointErr::DtypeMismatch {
                variable,
                expected,
                got,
            } => write!(
                f,
                "dtype mismatch for {variable:?}: checkpoint holds {got:?}, graph declares {expected:?}"
            ),
            CheckpointErr::ShapeMismatch {
                variable,
                expected,
                got,
            } => write!(
                f,
                "length mismatch for {variable:?}: checkpoint holds {got} elements, graph declares {expected}"
            ),
        }
    }
}

impl Error for CheckpointErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CheckpointErr::Io(e) => Some(e),
            CheckpointErr::Json(e) => Some(e),
            CheckpointErr::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckpointErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CheckpointErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<SessionErr> for CheckpointErr {
    fn from(value: SessionErr) -> Self {
        Self::Session(value)
    }
}

#[derive(Serialize, Deserialize)]
struct SavedTensor {
    dtype: DType,
    shape: Vec<usize>,
    values: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct CheckpointDoc {
    variables: BTreeMap<String, SavedTensor>,
}

/// Saves and restores every variable of a session's graph.
pub struct Saver {
    prefix: String,
}

impl Saver {
    /// Creates a new `Saver` with the default `ckpt` filename prefix.
    ///
    /// # Returns
    /// A new `Saver` instance.
    pub fn new() -> Self {
        Self {
            prefix: "ckpt".to_string(),
        }
    }

    /// Overrides the checkpoint filename prefix.
    ///
    /// # Arguments
    /// * `prefix` - The filename prefix, without the step suffix.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Writes every graph variable reachable through `session` to a new
    /// checkpoint file in `dir`.
    ///
    /// # Arguments
    /// * `session` - The session to read variable state through.
    /// * `dir` - The checkpoint directory, created if absent.
    /// * `step` - The training step recorded in the filename.
    ///
    /// # Returns
    /// The written file's path, or an error if a variable is uninitialized
    /// or the write fails.
    pub fn save(&self, session: &dyn Session, dir: &Path, step: u64) -> Result<PathBuf> {
        let mut variables = BTreeMap::new();

        for var in session.graph().variables() {
            let value = session.fetch(var.name())?;
            variables.insert(
                var.name().to_string(),
                SavedTensor {
                    dtype: value.dtype(),
                    shape: var.shape().to_vec(),
                    values: value.data().to_vec(),
                },
            );
        }

        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}-{step}.json", self.prefix));
        let doc = CheckpointDoc { variables };
        fs::write(&path, serde_json::to_vec(&doc)?)?;

        info!(path = path.display().to_string().as_str(), step; "wrote checkpoint");
        Ok(path)
    }

    /// Restores every graph variable from the checkpoint at `path`.
    ///
    /// Extra variables in the checkpoint are ignored; a variable declared in
    /// the graph but absent from the checkpoint is an error.
    ///
    /// # Arguments
    /// * `session` - The session to write variable state through.
    /// * `path` - The checkpoint file.
    ///
    /// # Returns
    /// An error if the file cannot be read or any variable disagrees with
    /// the graph's declaration.
    pub fn restore(&self, session: &dyn Session, path: &Path) -> Result<()> {
        let doc: CheckpointDoc = serde_json::from_slice(&fs::read(path)?)?;

        for var in session.graph().variables() {
            let saved =
                doc.variables
                    .get(var.name())
                    .ok_or_else(|| CheckpointErr::MissingVariable {
                        variable: var.name().to_string(),
                        path: path.to_path_buf(),
                    })?;

            if saved.dtype != var.dtype() {
                return Err(CheckpointErr::DtypeMismatch {
                    variable: var.name().to_string(),
                    expected: var.dtype(),
                    got: saved.dtype,
                });
            }

            if saved.values.len() != var.len() {
                return Err(CheckpointErr::ShapeMismatch {
                    variable: var.name().to_string(),
                    expected: var.len(),
                    got: saved.values.len(),
                });
            }

            session.assign(
                var.name(),
                TensorValue::new(saved.dtype, saved.values.clone()),
            )?;
        }

        debug!(path = path.display().to_string().as_str(); "restored checkpoint");
        Ok(())
    }

    /// Resolves the newest checkpoint in `dir` by step number.
    ///
    /// # Arguments
    /// * `dir` - The checkpoint directory.
    ///
    /// # Returns
    /// The newest checkpoint's path, or `None` if the directory is missing
    /// or holds no matching files.
    pub fn latest_checkpoint(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut newest: Option<(u64, PathBuf)> = None;

        for entry in entries {
            let path = entry?.path();
            let Some(step) = self.parse_step(&path) else {
                continue;
            };

            if newest.as_ref().is_none_or(|(best, _)| step > *best) {
                newest = Some((step, path));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }

    fn parse_step(&self, path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".json")?;
        let step = stem.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        step.parse().ok()
    }
}

impl Default for Saver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Collection, Graph},
        initialization::ConstInit,
        runtime::{Runtime, SessionConfig},
    };
    use std::sync::Arc;

    fn session_with_var(runtime: &Arc<Runtime>, master: &str) -> crate::runtime::RuntimeSession {
        let graph = Graph::new();
        graph
            .variable(
                "w",
                DType::F64,
                &[2],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();
        runtime.connect(master, Arc::new(graph), SessionConfig::default())
    }

    #[test]
    fn save_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(Runtime::new());
        let saver = Saver::new();

        let source = session_with_var(&runtime, "a");
        source
            .assign("w", TensorValue::new(DType::F64, vec![5.0, -1.5]))
            .unwrap();
        let path = saver.save(&source, dir.path(), 3).unwrap();

        let target = session_with_var(&runtime, "b");
        saver.restore(&target, &path).unwrap();
        assert_eq!(target.fetch("w").unwrap().data(), &[5.0, -1.5]);
    }

    #[test]
    fn saving_uninitialized_state_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(Runtime::new());
        let session = session_with_var(&runtime, "a");

        let err = Saver::new().save(&session, dir.path(), 0).unwrap_err();
        assert!(matches!(err, CheckpointErr::Session(_)));
    }

    #[test]
    fn latest_checkpoint_picks_the_highest_step() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(Runtime::new());
        let saver = Saver::new();

        let session = session_with_var(&runtime, "a");
        session
            .assign("w", TensorValue::new(DType::F64, vec![0.0, 0.0]))
            .unwrap();

        saver.save(&session, dir.path(), 2).unwrap();
        let latest = saver.save(&session, dir.path(), 10).unwrap();
        saver.save(&session, dir.path(), 9).unwrap();

        assert_eq!(saver.latest_checkpoint(dir.path()).unwrap(), Some(latest));
    }

    #[test]
    fn latest_checkpoint_handles_missing_directories() {
        let saver = Saver::new();
        let resolved = saver
            .latest_checkpoint(Path::new("/nonexistent/ckpt-dir"))
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn restore_rejects_missing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(Runtime::new());
        let saver = Saver::new();

        let source = session_with_var(&runtime, "a");
        source
            .assign("w", TensorValue::new(DType::F64, vec![0.0, 0.0]))
            .unwrap();
        let path = saver.save(&source, dir.path(), 0).unwrap();

        // A graph with an extra variable the checkpoint has never seen.
        let graph = Graph::new();
        graph
            .variable(
                "w",
                DType::F64,
                &[2],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();
        graph
            .variable(
                "extra",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();
        let target = runtime.connect("b", Arc::new(graph), SessionConfig::default());

        let err = saver.restore(&target, &path).unwrap_err();
        assert!(matches!(err, CheckpointErr::MissingVariable { variable, .. }
            if variable == "extra"));
    }
}
