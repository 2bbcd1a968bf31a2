// src/dag/task.rs

//! A single external-program invocation plus its checkpoint metadata.

use std::path::{Path, PathBuf};

use crate::types::{EnvOverride, TaskName};

/// Placeholder replaced by the pool's current location when a pool starts.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// One external program invocation.
///
/// Tasks are built up front by whoever assembles the pipeline and are
/// immutable afterwards; [`Task::resolve`] produces the concrete copy that is
/// handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: TaskName,
    /// Program followed by its arguments. Opaque to the engine.
    pub command: Vec<String>,
    /// Where the completion marker and the run log for this task are written.
    pub output_folder: PathBuf,
    /// Where an existing completion marker is looked up.
    ///
    /// Usually equal to `output_folder`; differs when the marker logically
    /// belongs to an earlier stage.
    pub result_folder: PathBuf,
    /// Whether a failure of this task aborts the pipeline.
    pub critical: bool,
    /// Adjustments applied to the child's environment.
    pub env: Vec<EnvOverride>,
    /// File or folder this task produces for later tasks and pools.
    pub output: Option<PathBuf>,
}

impl Task {
    /// A critical task whose result folder equals its output folder.
    pub fn new<I, S>(name: impl Into<TaskName>, command: I, output_folder: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output_folder = output_folder.into();
        Self {
            name: name.into(),
            command: command.into_iter().map(Into::into).collect(),
            result_folder: output_folder.clone(),
            output_folder,
            critical: true,
            env: Vec::new(),
            output: None,
        }
    }

    pub fn with_result_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.result_folder = folder.into();
        self
    }

    pub fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }

    pub fn with_env(mut self, env: EnvOverride) -> Self {
        self.env.push(env);
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// The program to launch, if the command line is not empty.
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or(&[])
    }

    /// Command line joined with spaces, for logs.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }

    /// Concrete copy of this task for the given current location.
    ///
    /// Every occurrence of [`INPUT_PLACEHOLDER`] in the command line and in
    /// the declared output is replaced by `location`.
    pub fn resolve(&self, location: &Path) -> Task {
        let loc = location.to_string_lossy();
        let substitute = |s: &str| s.replace(INPUT_PLACEHOLDER, &loc);

        Task {
            command: self.command.iter().map(|arg| substitute(arg)).collect(),
            output: self
                .output
                .as_ref()
                .map(|p| PathBuf::from(substitute(&p.to_string_lossy()))),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_critical_and_shares_folders() {
        let t = Task::new("FastQC", ["fastqc", "reads.fq"], "/r/0-FastQC");
        assert!(t.critical);
        assert_eq!(t.output_folder, t.result_folder);
        assert_eq!(t.program(), Some("fastqc"));
        assert_eq!(t.args(), ["reads.fq".to_string()]);
    }

    #[test]
    fn resolve_substitutes_input_in_args_and_output() {
        let t = Task::new("Sort", ["samtools", "sort", "{input}", "-o", "{input}.sorted"], "/r/4")
            .with_output("{input}.sorted");

        let r = t.resolve(Path::new("/r/3/reads.bam"));

        assert_eq!(
            r.command,
            vec!["samtools", "sort", "/r/3/reads.bam", "-o", "/r/3/reads.bam.sorted"]
        );
        assert_eq!(r.output, Some(PathBuf::from("/r/3/reads.bam.sorted")));
        // Template is untouched.
        assert_eq!(t.command[2], "{input}");
    }

    #[test]
    fn empty_command_has_no_program() {
        let t = Task::new("Nothing", Vec::<String>::new(), "/r");
        assert_eq!(t.program(), None);
        assert!(t.args().is_empty());
    }
}
