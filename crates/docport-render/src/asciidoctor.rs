//! AsciiDoc engine backed by the `asciidoctor` executable.
//!
//! The source is piped over stdin and the embeddable (header/footer free)
//! document is read back from stdout.

use std::{
    io::Write,
    path::Path,
    process::{Command, Stdio},
    thread,
};

use crate::{Converter, RenderError, Result};

/// Converter that shells out to `asciidoctor`.
#[derive(Debug, Clone)]
pub struct AsciidoctorConverter {
    program: String,
    show_title: bool,
}

impl Default for AsciidoctorConverter {
    fn default() -> Self {
        Self::new("asciidoctor")
    }
}

impl AsciidoctorConverter {
    /// Create a converter running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            show_title: true,
        }
    }

    /// Pass `-a showtitle` so the document title is kept in the fragment.
    #[must_use]
    pub fn show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    fn args(&self, path: &Path) -> Vec<String> {
        let mut args = vec!["--no-header-footer".to_string()];
        if self.show_title {
            args.extend(["-a".to_string(), "showtitle".to_string()]);
        }
        // Lets relative includes resolve against the source directory.
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            args.extend(["-B".to_string(), dir.to_string_lossy().into_owned()]);
        }
        args.extend(["-o".to_string(), "-".to_string(), "-".to_string()]);
        args
    }
}

impl Converter for AsciidoctorConverter {
    fn source_extension(&self) -> &'static str {
        "adoc"
    }

    fn convert(&self, source: &str, path: &Path) -> Result<String> {
        tracing::debug!(program = %self.program, path = %path.display(), "running asciidoctor");

        let mut child = Command::new(&self.program)
            .args(self.args(path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::EngineUnavailable {
                engine: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a large document cannot
        // deadlock against a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::failed(path, "stdin was not captured"))?;
        let input = source.to_owned();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| RenderError::failed(path, "stdin writer panicked"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::failed(
                path,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }
        written?;

        String::from_utf8(output.stdout)
            .map_err(|e| RenderError::failed(path, format!("output is not UTF-8: {e}")))
    }
}
