use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// One file to convert from `input_format` to `output_format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub input_format: String,
    pub output_format: String,
    pub output_dir: PathBuf,
}

impl ConversionRequest {
    pub fn input_file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<output_dir>/<input stem>.<extension>`
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted".to_string());
        self.output_dir
            .join(format!("{}.{}", stem, extension_for(&self.output_format)))
    }
}

/// File extension for a logical format name.
pub fn extension_for(format: &str) -> String {
    match format.to_lowercase().as_str() {
        "markdown" => "md".to_string(),
        "plaintext" | "text" => "txt".to_string(),
        "jpeg" => "jpg".to_string(),
        "tiff" => "tif".to_string(),
        "msword" => "doc".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("{0}")]
    Engine(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("no output was written to {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("conversion worker stopped: {0}")]
    Worker(String),
}

/// Something that turns one file into another. Calls may block for a long time.
pub trait ConversionEngine: Send + Sync {
    fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError>;
}

/// Runs a command-line tool.
///
/// Arguments may contain `{input}`, `{output}`, `{from}` and `{to}`, which are
/// replaced per request.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    args: Vec<String>,
}

impl ExternalTool {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn expand_args(&self, request: &ConversionRequest, output: &Path) -> Vec<String> {
        let input = request.input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{from}", &request.input_format)
                    .replace("{to}", &request.output_format)
            })
            .collect()
    }
}

impl ConversionEngine for ExternalTool {
    fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let output_path = request.output_path();
        let args = self.expand_args(request, &output_path);
        log::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConversionError::ToolFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !output_path.is_file() {
            return Err(ConversionError::MissingOutput(output_path));
        }
        Ok(output_path)
    }
}

#[derive(Debug)]
pub enum ConversionOutcome {
    Completed(PathBuf),
    Failed(ConversionError),
    Cancelled,
}

/// Run `engine` on the blocking pool until it finishes or `cancel` fires.
///
/// A cancelled run reports `Cancelled` even if the engine finished at the same
/// moment; its output is never handed back.
pub async fn run_conversion(
    engine: Arc<dyn ConversionEngine>,
    request: ConversionRequest,
    cancel: CancellationToken,
) -> ConversionOutcome {
    if cancel.is_cancelled() {
        return ConversionOutcome::Cancelled;
    }

    let label = request.input.display().to_string();
    let task = tokio::task::spawn_blocking(move || engine.convert(&request));

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => ConversionOutcome::Cancelled,
        joined = task => match joined {
            Ok(Ok(path)) => ConversionOutcome::Completed(path),
            Ok(Err(e)) => ConversionOutcome::Failed(e),
            Err(e) => ConversionOutcome::Failed(ConversionError::Worker(e.to_string())),
        },
    };

    match &outcome {
        ConversionOutcome::Completed(path) => {
            log::info!("Converted {} -> {}", label, path.display())
        }
        ConversionOutcome::Failed(e) => log::warn!("Conversion of {} failed: {}", label, e),
        ConversionOutcome::Cancelled => log::info!("Conversion of {} cancelled", label),
    }
    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// Writes a fixed body to the request's output path.
    pub(crate) struct WritingEngine(pub &'static [u8]);

    impl ConversionEngine for WritingEngine {
        fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
            let out = request.output_path();
            std::fs::write(&out, self.0).map_err(|e| ConversionError::Engine(e.to_string()))?;
            Ok(out)
        }
    }

    pub(crate) struct FailingEngine;

    impl ConversionEngine for FailingEngine {
        fn convert(&self, _request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
            Err(ConversionError::Engine("unsupported input".to_string()))
        }
    }

    struct SlowEngine;

    impl ConversionEngine for SlowEngine {
        fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(request.output_path())
        }
    }

    pub(crate) fn request(dir: &Path, input: &str, from: &str, to: &str) -> ConversionRequest {
        ConversionRequest {
            input: dir.join(input),
            input_format: from.to_string(),
            output_format: to.to_string(),
            output_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_output_path() {
        let req = request(Path::new("/docs"), "test.md", "markdown", "pdf");
        assert_eq!(req.input_file_name(), "test.md");
        assert_eq!(req.output_path(), PathBuf::from("/docs/test.pdf"));

        let req = request(Path::new("/docs"), "notes.pdf", "pdf", "plaintext");
        assert_eq!(req.output_path(), PathBuf::from("/docs/notes.txt"));
        let req = request(Path::new("/img"), "photo.png", "png", "JPEG");
        assert_eq!(req.output_path(), PathBuf::from("/img/photo.jpg"));
    }

    #[test]
    fn test_expand_args() {
        let tool = ExternalTool::new("pandoc", ["-f", "{from}", "-t", "{to}", "{input}", "-o", "{output}"]);
        let req = request(Path::new("/docs"), "a.md", "markdown", "html");
        let args = tool.expand_args(&req, &req.output_path());
        assert_eq!(
            args,
            vec!["-f", "markdown", "-t", "html", "/docs/a.md", "-o", "/docs/a.html"]
        );
    }

    #[tokio::test]
    async fn test_run_completed() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "test.md", "markdown", "pdf");
        let outcome =
            run_conversion(Arc::new(WritingEngine(b"%PDF")), req, CancellationToken::new()).await;
        match outcome {
            ConversionOutcome::Completed(path) => assert_eq!(path, dir.path().join("test.pdf")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "test.md", "markdown", "pdf");
        let outcome = run_conversion(Arc::new(FailingEngine), req, CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            ConversionOutcome::Failed(ConversionError::Engine(_))
        ));
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "movie.mov", "mov", "mp4");
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let outcome = run_conversion(Arc::new(SlowEngine), req, cancel).await;
        assert!(matches!(outcome, ConversionOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "test.md", "markdown", "pdf");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = run_conversion(Arc::new(WritingEngine(b"x")), req, cancel).await;
        assert!(matches!(outcome, ConversionOutcome::Cancelled));
        assert!(!dir.path().join("test.pdf").exists());
    }

    #[test]
    fn test_missing_program() {
        let tool = ExternalTool::new("definitely-not-a-real-converter", ["{input}"]);
        let req = request(Path::new("/tmp"), "a.md", "markdown", "pdf");
        assert!(matches!(
            tool.convert(&req),
            Err(ConversionError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_tool_copies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"plain").unwrap();
        let req = request(dir.path(), "a.txt", "plaintext", "markdown");

        let tool = ExternalTool::new("cp", ["{input}", "{output}"]);
        let out = tool.convert(&req).unwrap();
        assert_eq!(out, dir.path().join("a.md"));
        assert_eq!(std::fs::read(&out).unwrap(), b"plain");

        let failing = ExternalTool::new("false", Vec::<String>::new());
        assert!(matches!(
            failing.convert(&req),
            Err(ConversionError::ToolFailed { .. })
        ));

        let silent = ExternalTool::new("true", Vec::<String>::new());
        let req = request(dir.path(), "a.txt", "plaintext", "html");
        assert!(matches!(
            silent.convert(&req),
            Err(ConversionError::MissingOutput(_))
        ));
    }
}
