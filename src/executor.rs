//! Runs the renderer for a built command and checks what it produced.

use crate::error::{PdfError, Result};
use crate::renderer::Configuration;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// First bytes of every PDF file.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// Literal the renderer prints on stderr when a conversion fails.
const FAILURE_MARKER: &str = "Error";

const QUIET_FLAG: &str = "--quiet";

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutput {
    /// PDF captured from the renderer's stdout.
    Bytes(Vec<u8>),
    /// PDF written to this path and checked for the signature.
    Written(PathBuf),
}

impl PdfOutput {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            PdfOutput::Bytes(b) => Some(b.as_slice()),
            PdfOutput::Written(_) => None,
        }
    }
}

fn process_error(program: &str, source: std::io::Error) -> PdfError {
    PdfError::Process {
        program: program.to_string(),
        source,
    }
}

/// Whether the file at `path` starts with `%PDF`.
pub fn has_pdf_signature(path: &Path) -> bool {
    let mut buf = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut buf)) {
        Ok(()) => &buf == PDF_SIGNATURE,
        Err(_) => false,
    }
}

/// Renderer diagnostics are echoed unless the command carries `--quiet`.
fn should_echo(args: &[String]) -> bool {
    !args.iter().any(|a| a == QUIET_FLAG)
}

/// Spawn `args[0]` with the remaining tokens, feed `input` on stdin, and wait for exit.
///
/// Pipes are drained fully before any error is reported. Stderr is echoed unless the
/// command carries `--quiet`.
pub fn run(
    configuration: &Configuration,
    args: &[String],
    input: Option<&[u8]>,
    output: Option<&Path>,
) -> Result<PdfOutput> {
    let (program, rest) = args.split_first().ok_or_else(|| PdfError::Conversion {
        message: "Empty renderer command".to_string(),
    })?;

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    configuration.apply_env(&mut cmd);

    log::debug!("running {}", args.join(" "));
    let mut child = cmd.spawn().map_err(|e| process_error(program, e))?;
    let stdin = child.stdin.take();

    // stdin is written from a helper so a renderer filling its stdout pipe cannot block us.
    let (waited, written) = std::thread::scope(|s| {
        let writer = s.spawn(move || -> std::io::Result<()> {
            if let (Some(mut pipe), Some(bytes)) = (stdin, input) {
                match pipe.write_all(bytes) {
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        log::debug!("renderer closed stdin early");
                    }
                    other => other?,
                }
            }
            Ok(())
        });
        let waited = child.wait_with_output();
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
        (waited, written)
    });
    let out = waited.map_err(|e| process_error(program, e))?;
    written.map_err(|e| process_error(program, e))?;
    log::debug!("renderer exited with {}", out.status);

    let stderr = String::from_utf8_lossy(&out.stderr);
    if stderr.contains(FAILURE_MARKER) {
        return Err(PdfError::Conversion {
            message: format!("Renderer reported an error:\n{}", stderr),
        });
    }
    if !stderr.is_empty() && should_echo(args) {
        eprint!("{}", stderr);
    }

    match output {
        None => Ok(PdfOutput::Bytes(out.stdout)),
        Some(path) if has_pdf_signature(path) => Ok(PdfOutput::Written(path.to_path_buf())),
        Some(_) => Err(PdfError::command_failed(args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn signature_check() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut good = tempfile::NamedTempFile::new()?;
        good.write_all(b"%PDF-1.4\n")?;
        assert!(has_pdf_signature(good.path()));

        let mut bad = tempfile::NamedTempFile::new()?;
        bad.write_all(b"<html>")?;
        assert!(!has_pdf_signature(bad.path()));

        let empty = tempfile::NamedTempFile::new()?;
        assert!(!has_pdf_signature(empty.path()));
        assert!(!has_pdf_signature(Path::new("missing_pdfwrap_output.pdf")));
        Ok(())
    }

    #[test]
    fn empty_command_is_rejected() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let fake = tempfile::NamedTempFile::new()?;
        let conf = Configuration::builder().renderer(fake.path()).build()?;
        assert!(matches!(
            run(&conf, &[], None, None),
            Err(PdfError::Conversion { .. })
        ));
        Ok(())
    }

    #[test]
    fn quiet_flag_suppresses_echo() {
        let loud: Vec<String> = ["wkhtmltopdf", "--page-size", "Letter", "-", "-"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(should_echo(&loud));

        let mut quiet = loud.clone();
        quiet.insert(1, QUIET_FLAG.to_string());
        assert!(!should_echo(&quiet));
    }

    #[test]
    fn output_bytes_accessor() {
        assert_eq!(PdfOutput::Bytes(b"%PDF".to_vec()).bytes(), Some(&b"%PDF"[..]));
        assert!(PdfOutput::Written(PathBuf::from("out.pdf")).bytes().is_none());
    }
}
