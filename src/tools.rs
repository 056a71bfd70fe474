/*!
 * External program invocation shared by the providers.
 *
 * Programs run with `kill_on_drop` under a timeout: when the timeout fires,
 * or when the calling future is dropped, the child process is killed.
 * Both output streams can be consumed line by line while the program runs,
 * which is how download and muxing progress is tracked. Stderr is also
 * collected and filtered down to the lines worth showing in an error.
 */

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::Command;

use crate::errors::ProviderError;

/// Most diagnostic lines kept in a tool error
const MAX_DIAGNOSTIC_LINES: usize = 20;

// Banner and stream-listing lines ffmpeg-family tools print on every run
const NOISE_PREFIXES: &[&str] = &[
    "ffmpeg version",
    "ffprobe version",
    "built with",
    "configuration:",
    "Input #",
    "Metadata:",
    "Duration:",
    "Chapter",
    "Stream #",
    "title",
    "BPS",
    "DURATION",
    "NUMBER_OF",
    "_STATISTICS",
    "Output #",
    "Stream mapping:",
    "Press [q]",
];

// Library version lines of the banner, e.g. "libavutil      58. 29.100 / 58. 29.100"
static LIBRARY_VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^lib[a-z0-9]+\s+\d+\.").expect("library version regex is valid")
});

/// Output stream a line was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStream {
    Stdout,
    Stderr,
}

/// Collected output of a finished program
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a program to completion and collect its output
pub async fn run_tool<I, S>(program: &str, args: I, timeout_secs: u64) -> Result<ToolOutput, ProviderError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool_streaming(program, args, timeout_secs, |_, _| {}).await
}

/// Run a program, handing each output line to `on_line` as it arrives
///
/// Lines of both streams are delivered in arrival order, tagged with the
/// stream they came from. Invalid UTF-8 is replaced rather than ending the
/// read. A non-zero exit becomes [`ProviderError::ToolFailed`] carrying the
/// filtered stderr.
pub async fn run_tool_streaming<I, S, F>(
    program: &str,
    args: I,
    timeout_secs: u64,
    mut on_line: F,
) -> Result<ToolOutput, ProviderError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    F: FnMut(ToolStream, &str) + Send,
{
    let tool = tool_name(program);

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!("Running {:?}", command.as_std());

    let mut child = command.spawn().map_err(|e| ProviderError::ToolUnavailable {
        tool: tool.clone(),
        message: e.to_string(),
    })?;

    let mut stdout_lines = child.stdout.take().map(|out| BufReader::new(out).split(b'\n'));
    let mut stderr_lines = child.stderr.take().map(|err| BufReader::new(err).split(b'\n'));

    let on_line = &mut on_line;
    let run = async move {
        let mut output = ToolOutput::default();
        loop {
            tokio::select! {
                line = next_line(&mut stdout_lines), if stdout_lines.is_some() => match line {
                    Some(line) => {
                        on_line(ToolStream::Stdout, &line);
                        output.stdout.push_str(&line);
                        output.stdout.push('\n');
                    }
                    None => stdout_lines = None,
                },
                line = next_line(&mut stderr_lines), if stderr_lines.is_some() => match line {
                    Some(line) => {
                        on_line(ToolStream::Stderr, &line);
                        output.stderr.push_str(&line);
                        output.stderr.push('\n');
                    }
                    None => stderr_lines = None,
                },
                else => break,
            }
        }
        let status = child.wait().await;
        (status, output)
    };

    // On timeout the `run` future and the child it owns are dropped, which kills the process
    let (status, output) = match tokio::time::timeout(Duration::from_secs(timeout_secs), run).await {
        Ok(result) => result,
        Err(_) => {
            error!("{} timed out after {} seconds", tool, timeout_secs);
            return Err(ProviderError::Timeout { tool, secs: timeout_secs });
        }
    };

    let status = status.map_err(|e| ProviderError::ToolFailed {
        tool: tool.clone(),
        status: None,
        diagnostic: e.to_string(),
    })?;

    if !status.success() {
        let diagnostic = filter_tool_stderr(&output.stderr);
        error!("{} failed: {}", tool, diagnostic);
        return Err(ProviderError::ToolFailed { tool, status: status.code(), diagnostic });
    }

    Ok(output)
}

/// Next line of a stream, lossily decoded; `None` at end of stream or on a read error
async fn next_line<R: AsyncRead + Unpin>(lines: &mut Option<Split<BufReader<R>>>) -> Option<String> {
    let segment = lines.as_mut()?.next_segment().await.ok()??;
    let line = String::from_utf8_lossy(&segment);
    Some(line.strip_suffix('\r').unwrap_or(&line).to_string())
}

/// File name part of a program path, used in messages
fn tool_name(program: &str) -> String {
    std::path::Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

/// Keep only the stderr lines that explain a failure
///
/// Drops blank lines and the banner/stream listing of ffmpeg-family tools,
/// then keeps the last lines, where the actual error is printed.
pub fn filter_tool_stderr(stderr: &str) -> String {
    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .filter(|line| !LIBRARY_VERSION_LINE.is_match(line))
        .collect();

    if meaningful.is_empty() {
        return "no diagnostic output (stderr was empty after filtering)".to_string();
    }

    let start = meaningful.len().saturating_sub(MAX_DIAGNOSTIC_LINES);
    meaningful[start..].join("\n")
}
