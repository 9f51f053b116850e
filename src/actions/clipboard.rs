use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

/// Clipboard tools tried in order, per platform.
fn clipboard_commands() -> &'static [(&'static str, &'static [&'static str])] {
    if cfg!(target_os = "macos") {
        &[("pbcopy", &[])]
    } else {
        &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ]
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {program}"))?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Copy text to the system clipboard using the first tool that works.
pub(crate) fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut last_err = None;
    for (program, args) in clipboard_commands() {
        match pipe_to(program, args, text) {
            Ok(()) => return Ok(()),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no clipboard tool available")))
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// Open a URL with the desktop's default handler.
pub(crate) fn open_url(url: &str) -> Result<()> {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "linux") {
        "xdg-open"
    } else {
        bail!("opening URLs is not supported on this platform");
    };
    let status = Command::new(program)
        .arg(url)
        .status()
        .with_context(|| format!("running {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_an_error_not_a_panic() {
        assert!(pipe_to("civic-board-no-such-tool", &[], "42").is_err());
    }

    #[test]
    fn every_platform_has_a_clipboard_candidate() {
        assert!(!clipboard_commands().is_empty());
    }
}
