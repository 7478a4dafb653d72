use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::host::{Host, Status};

/// Host that prints the status element as lines on stdout.
pub struct TerminalHost<W: Write = io::Stdout> {
    out: W,
    open_in_browser: bool,
}

impl TerminalHost {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            open_in_browser: true,
        }
    }
}

impl<W: Write> TerminalHost<W> {
    pub fn with_writer(out: W, open_in_browser: bool) -> Self {
        Self {
            out,
            open_in_browser,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn render(&mut self, status: &Status) {
        let line = if status.is_visible() {
            format!("[hn] {}", status.text)
        } else {
            "[hn]".to_string()
        };
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }

    fn notify_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        if self.open_in_browser {
            webbrowser::open(url).with_context(|| format!("open {url} in browser"))?;
        }
        let _ = writeln!(self.out, "[hn] opened {url}");
        Ok(())
    }
}
