//! Convert embedded EMF charts to PNG.

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use log::debug;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Converted images at or below this size (bytes) are treated as failed conversions.
pub const MIN_PNG_SIZE: u64 = 1000;

/// How often a running conversion is checked for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts an image file into a PNG file.
pub trait ImageConverter {
    /// Convert `input` and write the PNG to `output`.
    ///
    /// An `Ok` result does not guarantee an output, see [`is_converted`].
    fn convert(&self, input: &Path, output: &Path) -> Result<(), Report>;
}

/// Returns true if a conversion produced a usable PNG.
pub fn is_converted(output: &Path) -> bool {
    std::fs::metadata(output).map(|m| m.is_file() && m.len() > MIN_PNG_SIZE).unwrap_or(false)
}

// ----------------------------------------------------------------------------
// Inkscape
// ----------------------------------------------------------------------------

/// Converts images with the `inkscape` command-line program.
#[derive(Clone, Debug, PartialEq)]
pub struct Inkscape {
    /// Program to run.
    pub program: String,
    /// The conversion is killed after this long.
    pub timeout: Duration,
}

impl Default for Inkscape {
    fn default() -> Self {
        Inkscape { program: "inkscape".to_string(), timeout: Duration::from_secs(60) }
    }
}

impl Inkscape {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Inkscape { program: program.to_string(), timeout }
    }
}

impl ImageConverter for Inkscape {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), Report> {
        let mut child = Command::new(&self.program)
            .arg(input)
            .arg("--export-filename")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .wrap_err_with(|| eyre!("Failed to run: {}", self.program))
            .suggestion("Check that inkscape is installed and on the PATH, or set --inkscape.")?;

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                debug!("{} {input:?}: {status}", self.program);
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                child.kill()?;
                child.wait()?;
                return Err(eyre!("Timeout converting {input:?} after {:?}", self.timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
