use indicatif::{ProgressBar, ProgressDrawTarget};
use std::io::{self, Write};

/// Log sink that clears the progress bar around each write so log lines and
/// bar redraws do not interleave on stderr.
pub struct BarWriter {
    bar: ProgressBar,
}

impl Write for BarWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Installs the tracing subscriber and returns the bar it writes around.
///
/// The bar starts hidden; call `set_draw_target` once lookups begin.
pub fn init() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let sink = bar.clone();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || BarWriter { bar: sink.clone() })
        .init();
    bar
}
