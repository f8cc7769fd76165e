#![forbid(unsafe_code)]

//! `tracing` output for the browser console.
//!
//! [`LineMakeWriter`] buffers one formatted event and hands the finished
//! line to a sink when the writer is dropped, which is how `tracing-subscriber`
//! uses writers (one writer per event). [`init`] wires it to `console.log`.

use std::io;
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when the page does not pass one.
pub const DEFAULT_FILTER: &str = "folio=info";

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// Buffers one event; flushes it to the sink on drop.
pub struct LineWriter {
    buf: Vec<u8>,
    sink: Sink,
}

impl io::Write for LineWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.sink)(line);
        }
    }
}

/// `MakeWriter` producing [`LineWriter`]s that feed one sink.
#[derive(Clone)]
pub struct LineMakeWriter {
    sink: Sink,
}

impl LineMakeWriter {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

impl<'a> MakeWriter<'a> for LineMakeWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buf: Vec::new(),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Install a global subscriber writing through `writer`.
///
/// No timestamps (the console adds its own, and `SystemTime` is unavailable
/// on `wasm32-unknown-unknown`) and no ANSI colors. Returns `false` if a
/// subscriber was already installed.
pub fn init_with(writer: LineMakeWriter, filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .without_time()
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .is_ok()
}

/// Install console logging with `filter` (an `EnvFilter` directive string).
#[cfg(target_arch = "wasm32")]
pub fn init(filter: &str) -> bool {
    init_with(
        LineMakeWriter::new(|line| {
            web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(line));
        }),
        filter,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn one_line_per_event() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let writer = LineMakeWriter::new(move |line| {
            if let Ok(mut lines) = sink.lock() {
                lines.push(line.to_string());
            }
        });
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .without_time(),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "folio.test", count = 3, "first");
            tracing::info!(target: "folio.test", "second");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("folio.test"));
        assert!(lines[0].contains("first"));
        assert!(lines[0].contains("count=3"));
        assert!(!lines[1].ends_with('\n'));
    }
}
