//! C ABI entry point for hosted builds.
//!
//! A hosted build has no process streams or clock of its own; the embedder
//! passes both in as an [`LlfeedHost`]. There is no stdin mode, and all
//! output, the benchmark report included, is suppressed in `bench` and
//! `loop` modes.

use std::ffi::{c_char, c_int, CStr, CString};
use std::io::{self, Write};
use std::time::Duration;

use llfeed_core::{Clock, Driver, Quiet, Reference, RunConfig, FAILURE_STATUS};

/// Stream id for the primary output.
pub const LLFEED_STDOUT: c_int = 0;
/// Stream id for the secondary output.
pub const LLFEED_STDERR: c_int = 1;

/// Primitives supplied by the embedder.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct LlfeedHost {
    /// Monotonic time in seconds.
    pub get_time: extern "C" fn() -> f64,
    /// Write a NUL-terminated string to `stream`.
    pub print: extern "C" fn(stream: c_int, text: *const c_char),
}

struct HostClock(extern "C" fn() -> f64);

impl Clock for HostClock {
    fn now(&mut self) -> Duration {
        Duration::try_from_secs_f64((self.0)()).unwrap_or(Duration::ZERO)
    }
}

/// Line-buffered writer over the host's `print`.
struct HostStream {
    print: extern "C" fn(c_int, *const c_char),
    stream: c_int,
    pending: Vec<u8>,
}

impl HostStream {
    fn new(host: &LlfeedHost, stream: c_int) -> Self {
        Self { print: host.print, stream, pending: Vec::new() }
    }

    fn emit(&mut self, len: usize) {
        let mut bytes: Vec<u8> = self.pending.drain(..len).collect();
        bytes.retain(|&b| b != 0);
        if let Ok(text) = CString::new(bytes) {
            (self.print)(self.stream, text.as_ptr());
        }
    }
}

impl Write for HostStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        if let Some(last) = self.pending.iter().rposition(|&b| b == b'\n') {
            self.emit(last + 1);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.emit(self.pending.len());
        }
        Ok(())
    }
}

impl Drop for HostStream {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Run `spec` over `input` with the built-in reference machine.
///
/// Returns the same status as the command-line driver: 0, a parser error
/// code, or -1.
///
/// # Safety
///
/// `host` must point to a valid [`LlfeedHost`]. `exec`, `spec` and `input`
/// must be null or valid NUL-terminated strings that outlive the call.
#[no_mangle]
pub unsafe extern "C" fn llfeed_run(
    host: *const LlfeedHost,
    exec: *const c_char,
    spec: *const c_char,
    input: *const c_char,
) -> c_int {
    let Some(host) = host.as_ref() else {
        return FAILURE_STATUS;
    };
    let exec = if exec.is_null() {
        "llfeed".into()
    } else {
        CStr::from_ptr(exec).to_string_lossy()
    };
    let args = if spec.is_null() || input.is_null() {
        None
    } else {
        Some((CStr::from_ptr(spec).to_string_lossy(), CStr::from_ptr(input).to_bytes()))
    };
    let config = RunConfig::default().with_quiet(Quiet::All);
    run_hosted(host, &exec, args.as_ref().map(|(spec, input)| (&**spec, *input)), config)
}

fn run_hosted(host: &LlfeedHost, exec: &str, args: Option<(&str, &[u8])>, config: RunConfig) -> c_int {
    let mut out = HostStream::new(host, LLFEED_STDOUT);
    let mut err = HostStream::new(host, LLFEED_STDERR);
    let mut driver = Driver::with_clock(&mut out, &mut err, config, HostClock(host.get_time));

    let Some((spec, input)) = args else {
        driver.print_usage(exec);
        return FAILURE_STATUS;
    };
    log::debug!("hosted run: {} {}", exec, spec);
    driver.run(exec, spec, input, Reference::new)
}
