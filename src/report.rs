use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::io::{self, Write};
use std::mem;

use crate::config::Configuration;

/// Solver buffers per surface cell: current and next timestep.
pub const PLANES: u64 = 2;
pub const CELL_BYTES: u64 = mem::size_of::<f64>() as u64;

/// Outcome of the dry-run allocation probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Allocated,
    Failed,
}

impl Probe {
    fn verdict(self) -> &'static str {
        match self {
            Probe::Allocated => "Success!",
            Probe::Failed => "Nope....",
        }
    }
}

/// Bytes the solver needs for an `x` by `y` surface. Computed wide so that the
/// report can show it even when it does not fit in `usize`.
pub fn plane_bytes(x: u64, y: u64) -> Option<u128> {
    (x as u128 * y as u128).checked_mul(PLANES as u128 * CELL_BYTES as u128)
}

/// Try to obtain zeroed storage for both planes of an `x` by `y` surface and
/// release it straight away. Never panics or aborts on failure.
pub fn probe_planes(x: u64, y: u64) -> Probe {
    let Some(bytes) = plane_bytes(x, y).and_then(|b| usize::try_from(b).ok()) else {
        return Probe::Failed;
    };
    if bytes == 0 {
        return Probe::Allocated;
    }
    let Ok(layout) = Layout::from_size_align(bytes, mem::align_of::<f64>()) else {
        return Probe::Failed;
    };

    // `Vec` has no fallible zeroed allocation: `vec![0.0; n]` aborts on
    // failure and `try_reserve` + `resize` writes every page.
    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Probe::Failed;
    }
    // SAFETY: `ptr` came from `alloc_zeroed` with this exact layout.
    unsafe { dealloc(ptr, layout) };
    Probe::Allocated
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// Print every configuration field followed by the allocation probe.
pub fn print_parameters<W: Write>(out: &mut W, cfg: &Configuration) -> io::Result<Probe> {
    writeln!(
        out,
        "X={}, Y={}, margin={}, margin temp.={:.6}, delta={:.6}.",
        cfg.x(),
        cfg.y(),
        cfg.bathsize(),
        cfg.bathtemp(),
        cfg.target_delta()
    )?;
    if cfg.sources().is_empty() {
        writeln!(out, "No sources/sinks specified.")?;
    }
    for source in cfg.sources() {
        writeln!(out, "source/sink at {}.", source)?;
    }
    writeln!(out, "Output file={}.", cfg.output().display())?;
    writeln!(out, "Kernel={}", cfg.kernel())?;
    writeln!(out, "Number of threads={}.", cfg.threads())?;
    writeln!(
        out,
        "Debug={} Report={} random={} dryrun={}",
        yes_no(cfg.debug()),
        yes_no(cfg.report()),
        yes_no(cfg.random()),
        yes_no(cfg.dryrun())
    )?;

    let bytes = match plane_bytes(cfg.x(), cfg.y()) {
        Some(bytes) => bytes.to_string(),
        None => "an unrepresentable number of".to_string(),
    };
    write!(
        out,
        "Testing ability to allocate {} bytes:  ({} x {} x {} x {})... ",
        bytes,
        cfg.x(),
        cfg.y(),
        PLANES,
        CELL_BYTES
    )?;
    out.flush()?;
    let probe = probe_planes(cfg.x(), cfg.y());
    tracing::debug!(x = cfg.x(), y = cfg.y(), ?probe, "allocation probe finished");
    writeln!(out, "{}", probe.verdict())?;
    Ok(probe)
}
