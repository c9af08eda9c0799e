//! Transfer/kernel timeline, written as CSV.
#![cfg(feature = "memtrace")]

use once_cell::sync::Lazy;
use std::{fs::File, io::{BufWriter, Write}, path::Path, sync::Mutex, time::Instant};

/// Transfer direction or kernel run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir { H2D, D2H, Kernel }
impl Dir {
    fn as_str(self) -> &'static str {
        match self {
            Dir::H2D    => "H2D",
            Dir::D2H    => "D2H",
            Dir::Kernel => "Kernel",
        }
    }
}

/// Time origin, set by the first start().
static T0: Lazy<Instant> = Lazy::new(Instant::now);

/// (start, end, bytes, dir, idle)
static LOG: Lazy<Mutex<Vec<(u128, u128, usize, &'static str, u128)>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Start time, size and direction of one transfer or kernel.
#[derive(Debug)]
pub struct CopyToken {
    start: Instant,
    bytes: usize,
    dir: Dir,
}

pub fn start(dir: Dir, bytes: usize) -> CopyToken {
    Lazy::force(&T0);
    CopyToken { start: Instant::now(), bytes, dir }
}

impl CopyToken {
    /// Appends one timeline row, including the idle gap since the previous one.
    pub fn finish(self) {
        let t0 = *T0;
        let s  = self.start.duration_since(t0).as_micros();
        let e  = Instant::now().duration_since(t0).as_micros();

        let mut log = LOG.lock().unwrap_or_else(|e| e.into_inner());
        let prev_end = log.last().map(|entry| entry.1).unwrap_or(0);
        let idle = s.saturating_sub(prev_end);

        log.push((s, e, self.bytes, self.dir.as_str(), idle));
    }
}

/// Writes and clears the timeline.
pub fn flush_csv(path: &Path) -> std::io::Result<usize> {
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "t_start_us,t_end_us,bytes,dir,idle_us")?;
    let mut log = LOG.lock().unwrap_or_else(|e| e.into_inner());
    for (s, e, b, d, idle) in log.iter() {
        writeln!(f, "{},{},{},{},{}", s, e, b, d, idle)?;
    }
    f.flush()?;
    let rows = log.len();
    log.clear();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_rows() {
        start(Dir::H2D, 64).finish();
        start(Dir::Kernel, 0).finish();
        start(Dir::D2H, 64).finish();

        let path = std::env::temp_dir().join(format!("life-memtrace-{}.csv", std::process::id()));
        let rows = flush_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(rows >= 3);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("t_start_us,t_end_us,bytes,dir,idle_us"));
        assert!(text.contains(",64,H2D,"));
        assert!(text.contains(",0,Kernel,"));
        assert!(text.contains(",64,D2H,"));
    }
}
