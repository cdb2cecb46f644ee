//! CSV writers for trajectories and run statistics
//!
//! Plain comma-separated text with a header row. Existing files are truncated.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analysis::convergence::ConvergenceRow;
use crate::analysis::outcome::{Histogram, InitialPoint};
use crate::simulation::particle::Particle;

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file))
}

/// `t,y,z,vy,vz` for every recorded state
pub fn write_trajectory(path: &Path, particle: &Particle) -> std::io::Result<()> {
    let mut w = create(path)?;
    writeln!(w, "t,y,z,vy,vz")?;
    for entry in particle.history() {
        let s = &entry.state;
        writeln!(w, "{},{},{},{},{}", entry.t, s.r.x, s.r.y, s.v.x, s.v.y)?;
    }
    w.flush()
}

/// `from,to,count` per bin, normalized units
pub fn write_histogram(path: &Path, histogram: &Histogram) -> std::io::Result<()> {
    let mut w = create(path)?;
    writeln!(w, "from,to,count")?;
    for bin in &histogram.bins {
        writeln!(w, "{},{},{}", bin.from, bin.to, bin.count)?;
    }
    w.flush()
}

/// `y_over_r,vz` per particle
pub fn write_initial_conditions(path: &Path, points: &[InitialPoint]) -> std::io::Result<()> {
    let mut w = create(path)?;
    writeln!(w, "y_over_r,vz")?;
    for p in points {
        writeln!(w, "{},{}", p.y_over_r, p.vz)?;
    }
    w.flush()
}

/// `method,dt,steps,position_error,velocity_error` per sweep entry
pub fn write_convergence(path: &Path, rows: &[ConvergenceRow]) -> std::io::Result<()> {
    let mut w = create(path)?;
    writeln!(w, "method,dt,steps,position_error,velocity_error")?;
    for r in rows {
        writeln!(w, "{},{},{},{},{}", r.method, r.dt, r.steps, r.position_error, r.velocity_error)?;
    }
    w.flush()
}
