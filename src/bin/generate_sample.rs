use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// One synthetic loop: saturation, coercive field, transition width,
/// offset and the drift accumulated over the measurement.
struct LoopShape {
    ms: f64,
    hc: f64,
    width: f64,
    offset: f64,
    drift: f64,
}

impl LoopShape {
    /// Ascending branch, measured first.
    fn up(&self, h: f64, progress: f64) -> f64 {
        self.offset + self.ms * ((h - self.hc) / self.width).tanh() + self.drift * progress
    }

    /// Descending branch, measured second.
    fn down(&self, h: f64, progress: f64) -> f64 {
        self.offset
            + self.ms * ((h + self.hc) / self.width).tanh()
            + self.drift * (1.0 + progress)
    }
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n = 301;
    let h_max = 300.0;

    let field_up: Vec<f64> = (0..n)
        .map(|i| -h_max + 2.0 * h_max * i as f64 / (n - 1) as f64)
        .collect();
    let field_down: Vec<f64> = field_up.iter().rev().copied().collect();
    let progress: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();

    let loops = [
        LoopShape {
            ms: 2.0e-3,
            hc: 45.0,
            width: 30.0,
            offset: 4.0e-4,
            drift: 1.5e-4,
        },
        LoopShape {
            ms: 1.6e-3,
            hc: 80.0,
            width: 25.0,
            offset: -2.0e-4,
            drift: -1.0e-4,
        },
    ];

    let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
    for (k, shape) in loops.iter().enumerate() {
        let up: Vec<f64> = field_up
            .iter()
            .zip(&progress)
            .map(|(&h, &t)| shape.up(h, t) + rng.gauss(0.0, 1.0e-5))
            .collect();
        let down: Vec<f64> = field_down
            .iter()
            .zip(&progress)
            .map(|(&h, &t)| shape.down(h, t) + rng.gauss(0.0, 1.0e-5))
            .collect();
        let c = k + 1;
        columns.push((format!("H_up{c}"), field_up.clone()));
        columns.push((format!("M_up{c}"), up));
        columns.push((format!("H_dw{c}"), field_down.clone()));
        columns.push((format!("M_dw{c}"), down));
    }

    // ---- CSV ----
    let csv_path = "sample_loops.csv";
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("Failed to create {csv_path}"))?;
    writer.write_record(columns.iter().map(|(name, _)| name.as_str()))?;
    for row in 0..n {
        writer.write_record(columns.iter().map(|(_, v)| format!("{:.6e}", v[row])))?;
    }
    writer.flush()?;

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, _)| Field::new(name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, v)| Arc::new(Float64Array::from(v.clone())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let parquet_path = "sample_loops.parquet";
    let file = std::fs::File::create(parquet_path)
        .with_context(|| format!("Failed to create {parquet_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} loops ({n} points per branch) to {csv_path} and {parquet_path}",
        loops.len()
    );
    Ok(())
}
