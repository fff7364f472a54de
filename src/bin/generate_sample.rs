//! Write a synthetic observation CSV for one model profile.
//!
//! Usage: `generate_sample [tess|kepler] [rows] [output.csv]`

use anyhow::{Context, Result};

use exoscope::data::schema::{FieldSpec, ModelId};

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

/// Jitter a default value. Flags stay 0/1, counts stay whole, everything
/// else is perturbed by ~15% and rounded to the field's step.
fn sample_value(field: &FieldSpec, default: f64, rng: &mut SimpleRng) -> f64 {
    if field.key.contains("fpflag") {
        return if rng.next_f64() < 0.2 { 1.0 } else { 0.0 };
    }
    let spread = if default == 0.0 { 1.0 } else { default.abs() * 0.15 };
    let value = rng.gauss(default, spread);
    let value = if default >= 0.0 { value.abs() } else { value };
    if field.step >= 1.0 {
        value.round()
    } else {
        (value / field.step).round() * field.step
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let model: ModelId = match args.next() {
        Some(arg) => arg.parse()?,
        None => ModelId::default(),
    };
    let rows: usize = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid row count {arg:?}"))?,
        None => 10,
    };
    let output_path = args
        .next()
        .unwrap_or_else(|| format!("sample_{}.csv", model.as_str()));

    let profile = model.profile();
    let defaults = profile.default_values();
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(profile.fields().iter().map(|f| f.key.as_str()))?;
    for _ in 0..rows {
        let record: Vec<String> = profile
            .fields()
            .iter()
            .map(|field| {
                let default = defaults.number(&field.key).unwrap_or(0.0);
                format!("{}", sample_value(field, default, &mut rng))
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!(
        "Wrote {rows} {} observations ({} fields each) to {output_path}",
        model.display_name(),
        profile.fields().len()
    );
    Ok(())
}
