use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Popularity curve of a name: births per department-year around a peak.
fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
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

struct Row {
    sexe: &'static str,
    preusuel: &'static str,
    annais: String,
    dpt: &'static str,
    nombre: i64,
}

/// (sex code, name, peak year, spread in years, peak births per department)
const NAMES: [(&str, &str, f64, f64, f64); 8] = [
    ("2", "MARIE", 1925.0, 30.0, 400.0),
    ("1", "JEAN", 1940.0, 25.0, 350.0),
    ("2", "NATHALIE", 1967.0, 6.0, 250.0),
    ("1", "THOMAS", 1990.0, 10.0, 180.0),
    ("2", "CAMILLE", 1998.0, 12.0, 120.0),
    ("1", "CAMILLE", 1965.0, 15.0, 40.0),
    ("2", "LÉA", 2005.0, 8.0, 150.0),
    ("1", "GABRIEL", 2018.0, 7.0, 130.0),
];

/// (department code, relative population)
const DEPARTMENTS: [(&str, f64); 8] = [
    ("75", 1.0),
    ("13", 0.9),
    ("69", 0.8),
    ("35", 0.4),
    ("2A", 0.05),
    ("2B", 0.05),
    ("971", 0.1),
    ("974", 0.15),
];

/// The registry withholds counts below this threshold.
const MIN_PUBLISHED: i64 = 3;

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let mut rows = Vec::new();
    for &(sexe, preusuel, peak, spread, amplitude) in &NAMES {
        let mut withheld = 0;
        for year in 1900..=2020 {
            for &(dpt, weight) in &DEPARTMENTS {
                let mean = gaussian(year as f64, peak, spread, amplitude * weight);
                let nombre = rng.gauss(mean, mean.sqrt().max(0.5)).round() as i64;
                if nombre < MIN_PUBLISHED {
                    withheld += nombre.max(0);
                    continue;
                }
                rows.push(Row {
                    sexe,
                    preusuel,
                    annais: year.to_string(),
                    dpt,
                    nombre,
                });
            }
        }
        // Withheld births are published once, without a year.
        if withheld >= MIN_PUBLISHED {
            rows.push(Row {
                sexe,
                preusuel,
                annais: "XXXX".to_string(),
                dpt: "XX",
                nombre: withheld,
            });
        }
    }
    log::info!("Generated {} rows", rows.len());

    write_csv("sample_dpt.csv", &rows)?;
    write_parquet("sample_dpt.parquet", &rows)?;

    println!(
        "Wrote {} rows ({} names, {} departments) to sample_dpt.csv and sample_dpt.parquet",
        rows.len(),
        NAMES.len(),
        DEPARTMENTS.len()
    );
    Ok(())
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating {path}"))?;
    writer.write_record(["sexe", "preusuel", "annais", "dpt", "nombre"])?;
    for row in rows {
        writer
            .write_record([
                row.sexe,
                row.preusuel,
                row.annais.as_str(),
                row.dpt,
                &row.nombre.to_string(),
            ])
            .with_context(|| format!("writing {path}"))?;
    }
    writer.flush().with_context(|| format!("flushing {path}"))?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sexe", DataType::Utf8, false),
        Field::new("preusuel", DataType::Utf8, false),
        Field::new("annais", DataType::Utf8, false),
        Field::new("dpt", DataType::Utf8, false),
        Field::new("nombre", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.sexe))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.preusuel))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.annais.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.dpt))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.nombre))),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
