use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

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

/// Logistic epidemic curve: expected new cases on `day`.
fn expected_new_cases(day: f64, peak_day: f64, peak_cases: f64, spread: f64) -> f64 {
    let z = (day - peak_day) / spread;
    peak_cases / z.cosh().powi(2)
}

#[derive(Default)]
struct Columns {
    date: Vec<String>,
    iso_code: Vec<&'static str>,
    continent: Vec<&'static str>,
    location: Vec<&'static str>,
    new_cases: Vec<i64>,
    total_cases: Vec<i64>,
    new_deaths: Vec<i64>,
    total_deaths: Vec<i64>,
    stringency_index: Vec<Option<f64>>,
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let start = NaiveDate::from_ymd_opt(2020, 1, 22).context("invalid start date")?;
    let n_days = 150u64;

    // (iso, continent, location, peak day, peak daily cases, curve width)
    let countries = [
        ("CHN", "Asia", "China", 20.0, 3500.0, 6.0),
        ("JPN", "Asia", "Japan", 80.0, 600.0, 10.0),
        ("FRA", "Europe", "France", 70.0, 5000.0, 9.0),
        ("ITA", "Europe", "Italy", 60.0, 6000.0, 10.0),
        ("USA", "North America", "United States", 95.0, 32000.0, 18.0),
        ("BRA", "South America", "Brazil", 130.0, 40000.0, 20.0),
        ("ZAF", "Africa", "South Africa", 140.0, 9000.0, 15.0),
        ("AUS", "Australia", "Australia", 65.0, 400.0, 8.0),
    ];

    let mut cols = Columns::default();

    for &(iso, continent, location, peak_day, peak_cases, spread) in &countries {
        let mut total_cases = 0i64;
        let mut total_deaths = 0i64;
        for d in 0..n_days {
            let date = start
                .checked_add_days(Days::new(d))
                .context("date overflow")?;
            let expected = expected_new_cases(d as f64, peak_day, peak_cases, spread);
            let new_cases = rng.gauss(expected, expected.sqrt() + 1.0).round().max(0.0) as i64;
            let new_deaths = (new_cases as f64 * rng.gauss(0.03, 0.01).clamp(0.0, 0.1)).round() as i64;
            total_cases += new_cases;
            total_deaths += new_deaths;

            // Stringency reporting starts a few weeks in.
            let stringency = (d >= 30).then(|| (rng.gauss(60.0, 15.0)).clamp(0.0, 100.0));

            cols.date.push(date.format("%Y-%m-%d").to_string());
            cols.iso_code.push(iso);
            cols.continent.push(continent);
            cols.location.push(location);
            cols.new_cases.push(new_cases);
            cols.total_cases.push(total_cases);
            cols.new_deaths.push(new_deaths);
            cols.total_deaths.push(total_deaths);
            cols.stringency_index.push(stringency);
        }
    }

    let n_rows = cols.date.len();
    write_csv("sample_data.csv", &cols)?;
    write_parquet("sample_data.parquet", cols)?;

    println!(
        "Wrote {n_rows} rows ({} countries × {n_days} days) to sample_data.csv and sample_data.parquet",
        countries.len()
    );
    Ok(())
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "date",
        "iso_code",
        "continent",
        "location",
        "new_cases",
        "total_cases",
        "new_deaths",
        "total_deaths",
        "stringency_index",
    ])?;
    for i in 0..cols.date.len() {
        writer.write_record([
            cols.date[i].clone(),
            cols.iso_code[i].to_string(),
            cols.continent[i].to_string(),
            cols.location[i].to_string(),
            cols.new_cases[i].to_string(),
            cols.total_cases[i].to_string(),
            cols.new_deaths[i].to_string(),
            cols.total_deaths[i].to_string(),
            cols.stringency_index[i]
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, cols: Columns) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("iso_code", DataType::Utf8, false),
        Field::new("continent", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, false),
        Field::new("new_cases", DataType::Int64, false),
        Field::new("total_cases", DataType::Int64, false),
        Field::new("new_deaths", DataType::Int64, false),
        Field::new("total_deaths", DataType::Int64, false),
        Field::new("stringency_index", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cols.date)),
            Arc::new(StringArray::from(cols.iso_code)),
            Arc::new(StringArray::from(cols.continent)),
            Arc::new(StringArray::from(cols.location)),
            Arc::new(Int64Array::from(cols.new_cases)),
            Arc::new(Int64Array::from(cols.total_cases)),
            Arc::new(Int64Array::from(cols.new_deaths)),
            Arc::new(Int64Array::from(cols.total_deaths)),
            Arc::new(Float64Array::from(cols.stringency_index)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
