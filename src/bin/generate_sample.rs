//! Writes synthetic `chicago.csv`, `new_york_city.csv` and `washington.csv`
//! in the layout the explorer reads. Usage: `generate_sample [OUT_DIR] [ROWS]`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// SplitMix64 generator, deterministic per seed.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `0..n`.
    fn below(&mut self, n: usize) -> usize {
        (self.unit() * n as f64) as usize % n.max(1)
    }

    /// Index into `weights`, proportional to each weight.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut pick = self.unit() * total;
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                return i;
            }
            pick -= w;
        }
        weights.len() - 1
    }

    /// Roughly normal: the sum of twelve uniforms, recentred.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = (0..12).map(|_| self.unit()).sum::<f64>() - 6.0;
        mean + std_dev * z
    }
}

struct CitySpec {
    file: &'static str,
    stations: &'static [&'static str],
    demographics: bool,
    fractional_durations: bool,
}

const CITIES: [CitySpec; 3] = [
    CitySpec {
        file: "chicago.csv",
        stations: &[
            "Streeter Dr & Grand Ave",
            "Lake Shore Dr & Monroe St",
            "Clinton St & Washington Blvd",
            "Canal St & Adams St",
            "Theater on the Lake",
            "Millennium Park",
        ],
        demographics: true,
        fractional_durations: false,
    },
    CitySpec {
        file: "new_york_city.csv",
        stations: &[
            "Pershing Square North",
            "E 17 St & Broadway",
            "W 21 St & 6 Ave",
            "Broadway & E 22 St",
            "West St & Chambers St",
            "12 Ave & W 40 St",
        ],
        demographics: true,
        fractional_durations: false,
    },
    CitySpec {
        file: "washington.csv",
        stations: &[
            "Columbus Circle / Union Station",
            "Lincoln Memorial",
            "Jefferson Dr & 14th St SW",
            "Massachusetts Ave & Dupont Circle NW",
            "15th & P St NW",
            "Thomas Circle",
        ],
        demographics: false,
        fractional_durations: true,
    },
];

/// Hour-of-day weights with morning and evening commute peaks.
const HOUR_WEIGHTS: [f64; 24] = [
    1.0, 0.5, 0.3, 0.2, 0.3, 1.0, 3.0, 6.0, 8.0, 5.0, 4.0, 4.5, 5.0, 5.0, 5.0, 6.0, 8.0, 10.0,
    7.0, 5.0, 3.5, 2.5, 2.0, 1.5,
];

/// Start and end of trip, biased toward the first few stations.
fn pick_route(rng: &mut SampleRng, stations: &[&'static str]) -> (&'static str, &'static str) {
    let weights: Vec<f64> = (0..stations.len()).map(|i| 1.0 / (i as f64 + 1.0)).collect();
    let from = rng.weighted(&weights);
    let mut to = rng.weighted(&weights);
    if to == from {
        to = (to + 1 + rng.below(stations.len() - 1)) % stations.len();
    }
    (stations[from], stations[to])
}

fn start_time(rng: &mut SampleRng, year_start: NaiveDateTime) -> NaiveDateTime {
    // January through June
    let day = rng.below(181) as i64;
    let hour = rng.weighted(&HOUR_WEIGHTS) as i64;
    let second = rng.below(3600) as i64;
    year_start + Duration::days(day) + Duration::hours(hour) + Duration::seconds(second)
}

fn write_city(dir: &Path, spec: &CitySpec, rows: usize, rng: &mut SampleRng) -> Result<()> {
    let path = dir.join(spec.file);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec![
        "",
        "Start Time",
        "End Time",
        "Trip Duration",
        "Start Station",
        "End Station",
        "User Type",
    ];
    if spec.demographics {
        header.extend(["Gender", "Birth Year"]);
    }
    writer.write_record(&header)?;

    let year_start = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid base date")?;

    for id in 0..rows {
        let start = start_time(rng, year_start);
        let seconds = rng.normal(900.0, 400.0).max(60.0);
        let seconds = if spec.fractional_durations {
            (seconds * 1000.0).round() / 1000.0
        } else {
            seconds.round()
        };
        let end = start + Duration::milliseconds((seconds * 1000.0) as i64);
        let (from, to) = pick_route(rng, spec.stations);
        let subscriber = rng.unit() < 0.8;

        let mut record = vec![
            (id * 7 + 11).to_string(),
            start.format("%Y-%m-%d %H:%M:%S").to_string(),
            end.format("%Y-%m-%d %H:%M:%S").to_string(),
            seconds.to_string(),
            from.to_string(),
            to.to_string(),
            if subscriber { "Subscriber" } else { "Customer" }.to_string(),
        ];
        if spec.demographics {
            // customers often leave demographics blank
            let blank = !subscriber && rng.unit() < 0.6;
            let gender = match (blank, rng.unit() < 0.7) {
                (true, _) => "",
                (false, true) => "Male",
                (false, false) => "Female",
            };
            let birth_year = if blank {
                String::new()
            } else {
                format!("{:.1}", rng.normal(1982.0, 11.0).round().clamp(1920.0, 2001.0))
            };
            record.push(gender.to_string());
            record.push(birth_year);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!("Wrote {rows} trips to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let rows = match args.next() {
        Some(n) => n.parse::<usize>().with_context(|| format!("invalid row count '{n}'"))?,
        None => 5_000,
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SampleRng(42);
    for spec in &CITIES {
        write_city(&out_dir, spec, rows, &mut rng)?;
    }
    Ok(())
}
