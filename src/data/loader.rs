use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{City, RawTrip, TripRecord, TripSchema, TripTable};
use crate::config::ExplorerConfig;
use crate::error::ExploreError;

// ---------------------------------------------------------------------------
// Source columns
// ---------------------------------------------------------------------------

pub const START_TIME: &str = "Start Time";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED_COLUMNS: [&str; 5] = [
    START_TIME,
    TRIP_DURATION,
    START_STATION,
    END_STATION,
    USER_TYPE,
];

/// Layouts accepted for `Start Time`.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// One source row as found in CSV and JSON files. Columns not listed here
/// (`End Time`, the unnamed index column) are ignored.
#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Trip Duration")]
    duration: f64,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "User Type", default)]
    user_type: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(rename = "Birth Year", default)]
    birth_year: Option<f64>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the trip table for `city` from the source the configuration maps it to.
pub fn load(config: &ExplorerConfig, city: City) -> Result<TripTable> {
    let path = config.source_path(city);
    log::info!("Loading {city} trips from {}", path.display());
    let table = load_file(&path).with_context(|| format!("loading {city} data"))?;
    log::info!(
        "Loaded {} {city} trips (gender: {}, birth year: {})",
        table.len(),
        table.schema().has_gender,
        table.schema().has_birth_year
    );
    Ok(table)
}

/// Load a trip table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the source column names (recommended)
/// * `.json`    – `[{ "Start Time": "...", "Trip Duration": 600, ... }, ...]`
/// * `.parquet` – one column per source column; `Start Time` may be text or a timestamp
pub fn load_file(path: &Path) -> Result<TripTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text)
        }
        "parquet" | "pq" => load_parquet(path),
        other => Err(ExploreError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

/// Parse a start timestamp in any of the accepted layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn timestamp_at(row: usize, value: &str) -> Result<NaiveDateTime> {
    parse_timestamp(value).ok_or_else(|| {
        ExploreError::MalformedTimestamp {
            row,
            value: value.to_string(),
        }
        .into()
    })
}

/// Blank text cells count as missing values.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Birth years come through as floats (`1989.0`) because of blank cells.
fn birth_year(value: Option<f64>) -> Option<i32> {
    value.filter(|y| y.is_finite()).map(|y| y as i32)
}

impl SourceRow {
    fn into_raw(self, row: usize) -> Result<RawTrip> {
        Ok(RawTrip {
            start_time: timestamp_at(row, &self.start_time)?,
            duration: self.duration,
            start_station: self.start_station,
            end_station: self.end_station,
            user_type: self.user_type.unwrap_or_default(),
            gender: non_blank(self.gender),
            birth_year: birth_year(self.birth_year),
        })
    }
}

fn require_columns(mut has: impl FnMut(&str) -> bool) -> Result<()> {
    for col in REQUIRED_COLUMNS {
        if !has(col) {
            return Err(ExploreError::MissingColumn(col.to_string()).into());
        }
    }
    Ok(())
}

fn finish(schema: TripSchema, rows: Vec<RawTrip>) -> TripTable {
    TripTable::new(schema, rows.into_iter().map(TripRecord::from).collect())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the source column names, one trip per line.
/// Header names are trimmed before they are matched or deserialized.
pub fn read_csv<R: Read>(source: R) -> Result<TripTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(source);
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);

    require_columns(has)?;
    let schema = TripSchema {
        has_gender: has(GENDER),
        has_birth_year: has(BIRTH_YEAR),
    };

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<SourceRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(row.into_raw(row_no)?);
    }

    Ok(finish(schema, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as `df.to_json(orient='records')` writes):
///
/// ```json
/// [
///   {
///     "Start Time": "2017-01-01 09:07:57",
///     "Trip Duration": 1138,
///     "Start Station": "Broadway & Barry Ave",
///     "End Station": "Sedgwick St & North Ave",
///     "User Type": "Subscriber",
///     "Gender": "Male",
///     "Birth Year": 1984.0
///   },
///   ...
/// ]
/// ```
pub fn parse_json(text: &str) -> Result<TripTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut schema = TripSchema::default();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        require_columns(|col| obj.contains_key(col)).with_context(|| format!("Row {i}"))?;
        schema.has_gender |= obj.contains_key(GENDER);
        schema.has_birth_year |= obj.contains_key(BIRTH_YEAR);

        let row: SourceRow =
            serde_json::from_value(rec.clone()).with_context(|| format!("Row {i}"))?;
        rows.push(row.into_raw(i)?);
    }

    Ok(finish(schema, rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of trips.
///
/// Text columns may be Utf8 or LargeUtf8; numeric columns any integer or
/// float type. `Start Time` may also be an Arrow timestamp.
fn load_parquet(path: &Path) -> Result<TripTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let arrow_schema = builder.schema().clone();
    let has = |name: &str| arrow_schema.index_of(name).is_ok();
    require_columns(has)?;
    let schema = TripSchema {
        has_gender: has(GENDER),
        has_birth_year: has(BIRTH_YEAR),
    };

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, schema, &mut rows)?;
    }

    Ok(finish(schema, rows))
}

/// Column of a batch cast to `to`, or `None` when the batch lacks it.
fn column_as(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let converted = cast(batch.column(idx).as_ref(), to).with_context(|| format!("casting '{name}' to {to:?}"))?;
    Ok(Some(converted))
}

fn required_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    column_as(batch, name, to)?
        .ok_or_else(|| ExploreError::MissingColumn(name.to_string()).into())
}

fn read_batch(batch: &RecordBatch, schema: TripSchema, rows: &mut Vec<RawTrip>) -> Result<()> {
    let start = required_column(batch, START_TIME, &DataType::Utf8)?;
    let duration = required_column(batch, TRIP_DURATION, &DataType::Float64)?;
    let start_station = required_column(batch, START_STATION, &DataType::Utf8)?;
    let end_station = required_column(batch, END_STATION, &DataType::Utf8)?;
    let user_type = required_column(batch, USER_TYPE, &DataType::Utf8)?;
    let gender = if schema.has_gender {
        column_as(batch, GENDER, &DataType::Utf8)?
    } else {
        None
    };
    let birth = if schema.has_birth_year {
        column_as(batch, BIRTH_YEAR, &DataType::Float64)?
    } else {
        None
    };

    let start = start.as_string::<i32>();
    let duration = duration.as_primitive::<Float64Type>();
    let start_station = start_station.as_string::<i32>();
    let end_station = end_station.as_string::<i32>();
    let user_type = user_type.as_string::<i32>();
    let gender = gender.as_ref().map(|g| g.as_string::<i32>());
    let birth = birth.as_ref().map(|b| b.as_primitive::<Float64Type>());

    let offset = rows.len();
    for row in 0..batch.num_rows() {
        let row_no = offset + row;
        let start_text = if start.is_null(row) { "" } else { start.value(row) };
        if duration.is_null(row) {
            bail!("Row {row_no}: null '{TRIP_DURATION}'");
        }
        let text = |arr: &arrow::array::StringArray| -> String {
            if arr.is_null(row) {
                String::new()
            } else {
                arr.value(row).to_string()
            }
        };

        rows.push(RawTrip {
            start_time: timestamp_at(row_no, start_text)?,
            duration: duration.value(row),
            start_station: text(start_station),
            end_station: text(end_station),
            user_type: text(user_type),
            gender: gender.and_then(|g| non_blank(Some(text(g)))),
            birth_year: birth.and_then(|b| birth_year((!b.is_null(row)).then(|| b.value(row)))),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use chrono::{Month, Weekday};
    use parquet::arrow::ArrowWriter;

    use super::*;

    const CHICAGO: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1423854,2017-06-23 15:09:32,2017-06-23 15:14:53,321,Wood St & Hubbard St,Damen Ave & Chicago Ave,Subscriber,Male,1992.0
955915,2017-05-25 18:19:03,2017-05-25 18:45:53,1610,Theater on the Lake,Sheffield Ave & Waveland Ave,Subscriber,Female,1992.0
9031,2017-01-04 08:27:49,2017-01-04 08:34:45,416,May St & Taylor St,Wood St & Taylor St,Subscriber,,
304487,2017-03-06 13:49:38,2017-03-06 13:55:28,350,Christiana Ave & Lawrence Ave,St. Louis Ave & Balmoral Ave,Customer,,
";

    const WASHINGTON: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type
1621326,2017-06-21 08:36:34,2017-06-21 08:44:43,489.066,14th & Belmont St NW,15th & K St NW,Subscriber
482740,2017-03-11 10:40:00,2017-03-11 10:46:00,402.549,Yuma St & Tenley Circle NW,Connecticut Ave & Yuma St NW,Subscriber
";

    #[test]
    fn csv_with_optional_columns() {
        let table = read_csv(CHICAGO.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.schema().has_gender);
        assert!(table.schema().has_birth_year);

        let first = table.iter().next().unwrap();
        assert_eq!(first.month, Month::June);
        assert_eq!(first.weekday, Weekday::Fri);
        assert_eq!(first.hour, 15);
        assert_eq!(first.duration, 321.0);
        assert_eq!(first.gender.as_deref(), Some("Male"));
        assert_eq!(first.birth_year, Some(1992));

        let third = table.iter().nth(2).unwrap();
        assert_eq!(third.gender, None);
        assert_eq!(third.birth_year, None);
        assert!(table.iter().all(|r| r.hour <= 23));
    }

    #[test]
    fn csv_without_optional_columns() {
        let table = read_csv(WASHINGTON.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.schema(), TripSchema::default());
        let first = table.iter().next().unwrap();
        assert_eq!(first.duration, 489.066);
        assert_eq!(first.weekday_name(), "Wednesday");
    }

    #[test]
    fn malformed_timestamp_fails_the_load() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-01-01 00:00:01,10,A,B,Subscriber\n\
                   yesterday,10,A,B,Subscriber\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExploreError>(),
            Some(&ExploreError::MalformedTimestamp {
                row: 1,
                value: "yesterday".to_string()
            })
        );
    }

    #[test]
    fn padded_headers_still_match() {
        let csv = "Start Time, Trip Duration , Start Station,End Station ,User Type,  Gender\n\
                   2017-01-01 00:00:01,10,A,B,Subscriber,Female\n";
        let table = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.schema().has_gender);
        let first = table.iter().next().unwrap();
        assert_eq!(first.duration, 10.0);
        assert_eq!(first.end_station, "B");
        assert_eq!(first.gender.as_deref(), Some("Female"));
    }

    #[test]
    fn missing_required_column() {
        let csv = "Start Time,Trip Duration,Start Station,User Type\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExploreError>(),
            Some(&ExploreError::MissingColumn(END_STATION.to_string()))
        );
    }

    #[test]
    fn accepts_iso_timestamps() {
        let ts = parse_timestamp("2017-02-03T04:05:06").unwrap();
        assert_eq!(ts.to_string(), "2017-02-03 04:05:06");
        assert!(parse_timestamp("2017-02-03 04:05").is_some());
        assert!(parse_timestamp("2017-02-03 04:05:06.250").is_some());
        assert!(parse_timestamp("03/02/2017").is_none());
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"Start Time": "2017-01-01 09:07:57", "Trip Duration": 1138,
             "Start Station": "A", "End Station": "B", "User Type": "Customer",
             "Gender": null, "Birth Year": 1984.0},
            {"Start Time": "2017-01-02 10:00:00", "Trip Duration": 60.5,
             "Start Station": "B", "End Station": "A", "User Type": "Subscriber",
             "Gender": "Female", "Birth Year": null}
        ]"#;
        let table = parse_json(text).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.schema().has_gender);
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(rows[0].gender, None);
        assert_eq!(rows[0].birth_year, Some(1984));
        assert_eq!(rows[1].gender.as_deref(), Some("Female"));
        assert_eq!(rows[1].duration, 60.5);
    }

    #[test]
    fn json_malformed_timestamp_fails_the_load() {
        let text = r#"[
            {"Start Time": "2017-01-01 09:07:57", "Trip Duration": 60,
             "Start Station": "A", "End Station": "B", "User Type": "Customer"},
            {"Start Time": "01/02/2017", "Trip Duration": 60,
             "Start Station": "B", "End Station": "A", "User Type": "Customer"}
        ]"#;
        let err = parse_json(text).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExploreError>(),
            Some(&ExploreError::MalformedTimestamp {
                row: 1,
                value: "01/02/2017".to_string()
            })
        );
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("trips.xlsx")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExploreError>(),
            Some(&ExploreError::UnsupportedFormat("xlsx".to_string()))
        );
    }

    #[test]
    fn parquet_file() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(START_TIME, DataType::Utf8, false),
            Field::new(TRIP_DURATION, DataType::Int64, false),
            Field::new(START_STATION, DataType::Utf8, false),
            Field::new(END_STATION, DataType::Utf8, false),
            Field::new(USER_TYPE, DataType::Utf8, true),
            Field::new(BIRTH_YEAR, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2017-04-03 07:00:00", "2017-04-04 19:30:00"])),
                Arc::new(Int64Array::from(vec![300, 900])),
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(StringArray::from(vec!["B", "A"])),
                Arc::new(StringArray::from(vec![Some("Subscriber"), None])),
                Arc::new(Float64Array::from(vec![Some(1975.0), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.schema(),
            TripSchema {
                has_gender: false,
                has_birth_year: true
            }
        );
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(rows[0].duration, 300.0);
        assert_eq!(rows[0].birth_year, Some(1975));
        assert_eq!(rows[1].hour, 19);
        assert_eq!(rows[1].user_type, "");
        assert_eq!(rows[1].birth_year, None);
    }

    #[test]
    fn parquet_null_timestamp_fails_the_load() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(START_TIME, DataType::Utf8, true),
            Field::new(TRIP_DURATION, DataType::Float64, false),
            Field::new(START_STATION, DataType::Utf8, false),
            Field::new(END_STATION, DataType::Utf8, false),
            Field::new(USER_TYPE, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("2017-04-03 07:00:00"), None])),
                Arc::new(Float64Array::from(vec![300.0, 900.0])),
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(StringArray::from(vec!["B", "A"])),
                Arc::new(StringArray::from(vec!["Subscriber", "Customer"])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExploreError>(),
            Some(&ExploreError::MalformedTimestamp {
                row: 1,
                value: String::new()
            })
        );
    }

    #[test]
    fn loads_city_through_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("washington.csv"), WASHINGTON).unwrap();
        let config = ExplorerConfig {
            data_dir: dir.path().to_path_buf(),
            sources: BTreeMap::from([("washington".to_string(), "washington.csv".into())]),
            ..ExplorerConfig::default()
        };
        let table = load(&config, City::Washington).unwrap();
        assert_eq!(table.len(), 2);
    }
}
