//! Loads and merges per-vehicle registry exports.
//!
//! Rows from every source are keyed by vehicle identifier. The first row
//! seen for an identifier wins across all sources; later duplicates are
//! dropped. Output keeps encounter order.

use flate2::read::GzDecoder;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::RepositoryError;
use crate::metrics::{ChargingPattern, DrivingHabit, MetricRecord, VehicleClass};
use crate::parser::{FieldValue, decode_or_absent, non_blank, parse_or_absent};

/// Efficiency readings outside this open interval are sensor noise.
const PLAUSIBLE_EFFICIENCY: (f64, f64) = (0.0, 20.0);

/// One export cell as raw bytes. Decoding is deferred so that a cell in a
/// foreign encoding only loses that field.
#[derive(Debug)]
struct Cell(Vec<u8>);

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = Cell;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a CSV cell")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Cell, E> {
                Ok(Cell(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Cell, E> {
                Ok(Cell(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
                Ok(Cell(v.as_bytes().to_vec()))
            }
        }

        deserializer.deserialize_byte_buf(CellVisitor)
    }
}

/// A single row of a registry export. Every cell is kept undecoded so that
/// one malformed value cannot reject the row.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportRow {
    #[serde(alias = "\u{feff}car_id")]
    car_id: Option<Cell>,
    #[serde(alias = "\u{feff}client_id")]
    client_id: Option<Cell>,
    cliend_id: Option<Cell>,
    car_type: Option<Cell>,
    model_year: Option<Cell>,
    model_month: Option<Cell>,

    efficiency: Option<Cell>,
    avg_temperature: Option<Cell>,
    cell_imbalance: Option<Cell>,
    accel_std: Option<Cell>,
    brake_std: Option<Cell>,
    daily_distance: Option<Cell>,
    cumulative_distance: Option<Cell>,
    charging_count: Option<Cell>,
    avg_charging_amount: Option<Cell>,
    high_soc_ratio: Option<Cell>,
    first_date: Option<Cell>,
    last_date: Option<Cell>,
}

/// Decoded text of `cell`, `None` when missing or not UTF-8.
fn text<'a>(field: &'static str, cell: &'a Option<Cell>) -> Option<&'a str> {
    decode_or_absent(field, cell.as_ref().map(|c| c.0.as_slice()))
}

/// Decodes then parses an optional column.
fn column<T: FieldValue>(field: &'static str, cell: &Option<Cell>) -> Option<T> {
    parse_or_absent(field, text(field, cell))
}

impl ExportRow {
    /// Primary identifier, falling back to the client aliases.
    pub fn vehicle_id(&self) -> Option<String> {
        non_blank(text("car_id", &self.car_id))
            .or_else(|| non_blank(text("client_id", &self.client_id)))
            .or_else(|| non_blank(text("cliend_id", &self.cliend_id)))
    }

    /// Builds a [`MetricRecord`], or `None` if the row has no identifier.
    pub fn into_record(self) -> Option<MetricRecord> {
        let vehicle_id = self.vehicle_id()?;
        let label = non_blank(text("car_type", &self.car_type));

        let model_year = column::<i32>("model_year", &self.model_year);
        let model_month = column::<u32>("model_month", &self.model_month).filter(|m| {
            let valid = (1..=12).contains(m);
            if !valid {
                warn!(vehicle_id = %vehicle_id, model_month = m, "Model month out of range");
            }
            valid
        });

        let efficiency = column::<f64>("efficiency", &self.efficiency).filter(|e| {
            let (low, high) = PLAUSIBLE_EFFICIENCY;
            let plausible = *e > low && *e < high;
            if !plausible {
                debug!(vehicle_id = %vehicle_id, efficiency = e, "Implausible efficiency dropped");
            }
            plausible
        });

        Some(MetricRecord {
            vehicle_class: VehicleClass::from_label(label.as_deref()),
            vehicle_class_raw: label,
            model_year,
            model_month,
            efficiency,
            avg_temperature: column("avg_temperature", &self.avg_temperature),
            cell_imbalance: column("cell_imbalance", &self.cell_imbalance),
            driving_habit: DrivingHabit {
                accel_std: column("accel_std", &self.accel_std),
                brake_std: column("brake_std", &self.brake_std),
                daily_distance: column("daily_distance", &self.daily_distance),
                cumulative_distance: column("cumulative_distance", &self.cumulative_distance),
            },
            charging_pattern: ChargingPattern {
                charging_count: column("charging_count", &self.charging_count),
                avg_charging_amount: column("avg_charging_amount", &self.avg_charging_amount),
                high_soc_ratio: column("high_soc_ratio", &self.high_soc_ratio),
            },
            first_seen: column("first_date", &self.first_date),
            last_seen: column("last_date", &self.last_date),
            vehicle_id,
        })
    }
}

/// Accumulates records across sources, keeping the first per vehicle.
#[derive(Debug, Default)]
pub struct FleetRepository {
    seen: HashSet<String>,
    records: Vec<MetricRecord>,
}

impl FleetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges every row of one CSV source. Unreadable rows are skipped;
    /// an unreadable header fails the whole source.
    /// Returns the number of records added.
    pub fn ingest<R: Read>(&mut self, name: &str, reader: R) -> Result<usize, RepositoryError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = match rdr.byte_headers() {
            Ok(headers) => headers.clone(),
            Err(source) => {
                return Err(RepositoryError::Csv {
                    path: name.to_string(),
                    source,
                });
            }
        };

        let mut added = 0;
        for (line, row) in rdr.byte_records().enumerate() {
            let row = match row.and_then(|r| r.deserialize::<ExportRow>(Some(&headers))) {
                Ok(row) => row,
                Err(e) => {
                    warn!(source = name, line = line + 2, error = %e, "Skipping unreadable row");
                    continue;
                }
            };

            let Some(record) = row.into_record() else {
                debug!(source = name, line = line + 2, "Skipping row without identifier");
                continue;
            };

            if self.seen.insert(record.vehicle_id.clone()) {
                self.records.push(record);
                added += 1;
            }
        }

        debug!(source = name, added, "Source merged");
        Ok(added)
    }

    /// Merges the file at `path`, decompressing `.gz` files.
    pub fn ingest_path(&mut self, path: &Path) -> Result<usize, RepositoryError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|source| RepositoryError::Io {
            path: name.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        if is_gzip(path) {
            self.ingest(&name, GzDecoder::new(reader))
        } else {
            self.ingest(&name, reader)
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

fn is_export(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    name.ends_with(".csv") || name.ends_with(".csv.gz")
}

/// Merges already-open sources in the given order.
pub fn load<R: Read>(sources: impl IntoIterator<Item = (String, R)>) -> Vec<MetricRecord> {
    let mut repo = FleetRepository::new();
    for (name, reader) in sources {
        if let Err(e) = repo.ingest(&name, reader) {
            warn!(error = %e, "Skipping unreadable source");
        }
    }
    repo.into_records()
}

/// Merges the files at `paths` in order. A file that cannot be opened is
/// logged and skipped.
#[tracing::instrument(skip_all, fields(sources = paths.len()))]
pub fn load_paths(paths: &[PathBuf]) -> Vec<MetricRecord> {
    let mut repo = FleetRepository::new();
    for path in paths {
        if let Err(e) = repo.ingest_path(path) {
            warn!(error = %e, "Skipping unreadable source");
        }
    }
    info!(vehicles = repo.len(), "Fleet dataset loaded");
    repo.into_records()
}

/// Lists every `*.csv` / `*.csv.gz` file directly inside `dir`, sorted by name.
pub fn export_files(dir: &Path) -> Result<Vec<PathBuf>, RepositoryError> {
    let io_err = |source| RepositoryError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_export(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads a single source fully, surfacing open errors.
pub fn read_source(path: &Path) -> Result<Vec<MetricRecord>, RepositoryError> {
    let mut repo = FleetRepository::new();
    repo.ingest_path(path)?;
    Ok(repo.into_records())
}
