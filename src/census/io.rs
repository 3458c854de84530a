use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::types::{Dataset, GeoPoint, TotalPopulationPolicy};

const FIELDS_PER_ROW: usize = 7;
const POPULATION_FIELD: usize = 4;
const LATITUDE_FIELD: usize = 5;
const LONGITUDE_FIELD: usize = 6;
const TICK_EVERY: u64 = 16_384;

/// Field `idx` as UTF-8 text parsed into `T`; `None` on bad bytes or bad text.
fn parse_field<T: FromStr>(record: &ByteRecord, idx: usize) -> Option<T> {
    std::str::from_utf8(&record[idx]).ok()?.parse().ok()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: u64,
    pub wrong_width: u64,
    pub unparsable: u64,
}

pub fn load_census(path: &Path, policy: TotalPopulationPolicy) -> Result<Dataset> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let (dataset, stats) =
        read_census(f, policy).with_context(|| format!("read {}", path.display()))?;
    log::info!(
        "loaded {} points from {} rows ({} wrong width, {} unparsable) in {}",
        dataset.len(),
        stats.rows,
        stats.wrong_width,
        stats.unparsable,
        path.display()
    );
    if dataset.total_population() != dataset.included_population() {
        log::warn!(
            "total population {} differs from included population {} (policy {:?})",
            dataset.total_population(),
            dataset.included_population(),
            policy
        );
    }
    Ok(dataset)
}

/// Parse census rows: population in field 4, latitude and longitude in
/// degrees in fields 5 and 6. Rows with a field count other than 7, or
/// with any of the three fields unparsable, are left out of the points.
pub fn read_census<R: Read>(
    reader: R,
    policy: TotalPopulationPolicy,
) -> Result<(Dataset, LoadStats)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let mut stats = LoadStats::default();
    let mut points = Vec::new();
    let mut total: i64 = 0;

    // byte records: a stray Latin-1 byte in a name field must not end the load
    for record in rdr.byte_records() {
        let record = record.context("malformed csv record")?;
        stats.rows += 1;
        if stats.rows % TICK_EVERY == 0 {
            pb.set_position(stats.rows);
        }
        if record.len() != FIELDS_PER_ROW {
            stats.wrong_width += 1;
            continue;
        }

        let population = parse_field::<i64>(&record, POPULATION_FIELD);
        let latitude = parse_field::<f64>(&record, LATITUDE_FIELD);
        let longitude = parse_field::<f64>(&record, LONGITUDE_FIELD);

        if let (Some(pop), TotalPopulationPolicy::CountParsed) = (population, policy) {
            total += pop;
        }
        match (population, latitude, longitude) {
            (Some(pop), Some(lat), Some(lon)) => {
                if policy == TotalPopulationPolicy::IncludedOnly {
                    total += pop;
                }
                points.push(GeoPoint::from_degrees(pop, lat, lon));
            }
            _ => stats.unparsable += 1,
        }
    }
    pb.finish_and_clear();

    Ok((Dataset::new(points, total), stats))
}
