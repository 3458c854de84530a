use std::io::Write;

use popquery::census::{load_census, project_latitude};
use popquery::{Cutoffs, GridShape, PopulationIndex, TotalPopulationPolicy, Version};

const BLOCKS: &str = "\
STATEFP,COUNTYFP,TRACTCE,BLKGRPCE,POPULATION,LATITUDE,LONGITUDE
01,001,020100,1,698,32.464812,-86.486527
01,001,020100,2,1212,32.480175,-86.489059
01,001,020200,1,1133,32.471439,-86.473957
06,037,101110,1,1417,34.259719,-118.296196
06,037,101110,2,1040,34.255823,-118.291974
06,037,101122,1,300,bad,-118.283016
72,127,000100,1,
";

fn write_blocks() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(BLOCKS.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn end_to_end_from_file() {
    let f = write_blocks();
    let ds = load_census(f.path(), TotalPopulationPolicy::CountParsed).unwrap();
    assert_eq!(ds.len(), 5);
    assert_eq!(ds.included_population(), 698 + 1212 + 1133 + 1417 + 1040);
    assert_eq!(ds.total_population(), ds.included_population() + 300);

    let shape = GridShape::new(2, 1).unwrap();
    let index = PopulationIndex::build(ds, shape, Version::V5, Cutoffs::new(2, 1).unwrap()).unwrap();
    let bbox = index.bounding_box();
    assert_eq!(bbox.left, -118.296196);
    assert_eq!(bbox.right, -86.473957);
    assert!((bbox.top - project_latitude(34.259719)).abs() < 1e-12);
    assert!((bbox.bottom - project_latitude(32.464812)).abs() < 1e-12);

    // west half is California, east half Alabama
    let west = index.query(1, 1, 1, 1).unwrap();
    let east = index.query(2, 1, 2, 1).unwrap();
    assert_eq!(west.population, 1417 + 1040);
    assert_eq!(east.population, 698 + 1212 + 1133);
    let all = index.query(1, 1, 2, 1).unwrap();
    assert_eq!(all.population, west.population + east.population);
    assert!(all.percentage < 100.0);
}

#[test]
fn included_only_policy_gives_full_percentage() {
    let f = write_blocks();
    let ds = load_census(f.path(), TotalPopulationPolicy::IncludedOnly).unwrap();
    let index = PopulationIndex::build(ds, GridShape::new(3, 3).unwrap(), Version::V1, Cutoffs::default()).unwrap();
    assert_eq!(index.query(1, 1, 3, 3).unwrap().to_string(), "5500 100.00%");
}
