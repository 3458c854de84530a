use anyhow::{Context, Result};
use env_logger::Env;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use popquery::census::load_census;
use popquery::query::parse_query_line;
use popquery::{GridShape, PopulationIndex, Version, runtime};

struct Args {
    input: PathBuf,
    shape: GridShape,
    version: Version,
}

fn usage() -> ! {
    eprintln!(
        "usage: popquery <census.csv> <xdim> <ydim> <-v1|-v2|-v3|-v4|-v5|-v6>\n\
         \n  xdim, ydim  number of grid buckets along longitude and latitude\n\
         \n  then one query per line on stdin: west south east north"
    );
    std::process::exit(1);
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 4 {
        usage();
    }
    let xdim: usize = args[1]
        .parse()
        .with_context(|| format!("xdim {:?} is not a positive integer", args[1]))?;
    let ydim: usize = args[2]
        .parse()
        .with_context(|| format!("ydim {:?} is not a positive integer", args[2]))?;
    Ok(Args {
        input: PathBuf::from(&args[0]),
        shape: GridShape::new(xdim, ydim)?,
        version: args[3].parse()?,
    })
}

/// Answer queries until a line is not a valid rectangle.
fn run_queries<R: BufRead, W: Write>(index: &PopulationIndex, input: R, mut out: W) -> Result<usize> {
    let mut answered = 0;
    for line in input.lines() {
        let line = line.context("read query")?;
        let Some((west, south, east, north)) = parse_query_line(&line) else {
            break;
        };
        let Some(answer) = index.query(west, south, east, north) else {
            break;
        };
        writeln!(out, "{answer}")?;
        out.flush()?;
        answered += 1;
    }
    Ok(answered)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    runtime::configure_thread_pool();
    let cutoffs = runtime::cutoffs_from_env();
    log::info!(
        "version {} on {}x{} grid (point cutoff {}, grid cutoff {})",
        args.version,
        args.shape.xdim,
        args.shape.ydim,
        cutoffs.points,
        cutoffs.cells
    );

    let dataset = load_census(&args.input, runtime::total_policy_from_env())?;
    let index = PopulationIndex::build(dataset, args.shape, args.version, cutoffs)?;
    runtime::report_memory("build", runtime::memory_budget_bytes())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "Total Population: {}\n The boundaries for data: {}",
        index.dataset().total_population(),
        index.bounding_box()
    )?;
    out.flush()?;

    let answered = run_queries(&index, io::stdin().lock(), out)?;
    log::info!("answered {answered} queries");
    Ok(())
}
