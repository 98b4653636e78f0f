//! spicetools command line
//!
//! Usage:
//!   cargo run --bin spicetools -- meta -o kernels.tm '$KERNELS/de440s.bsp'
//!   cargo run --bin spicetools -- et 2024-01-01T00:00:00
//!   cargo run --bin spicetools -- info de440s.bsp

use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand};
use spicetools::jplephem::{calendar, names, spk::seconds_to_jd, SPK};
use spicetools::kernel::MetaKernel;
use spicetools::phase::iau_hg_model_many;
use spicetools::query::{
    download_generic_kernel_with, download_jpl_de_with, horizons::EphemType, Numbering, SbGroup, SbKind,
};
use spicetools::{Config, Ephemeris, HorizonsQuery, SbdbQuery, Table};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Kernel meta-files, ephemeris time, JPL queries and SPK inspection",
    long_about = None
)]
struct Cli {
    /// Override the configured kernel directory
    #[arg(long, global = true)]
    kernel_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a kernel meta-file
    Meta {
        /// Output path of the meta-file
        #[arg(short, long)]
        output: PathBuf,
        /// Kernel paths, optionally starting with $KERNELS
        #[arg(required = true)]
        kernels: Vec<String>,
    },
    /// Download a JPL planetary ephemeris such as de440s
    DownloadDe {
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, action = ArgAction::SetTrue)]
        overwrite: bool,
    },
    /// Download a NAIF generic kernel such as lsk/naif0012.tls
    DownloadKernel {
        path: String,
        #[arg(long, action = ArgAction::SetTrue)]
        overwrite: bool,
    },
    /// Convert UTC strings to ephemeris time (TDB seconds past J2000)
    Et {
        /// Leapseconds or meta kernels to load first
        #[arg(short, long)]
        kernel: Vec<PathBuf>,
        #[arg(required = true)]
        times: Vec<String>,
    },
    /// Evaluate the IAU H,G phase function
    Hg {
        /// Slope parameter
        #[arg(short, long, default_value_t = spicetools::phase::DEFAULT_G)]
        g: f64,
        /// Phase angles in degrees
        #[arg(required = true, allow_negative_numbers = true)]
        alphas: Vec<f64>,
    },
    /// Query the JPL Small-Body Database
    Sbdb(SbdbArgs),
    /// Query JPL Horizons
    Horizons(HorizonsArgs),
    /// Describe the segments and comments of an SPK file
    Info {
        /// Display only file comments
        #[arg(short, long, action = ArgAction::SetTrue)]
        comments: bool,
        filename: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SbdbArgs {
    /// Comma-separated output fields
    #[arg(short, long, default_value = "spkid,full_name,a,e,i,H")]
    fields: String,
    /// a (asteroids) or c (comets)
    #[arg(long)]
    kind: Option<SbKind>,
    /// n (numbered) or u (unnumbered)
    #[arg(long)]
    numbering: Option<Numbering>,
    /// neo or pha
    #[arg(long)]
    group: Option<SbGroup>,
    /// Orbit class such as APO or JFc; may repeat
    #[arg(long = "class")]
    classes: Vec<String>,
    /// Field constraints as a JSON object
    #[arg(long)]
    cdata: Option<String>,
    #[arg(long)]
    limit: Option<u64>,
    #[arg(long)]
    limit_from: Option<u64>,
    #[arg(long, action = ArgAction::SetTrue)]
    full_precision: bool,
    /// Write CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HorizonsArgs {
    /// Target, e.g. 399 or "DES=2003200;"
    target: String,
    #[arg(long, default_value = "VECTORS")]
    ephem_type: EphemType,
    #[arg(long)]
    center: Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    stop: Option<String>,
    #[arg(long)]
    step: Option<String>,
    /// Discrete epochs; may repeat
    #[arg(long)]
    tlist: Vec<String>,
    #[arg(long)]
    quantities: Option<String>,
    #[arg(long)]
    ref_plane: Option<String>,
    #[arg(long)]
    out_units: Option<String>,
    #[arg(long)]
    vec_corr: Option<String>,
    /// Print the raw result text instead of a table
    #[arg(long, action = ArgAction::SetTrue)]
    raw: bool,
    /// Write CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn write_table(table: &Table, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            table.write_csv(File::create(path)?)?;
            eprintln!("Wrote {} rows to {}", table.len(), path.display());
        }
        None => table.write_csv(io::stdout().lock())?,
    }
    Ok(())
}

fn run_sbdb(config: &Config, args: SbdbArgs) -> Result<()> {
    let mut query = SbdbQuery::new()
        .fields(args.fields.split(',').map(str::trim))
        .classes(args.classes)
        .full_precision(args.full_precision);
    if let Some(kind) = args.kind {
        query = query.kind(kind);
    }
    if let Some(numbering) = args.numbering {
        query = query.numbering(numbering);
    }
    if let Some(group) = args.group {
        query = query.group(group);
    }
    if let Some(cdata) = args.cdata {
        query = query.constraint(cdata);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = args.limit_from {
        query = query.limit_from(offset);
    }
    write_table(&query.fetch_with(config)?, args.output.as_ref())
}

fn run_horizons(config: &Config, args: HorizonsArgs) -> Result<()> {
    let mut query = HorizonsQuery::new(args.target)
        .ephem_type(args.ephem_type)
        .tlist(args.tlist);
    if let Some(center) = args.center {
        query = query.center(center);
    }
    if let Some(start) = args.start {
        query = query.start_time(start);
    }
    if let Some(stop) = args.stop {
        query = query.stop_time(stop);
    }
    if let Some(step) = args.step {
        query = query.step_size(step);
    }
    if let Some(quantities) = args.quantities {
        query = query.quantities(quantities);
    }
    if let Some(plane) = args.ref_plane {
        query = query.ref_plane(plane);
    }
    if let Some(units) = args.out_units {
        query = query.out_units(units);
    }
    if let Some(corr) = args.vec_corr {
        query = query.vec_corr(corr);
    }

    if args.raw {
        println!("{}", query.fetch_text_with(config)?);
        return Ok(());
    }
    write_table(&query.fetch_with(config)?, args.output.as_ref())
}

/// Prints a section header with a title and separator line
fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn body_label(id: i32) -> String {
    match names::target_name(id) {
        Some(name) => names::titlecase(name),
        None => id.to_string(),
    }
}

fn display_comments(spk: &SPK) {
    match spk.comments() {
        Ok(comments) if !comments.trim().is_empty() => {
            print_section_header("File Comments");
            println!("{}", comments.trim_end());
        }
        Ok(_) => println!("\nNo comments found in file."),
        Err(e) => println!("\nFailed to read comments from file: {}", e),
    }
}

fn display_segments(spk: &SPK) {
    if spk.segments.is_empty() {
        println!("\nNo segments found in the file.");
        return;
    }

    print_section_header(&format!("Segments ({} total)", spk.segments.len()));
    println!(
        "{:<20} {:<20} {:<6} {:<6} {:<12} {:<12}",
        "Target", "Center", "Frame", "Type", "Start Date", "End Date"
    );

    let mut sorted: Vec<_> = spk.segments.iter().collect();
    sorted.sort_by(|a, b| a.center.cmp(&b.center).then_with(|| a.target.cmp(&b.target)));

    let mut bodies = BTreeSet::new();
    for segment in sorted {
        bodies.insert(segment.target);
        bodies.insert(segment.center);
        println!(
            "{:<20} {:<20} {:<6} {:<6} {:<12} {:<12}",
            body_label(segment.target),
            body_label(segment.center),
            segment.frame,
            segment.data_type,
            calendar::format_date(seconds_to_jd(segment.start_second)),
            calendar::format_date(seconds_to_jd(segment.end_second)),
        );
    }

    if let (Some(start), Some(end)) = (spk.start_jd(), spk.end_jd()) {
        print_section_header("Overall Time Coverage");
        println!(
            "{} (JD {:.1}) to {} (JD {:.1})",
            calendar::format_date(start),
            start,
            calendar::format_date(end),
            end
        );
    }

    print_section_header(&format!("Bodies ({})", bodies.len()));
    for id in bodies {
        println!("  - {} (ID: {})", body_label(id), id);
    }
}

fn run_info(filename: &PathBuf, comments_only: bool) -> Result<()> {
    let start_time = Instant::now();
    let spk = SPK::open(filename)?;
    println!("Analyzing {} ({})", filename.display(), spk.daf.locidw);
    println!("File loaded in {:.2?}", start_time.elapsed());

    if !comments_only {
        display_segments(&spk);
    }
    display_comments(&spk);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(dir) = &cli.kernel_dir {
        config = config.with_kernel_dir(dir);
    }

    match cli.command {
        Command::Meta { output, kernels } => {
            MetaKernel::new(&config.kernel_dir).kernels(kernels).write(&output)?;
            println!("{}", output.display());
        }
        Command::DownloadDe {
            name,
            output,
            overwrite,
        } => {
            let path = download_jpl_de_with(&config, &name, output.as_deref(), overwrite)?;
            println!("{}", path.display());
        }
        Command::DownloadKernel { path, overwrite } => {
            let path = download_generic_kernel_with(&config, &path, overwrite)?;
            println!("{}", path.display());
        }
        Command::Et { kernel, times } => {
            let mut ephem = Ephemeris::new();
            for path in &kernel {
                ephem.furnsh(path)?;
            }
            for (time, et) in times.iter().zip(ephem.times2et(&times)?) {
                println!("{}\t{:.6}", time, et);
            }
        }
        Command::Hg { g, alphas } => {
            for (alpha, value) in alphas.iter().zip(iau_hg_model_many(&alphas, g)) {
                println!("{}\t{:.12}", alpha, value);
            }
        }
        Command::Sbdb(args) => run_sbdb(&config, args)?,
        Command::Horizons(args) => run_horizons(&config, args)?,
        Command::Info { comments, filename } => run_info(&filename, comments)?,
    }
    Ok(())
}
