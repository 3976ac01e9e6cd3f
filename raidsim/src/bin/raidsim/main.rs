use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::exit,
    sync::Arc,
};

use clap::{crate_version, ArgAction, Args, Parser};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use raidsim_core::{
    config::Config,
    disk::{self, Rounding},
    raid::{self, RaidLevel},
    run_log::{RunLog, Stats},
    simulation::{SimulationResult, Simulator},
    workload::{IoProfile, WorkloadModel},
    BYTES_PER_GB,
    Workload,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod scan;

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Engine(#[from] raidsim_core::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("Invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Can't read {}: {}", .0.path().display(), .0.error())]
    Glob(#[from] glob::GlobError),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

type Result<T> = std::result::Result<T, Error>;

/// Build a table row from a list of displayable cells
macro_rules! row {
    ($($cell:expr),* $(,)?) => {{
        let mut row = tabular::Row::new();
        $(row.add_cell($cell);)*
        row
    }};
}

si_scale::scale_fn!(bibytes1,
                    base: B1024,
                    constraint: UnitAndAbove,
                    mantissa_fmt: "{:.1}",
                    groupings: '_',
                    unit: "B");

/// Disk and timing model settings shared by every subcommand
#[derive(Args, Clone, Debug)]
struct Settings {
    /// YAML configuration file.  Individual flags override its contents.
    #[clap(short, long)]
    config:        Option<PathBuf>,
    /// Average seek time in milliseconds
    #[clap(long)]
    seek_ms:       Option<f64>,
    /// Spindle speed in revolutions per minute
    #[clap(long)]
    rpm:           Option<u32>,
    /// Typical I/O size in kilobytes
    #[clap(long)]
    block_kb:      Option<f64>,
    /// Media transfer rate in megabytes per second
    #[clap(long)]
    transfer_mbps: Option<f64>,
    /// Capacity of each disk in gigabytes
    #[clap(long)]
    disk_gb:       Option<f64>,
    /// Fraction of each disk's time spent servicing I/O
    #[clap(long)]
    utilization:   Option<f64>,
}

impl Settings {
    fn load(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml(&fs::read_to_string(path)?)?,
            None => Config::default()
        };
        if let Some(x) = self.seek_ms {
            config.disk.seek_time_ms = x;
        }
        if let Some(x) = self.rpm {
            config.disk.rpm = x;
        }
        if let Some(x) = self.block_kb {
            config.disk.block_size_kb = x;
        }
        if let Some(x) = self.transfer_mbps {
            config.disk.transfer_rate_mbps = x;
        }
        if let Some(x) = self.disk_gb {
            config.disk.capacity_gb = x;
        }
        if let Some(x) = self.utilization {
            config.simulation.utilization = x;
        }
        config.validate()?;
        tracing::debug!(?config, "effective configuration");
        Ok(config)
    }
}

/// An optional front-end I/O profile
#[derive(Args, Clone, Debug)]
struct ProfileArgs {
    /// Front-end IOPS generated by the application.  Enables
    /// performance-driven sizing.
    #[clap(long)]
    iops:          Option<f64>,
    /// Percentage of I/Os that are reads
    #[clap(long, default_value_t = 50.0)]
    read_percent:  f64,
    /// Percentage of I/Os that are writes
    #[clap(long, default_value_t = 50.0)]
    write_percent: f64,
}

impl ProfileArgs {
    fn profile(&self) -> Option<IoProfile> {
        self.iops.map(|total_iops| IoProfile {
            total_iops,
            read_percent: self.read_percent,
            write_percent: self.write_percent
        })
    }
}

fn disk_count_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(2..=12)
}

fn model_from(dir: &Path, profile: &ProfileArgs) -> Result<WorkloadModel> {
    let model = WorkloadModel::new(scan::scan(dir)?);
    Ok(match profile.profile() {
        Some(p) => model.with_profile(p),
        None => model
    })
}

fn rng(seed: Option<u64>) -> XorShiftRng {
    match seed {
        Some(s) => XorShiftRng::seed_from_u64(s),
        None => XorShiftRng::from_entropy()
    }
}

fn ms(x: Option<f64>) -> String {
    x.map(|v| format!("{v:.2}")).unwrap_or_else(|| String::from("-"))
}

#[derive(Parser, Clone, Debug)]
/// List the media files beneath a directory
struct Scan {
    #[clap(short = 'p', long, help = "Scriptable output")]
    parseable: bool,
    dir:       PathBuf,
}

impl Scan {
    fn main(self) -> Result<()> {
        let files = scan::scan(&self.dir)?;
        let model = WorkloadModel::new(files);
        if self.parseable {
            let stdout = io::stdout();
            let mut buf = BufWriter::new(stdout.lock());
            for f in model.files() {
                writeln!(buf, "{:?}\t{}\t{}", f.kind, f.size_bytes,
                         f.path.display())?;
            }
            buf.flush()?;
        } else {
            let mut table = tabular::Table::new("{:<}  {:>}  {:<}");
            table.add_row(row!("KIND", "SIZE", "PATH"));
            for f in model.files() {
                table.add_row(row!(format!("{:?}", f.kind),
                    bibytes1(f.size_bytes as f64), f.path.display()));
            }
            print!("{table}");
            println!("{} files, {} ({:.2} GB)", model.file_count(),
                bibytes1(model.total_bytes() as f64),
                model.capacity_requirement().total_capacity_gb);
        }
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Capacity and performance figures for one array
struct Calc {
    /// Number of disks in the array
    #[clap(short = 'n', long, value_parser = disk_count_parser())]
    disks: u32,
    /// RAID level, such as "raid5"
    #[clap(short = 'l', long)]
    level: RaidLevel,
}

impl Calc {
    fn main(self, config: &Config) -> Result<()> {
        let (n, level) = (self.disks, self.level);
        let breakdown = raid::capacity_breakdown(n, level)?;
        let usable_pct = raid::usable_capacity_percent(n, level)?;
        let service_time = config.disk.service_time_ms()?;
        let per_disk = disk::iops(service_time, config.simulation.utilization)?;
        let array = raid::array_iops(n, level, per_disk)?;

        let mut table = tabular::Table::new("{:<}  {:<}");
        table.add_row(row!("RAID level", level));
        table.add_row(row!("Disks", n));
        table.add_row(row!("Usable disks", breakdown.usable));
        table.add_row(row!("Parity disks", breakdown.parity));
        table.add_row(row!("Mirror disks", breakdown.mirror));
        table.add_row(row!("Usable capacity",
            format!("{usable_pct:.2} %")));
        table.add_row(row!("Redundancy",
            format!("{:.2} %", raid::redundancy_percent(n, level)?)));
        table.add_row(row!("Efficiency",
            format!("{:.2}", raid::space_efficiency(n, level)?)));
        table.add_row(row!("Usable space", format!("{:.0} GB",
            f64::from(breakdown.usable) * config.disk.capacity_gb)));
        table.add_row(row!("Fault tolerance",
            raid::fault_tolerance(level)));
        table.add_row(row!("Write penalty", raid::write_penalty(level)));
        table.add_row(row!("Speedup",
            format!("{:.2}", raid::parallel_speedup(n, level)?)));
        table.add_row(row!("Service time",
            format!("{service_time:.2} ms")));
        table.add_row(row!("Read IOPS", format!("{:.1}", array.read)));
        table.add_row(row!("Write IOPS",
            format!("{:.1}", array.write)));
        print!("{table}");
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Number of disks needed for a capacity and I/O requirement
struct Size {
    /// Data to be stored, in gigabytes
    #[clap(long)]
    capacity_gb: f64,
    /// RAID level, such as "raid5"
    #[clap(short = 'l', long, default_value = "raid5")]
    level:       RaidLevel,
    /// Round the capacity disk count to the nearest disk instead of up
    #[clap(long)]
    nearest:     bool,
    #[clap(flatten)]
    profile:     ProfileArgs,
}

impl Size {
    fn main(self, config: &Config) -> Result<()> {
        let rounding = if self.nearest {
            Rounding::Nearest
        } else {
            Rounding::Ceiling
        };
        let dc = disk::disks_for_capacity_rounded(self.capacity_gb,
            config.disk.capacity_gb, rounding)?;
        let dp = match self.profile.profile() {
            Some(p) => {
                let per_disk = disk::iops(config.disk.service_time_ms()?,
                                          config.simulation.utilization)?;
                let w = Workload::new(p.total_iops, p.read_percent,
                                      p.write_percent, per_disk);
                raid::required_disks_for_iops(&w, self.level)?
            },
            None => 0
        };
        let count = disk::total_disks_required(dc, dp);
        let mut table = tabular::Table::new("{:<}  {:>}");
        table.add_row(row!("Capacity disks", count.capacity));
        table.add_row(row!("Performance disks", count.performance));
        table.add_row(row!("Total disks", count.total));
        table.add_row(row!("Bound by", count.bound));
        print!("{table}");
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Simulate storing a directory of media files on RAID arrays
struct Simulate {
    /// Number of disks in the array
    #[clap(short = 'n', long, value_parser = disk_count_parser())]
    disks:   u32,
    /// RAID levels to simulate, comma delimited
    #[clap(
        short = 'l',
        long = "level",
        action = ArgAction::Append,
        required(true),
        value_delimiter(','),
    )]
    levels:  Vec<RaidLevel>,
    /// Seed for reproducible timing samples
    #[clap(long)]
    seed:    Option<u64>,
    /// Number of times to simulate each level
    #[clap(long, default_value_t = 1,
           value_parser = clap::value_parser!(u32).range(1..))]
    runs:    u32,
    /// Write one CSV row per run to this file
    #[clap(long)]
    report:  Option<PathBuf>,
    /// Write summary statistics as CSV to this file
    #[clap(long)]
    summary: Option<PathBuf>,
    #[clap(flatten)]
    profile: ProfileArgs,
    dir:     PathBuf,
}

impl Simulate {
    fn main(self, config: &Config) -> Result<()> {
        let sim = Simulator::from_config(config)?;
        let model = model_from(&self.dir, &self.profile)?;
        let mut rng = rng(self.seed);
        let log = RunLog::new();
        for _ in 0..self.runs {
            for &level in self.levels.iter() {
                log.append(sim.run(level, self.disks, &model, &mut rng)?);
            }
        }

        print_runs(&log.snapshot());
        println!();
        let summary = log.summary();
        let mut table = tabular::Table::new(
            "{:<}  {:>}  {:>}  {:>}  {:>}  {:>}  {:>}");
        table.add_row(row!("METRIC", "COUNT", "MEAN", "STD", "MEDIAN", "MIN",
                           "MAX"));
        for (name, stats) in [("read ms", summary.read_time_ms),
                              ("write ms", summary.write_time_ms)]
        {
            table.add_row(stats_row(name, stats));
        }
        print!("{table}");

        if let Some(path) = &self.report {
            let mut f = BufWriter::new(fs::File::create(path)?);
            log.write_csv(&mut f)?;
            f.flush()?;
        }
        if let Some(path) = &self.summary {
            let mut f = BufWriter::new(fs::File::create(path)?);
            summary.write_csv(&mut f)?;
            f.flush()?;
        }
        Ok(())
    }
}

fn print_runs(results: &[Arc<SimulationResult>]) {
    let mut table = tabular::Table::new(
        "{:<}  {:>}  {:>}  {:>}  {:>}  {:<}  {:>}  {:>}  {:>}");
    table.add_row(row!("LEVEL", "DISKS", "FILES", "USABLE", "NEED",
        "BOUND", "READ MS", "WRITE MS", "TOTAL MS"));
    for r in results.iter() {
        table.add_row(row!(
            r.raid_level,
            r.disk_count,
            r.file_count,
            format!("{:.2} %", r.usable_capacity_percent),
            r.required_disks.total,
            r.required_disks.bound,
            ms(r.mean_read_ms()),
            ms(r.mean_write_ms()),
            format!("{:.2}", r.total_time_ms())
        ));
    }
    print!("{table}");
}

fn stats_row(name: &str, stats: Option<Stats>) -> tabular::Row {
    match stats {
        Some(s) => row!(name, s.count, format!("{:.3}", s.mean),
            format!("{:.3}", s.std_dev), format!("{:.3}", s.median),
            format!("{:.3}", s.min), format!("{:.3}", s.max)),
        None => row!(name, 0, "-", "-", "-", "-", "-")
    }
}

#[derive(Parser, Clone, Debug)]
/// Compare every RAID level for a directory of media files
struct Compare {
    /// Number of disks in the array
    #[clap(short = 'n', long, value_parser = disk_count_parser())]
    disks: u32,
    /// Seed for reproducible timing samples
    #[clap(long)]
    seed:  Option<u64>,
    dir:   PathBuf,
}

impl Compare {
    fn main(self, config: &Config) -> Result<()> {
        let n = self.disks;
        let sim = Simulator::from_config(config)?;
        let model = WorkloadModel::new(scan::scan(&self.dir)?);
        let largest = model.files().iter().map(|f| f.size_bytes).max();
        let mut rng = rng(self.seed);
        let results = sim.compare(&RaidLevel::ALL, n, &model, &mut rng)?;

        let mut table = tabular::Table::new(
            "{:<}  {:>}  {:>}  {:>}  {:>}  {:>}  {:>}  {:>}");
        table.add_row(row!("LEVEL", "USABLE", "REDUNDANCY", "FAULTS",
            "SPEEDUP", "RAW NEEDED", "LARGEST S", "WRITE MS"));
        for (level, metrics) in raid::compare_levels(n) {
            let m = match metrics {
                Ok(m) => m,
                Err(e) => {
                    table.add_row(row!(level, "-", "-", "-", "-",
                        "-", "-", e));
                    continue;
                }
            };
            let overhead =
                raid::storage_overhead(model.total_bytes(), n, level)?;
            let access = largest.map(|b| raid::estimate_access_time_s(b, n,
                    level, config.disk.transfer_rate_mbps))
                .transpose()?;
            let write_ms = results.iter()
                .find(|r| r.raid_level == level)
                .and_then(SimulationResult::mean_write_ms);
            table.add_row(row!(
                level,
                format!("{:.2} %", m.usable_percent),
                format!("{:.2} %", m.redundancy_percent),
                m.fault_tolerance,
                format!("{:.2}", m.speedup),
                bibytes1(overhead.total_required_bytes),
                access.map(|s| format!("{s:.3}"))
                    .unwrap_or_else(|| String::from("-")),
                ms(write_ms)
            ));
        }
        print!("{table}");
        println!("{} files, {:.2} GB", model.file_count(),
            model.total_bytes() as f64 / BYTES_PER_GB as f64);
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Print the effective configuration as YAML
struct ShowConfig {}

impl ShowConfig {
    fn main(self, config: &Config) -> Result<()> {
        print!("{}", config.to_yaml()?);
        Ok(())
    }
}

mod parity {
    use raidsim_core::raid::{recover_missing_block, xor_parity};

    use super::*;

    #[derive(Parser, Clone, Debug)]
    /// Compute the XOR parity of a stripe of data words
    pub(super) struct Encode {
        #[clap(num_args(1..), required(true))]
        pub(super) words: Vec<u64>,
    }

    impl Encode {
        pub(super) fn main(self) -> Result<()> {
            println!("{}", xor_parity(&self.words)?);
            Ok(())
        }
    }

    #[derive(Parser, Clone, Debug)]
    /// Rebuild the single data word missing from a stripe
    pub(super) struct Recover {
        /// Parity of the complete stripe
        #[clap(short, long)]
        pub(super) parity: u64,
        /// The surviving data words
        #[clap(num_args(1..), required(true))]
        pub(super) words:  Vec<u64>,
    }

    impl Recover {
        pub(super) fn main(self) -> Result<()> {
            println!("{}", recover_missing_block(&self.words, self.parity));
            Ok(())
        }
    }

    #[derive(Parser, Clone, Debug)]
    /// Single-parity encoding and recovery
    pub(super) enum ParityCmd {
        Encode(Encode),
        Recover(Recover),
    }
}

#[derive(Parser, Clone, Debug)]
enum SubCommand {
    Calc(Calc),
    Compare(Compare),
    Config(ShowConfig),
    #[clap(subcommand)]
    Parity(parity::ParityCmd),
    Scan(Scan),
    Simulate(Simulate),
    Size(Size),
}

#[derive(Parser, Clone, Debug)]
#[clap(version = crate_version!())]
struct Cli {
    #[clap(flatten)]
    settings: Settings,
    #[clap(subcommand)]
    cmd:      SubCommand,
}

impl Cli {
    fn main(self) -> Result<()> {
        let config = self.settings.load()?;
        match self.cmd {
            SubCommand::Calc(calc) => calc.main(&config),
            SubCommand::Compare(compare) => compare.main(&config),
            SubCommand::Config(show) => show.main(&config),
            SubCommand::Parity(parity::ParityCmd::Encode(encode)) => {
                encode.main()
            }
            SubCommand::Parity(parity::ParityCmd::Recover(recover)) => {
                recover.main()
            }
            SubCommand::Scan(scan) => scan.main(),
            SubCommand::Simulate(simulate) => simulate.main(&config),
            SubCommand::Size(size) => size.main(&config),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli: Cli = Cli::parse();
    if let Err(e) = cli.main() {
        eprintln!("Error: {e}");
        exit(1);
    }
}
