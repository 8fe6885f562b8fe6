//! LabFlow command line - preview and import data files
//!
//! ```text
//! labflow preview run1.bin --binary --lines 10
//! labflow import table.csv --expression "x1 * 2.0" --export doubled.tsv
//! labflow profile int32.lfprofile --binary --set dataType=2 --set vectors=3
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use labflow_rs::{
    config::{AppConfig, ImportProfile},
    import::{AttributeSet, FileFilter, FileSource, FilterKind, ImportOutcome},
    pipeline::{nodes::ExpressionFilter, FilterNode, OutputSource},
    scripting::RhaiEvaluator,
    ColumnRef, ImportMode, Spreadsheet,
};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "labflow")]
#[command(about = "Preview and import binary or ASCII data into columns")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first rows a decode would produce
    Preview {
        file: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Import a file into a spreadsheet and print a summary of its columns
    Import {
        file: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// How imported columns are merged
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Add a computed column over the imported ones (x1, x2, ...)
        #[arg(long, value_name = "EXPR")]
        expression: Option<String>,

        /// Write the resulting columns as delimited text
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Write an import profile with default settings plus overrides
    Profile {
        output: PathBuf,

        #[arg(long, conflicts_with = "ascii")]
        binary: bool,

        #[arg(long)]
        ascii: bool,

        /// Attribute override, e.g. `dataType=2`. Repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Import profile (.lfprofile) with decoder settings
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Decode as binary records
    #[arg(long, conflicts_with_all = ["ascii", "profile"])]
    binary: bool,

    /// Decode as delimited text
    #[arg(long, conflicts_with = "profile")]
    ascii: bool,

    /// Maximum number of rows to read
    #[arg(long, short = 'n')]
    lines: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Replace,
    Append,
    Prepend,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Replace => ImportMode::Replace,
            ModeArg::Append => ImportMode::Append,
            ModeArg::Prepend => ImportMode::Prepend,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_or_default(),
    };
    let _guard = init_logging(&config, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Preview { file, filter } => {
            let mut decoder = build_filter(&file, &filter)?;
            let lines = filter.lines.unwrap_or(config.preview_lines);
            for row in decoder.preview(&FileSource::new(&file), lines) {
                println!("{}", row.join("\t"));
            }
        }
        Commands::Import {
            file,
            filter,
            mode,
            expression,
            export,
        } => {
            let mode = mode.map(ImportMode::from).unwrap_or(config.default_import_mode);
            run_import(&file, &filter, mode, expression.as_deref(), export.as_deref())?;
        }
        Commands::Profile {
            output,
            binary,
            ascii,
            overrides,
        } => {
            let kind = if binary {
                FilterKind::Binary
            } else if ascii {
                FilterKind::Ascii
            } else {
                FilterKind::guess(&output)
            };
            write_profile(&output, kind, &overrides)?;
        }
    }

    Ok(())
}

fn init_logging(config: &AppConfig, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let (file_layer, guard) = match log_file.or(config.log_file.as_deref()) {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file {:?} has no file name", path))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

fn build_filter(file: &Path, args: &FilterArgs) -> anyhow::Result<Box<dyn FileFilter>> {
    if let Some(path) = &args.profile {
        let profile = ImportProfile::load(path)?;
        let (filter, warnings) = profile.build_filter();
        if !warnings.is_empty() {
            eprintln!("{} setting(s) defaulted while loading {:?}", warnings.len(), path);
        }
        return Ok(filter);
    }

    let kind = if args.binary {
        FilterKind::Binary
    } else if args.ascii {
        FilterKind::Ascii
    } else {
        FilterKind::guess(file)
    };
    tracing::debug!("Decoding {:?} as {}", file, kind);
    Ok(kind.create())
}

fn run_import(
    file: &Path,
    args: &FilterArgs,
    mode: ImportMode,
    expression: Option<&str>,
    export: Option<&Path>,
) -> anyhow::Result<()> {
    let mut decoder = build_filter(file, args)?;
    let mut sheet = Spreadsheet::new(
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import".to_string()),
    );

    let mut last = None;
    let outcome = decoder.read_into(
        &FileSource::new(file),
        &mut sheet,
        mode,
        args.lines,
        &mut |percent| {
            if last != Some(percent) && percent % 10 == 0 {
                tracing::debug!("Import {}%", percent);
            }
            last = Some(percent);
        },
    );
    match &outcome {
        ImportOutcome::Imported { .. } => println!("{}", outcome),
        ImportOutcome::Empty => {
            println!("{}", outcome);
            return Ok(());
        }
        ImportOutcome::SourceUnavailable(_) => bail!("{}", outcome),
    }

    let mut columns: Vec<ColumnRef> = sheet.columns().to_vec();
    let _computed = expression
        .map(|expr| -> anyhow::Result<_> {
            let node = FilterNode::new(ExpressionFilter::new(RhaiEvaluator::new(expr)?));
            if !node.bind_outputs_of(&sheet) {
                eprintln!("Non-numeric columns were left out of the expression");
            }
            if let Some(output) = node.output(0) {
                output.set_name(expr);
                columns.push(output);
            }
            Ok(node)
        })
        .transpose()?;

    for (i, column) in columns.iter().enumerate() {
        println!(
            "{:>3}  {:<20} {:<8} {:>8} rows  {:?}",
            i + 1,
            column.name(),
            column.mode().to_string(),
            column.row_count(),
            column.plot_designation()
        );
    }

    if let Some(target) = export {
        labflow_rs::import::AsciiFilter::new()
            .write(&columns, target)
            .with_context(|| format!("Failed to export to {:?}", target))?;
        println!("Exported to {}", target.display());
    }
    Ok(())
}

fn write_profile(output: &Path, kind: FilterKind, overrides: &[String]) -> anyhow::Result<()> {
    let mut attributes = AttributeSet::new();
    kind.create().save(&mut attributes);
    for entry in overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Override '{}' is not of the form KEY=VALUE", entry);
        };
        if attributes.get(key.trim()).is_none() {
            bail!("Unknown {} attribute '{}'", kind, key.trim());
        }
        attributes.set(key.trim(), value.trim());
    }

    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let profile = ImportProfile {
        version: 1,
        name,
        kind,
        attributes,
    };
    let (filter, warnings) = profile.build_filter();
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }
    ImportProfile::from_filter(profile.name.as_str(), filter.as_ref()).save(output)?;
    println!("Wrote {} profile to {}", kind, output.display());
    Ok(())
}
