// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use ravel_engine::eng_notation::format_eng;
use ravel_engine::loader::load_tensor_from_path;
use ravel_engine::{
    ByteLimit, DataSpec, DuplicateKeyAction, MemoryBudget, SimulationState, TensorValue,
    Unlimited, VarKind, VariableValue, report_from_csv,
};

/// Labels listed per axis by `show` before eliding the rest.
const MAX_LABELS_SHOWN: usize = 5;

#[derive(Parser)]
#[command(name = "ravel")]
#[command(version, about = "Import delimited tables as hypercubes", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the layout inferred for a file as JSON
    Infer {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Echo a file with each line tagged by the problem a load would hit
    Report {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        spec: SpecArgs,
    },

    /// Load a file and write it back out with RavelHypercube metadata
    Convert {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Comment line written at the top of the output
        #[arg(long, default_value = "")]
        comment: String,

        #[command(flatten)]
        spec: SpecArgs,
    },

    /// Load a file and summarise the resulting tensor
    Show {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Significant figures when printing values
        #[arg(long, default_value = "3")]
        digits: usize,

        #[command(flatten)]
        spec: SpecArgs,
    },
}

#[derive(Args, Debug, Default)]
struct SpecArgs {
    /// Layout as JSON, or a path to a JSON file; inferred when absent
    #[arg(long, value_name = "JSON")]
    spec: Option<String>,

    /// How to combine rows sharing a key: throw, sum, product, min, max or average
    #[arg(long, value_name = "POLICY")]
    duplicates: Option<DuplicateKeyAction>,

    /// Value stored for empty or unparseable cells
    #[arg(long, value_name = "VALUE")]
    missing: Option<f64>,

    /// Refuse to materialise tensors larger than this many bytes
    #[arg(long, value_name = "N")]
    max_bytes: Option<usize>,
}

impl SpecArgs {
    fn data_spec(&self, input: &Path) -> Result<DataSpec> {
        let mut spec = match &self.spec {
            Some(json) => {
                let text = if Path::new(json).is_file() {
                    fs::read_to_string(json).with_context(|| format!("reading {json}"))?
                } else {
                    json.clone()
                };
                serde_json::from_str(&text).context("parsing --spec")?
            }
            None => DataSpec::guess_from_path(input)
                .with_context(|| format!("inferring the layout of {}", input.display()))?,
        };
        spec.set_data_area(spec.n_row_axes(), spec.n_col_axes());
        if let Some(action) = self.duplicates {
            spec.duplicate_key_action = action;
        }
        if let Some(missing) = self.missing {
            spec.missing_value = Some(missing);
        }
        Ok(spec)
    }

    fn budget(&self) -> Box<dyn MemoryBudget> {
        match self.max_bytes {
            Some(limit) => Box::new(ByteLimit(limit)),
            None => Box::new(Unlimited),
        }
    }
}

fn infer(input: &Path) -> Result<()> {
    let spec = DataSpec::guess_from_path(input)
        .with_context(|| format!("inferring the layout of {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

fn report(input: &Path, output: Option<&Path>, args: &SpecArgs) -> Result<()> {
    let spec = args.data_spec(input)?;
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut reader = BufReader::new(file);
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    report_from_csv(&mut reader, &mut writer, &spec)?;
    Ok(())
}

fn convert(input: &Path, output: &Path, comment: &str, args: &SpecArgs) -> Result<()> {
    let spec = args.data_spec(input)?;
    let mut state = SimulationState::new();
    let name = state.new_name("data");
    let id = state.add_variable(VariableValue::new(VarKind::Parameter, &name, ""));
    state
        .load_csv_from_path(&id, input, &spec, args.budget().as_ref())
        .with_context(|| format!("loading {}", input.display()))?;
    state
        .export_to_path(&id, output, comment)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("converted {} to {}", input.display(), output.display());
    Ok(())
}

fn describe(tensor: &TensorValue, digits: usize) -> String {
    let mut out = String::new();
    let hypercube = tensor.hypercube();
    out.push_str(&format!("rank {}\n", hypercube.rank()));
    for xv in hypercube.xvectors.iter() {
        let mut labels = xv
            .labels()
            .iter()
            .take(MAX_LABELS_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if xv.len() > MAX_LABELS_SHOWN {
            labels.push_str(", ...");
        }
        out.push_str(&format!(
            "  {} ({}, {} labels): {}\n",
            xv.name,
            xv.dimension.type_name(),
            xv.len(),
            labels
        ));
    }

    let total = hypercube
        .checked_num_elements()
        .map_or_else(|| "too many".to_owned(), |n| n.to_string());
    let storage = if tensor.is_dense() { "dense" } else { "sparse" };
    out.push_str(&format!("{storage}: {} of {total} cells stored\n", tensor.size()));

    let finite: Vec<f64> = tensor.values().into_iter().filter(|v| v.is_finite()).collect();
    if let Some(min) = finite.iter().copied().reduce(f64::min) {
        let max = finite.iter().copied().fold(min, f64::max);
        let sum: f64 = finite.iter().sum();
        out.push_str(&format!("min {}\n", format_eng(min, digits)));
        out.push_str(&format!("max {}\n", format_eng(max, digits)));
        out.push_str(&format!("sum {}\n", format_eng(sum, digits)));
    }
    out
}

fn show(input: &Path, digits: usize, args: &SpecArgs) -> Result<()> {
    let spec = args.data_spec(input)?;
    let tensor = load_tensor_from_path(input, &spec, args.budget().as_ref())
        .with_context(|| format!("loading {}", input.display()))?;
    print!("{}", describe(&tensor, digits));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Infer { input } => infer(&input),
        Commands::Report {
            input,
            output,
            spec,
        } => report(&input, output.as_deref(), &spec),
        Commands::Convert {
            input,
            output,
            comment,
            spec,
        } => convert(&input, &output, &comment, &spec),
        Commands::Show {
            input,
            digits,
            spec,
        } => show(&input, digits, &spec),
    }
}
