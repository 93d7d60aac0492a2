// Command-line entry point.
//
// Flow: load settings, load the CSV, run the pipeline, and only then write
// the three output tables plus the run summary. Previews and totals go to
// stdout; logging goes to stderr.
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use desloc_report::types::ProcessingResult;
use desloc_report::util::format_int;
use desloc_report::{loader, output, pipeline, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "desloc-report",
    version,
    about = "Team displacement metrics: per-order calculations and per-team/day averages"
)]
struct Cli {
    /// Input CSV with the raw dispatch timestamps. Defaults to the
    /// settings value.
    input: Option<PathBuf>,

    /// Directory for the generated files. Defaults to the settings value.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Optional TOML settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Rows shown in each console preview table.
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

fn print_summary(result: &ProcessingResult, files: &[PathBuf]) {
    let s = &result.summary;
    println!("Files written:");
    for f in files {
        println!("  - {}", f.display());
    }
    println!(
        "\nTotals: {} records, {} teams, {} journeys",
        format_int(s.total_records as i64),
        format_int(s.total_teams as i64),
        format_int(s.total_journeys as i64)
    );
    let d = &s.diagnostics;
    println!(
        "Data quality: {} missing fields, {} unparseable values, {} negative durations, {} empty groups",
        format_int(d.missing_field as i64),
        format_int(d.unparseable_value as i64),
        format_int(d.negative_duration as i64),
        format_int(d.empty_group as i64)
    );
    println!(
        "Goals: TempExe <= {:.0} min (productive) / {:.0} min (unproductive), standard journey {:.0} min",
        s.goals.meta_temp_exe_produtiva_min,
        s.goals.meta_temp_exe_improdutiva_min,
        s.goals.jornada_padrao_min
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let input = cli
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.files.input_file));
    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| settings.files.output_dir.clone());

    let table = loader::load(&input).with_context(|| format!("loading {}", input.display()))?;
    let result = pipeline::run(&table, &settings).context("processing failed")?;

    // All tables exist in memory at this point; nothing was written on any
    // earlier failure path.
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let calc_path = out_dir.join(&settings.files.output_calculated);
    let prod_path = out_dir.join(&settings.files.output_productive);
    let improd_path = out_dir.join(&settings.files.output_unproductive);
    let summary_path = out_dir.join(&settings.files.output_summary);

    output::write_csv(&calc_path, &result.enriched)?;
    output::write_csv(&prod_path, &result.productive)?;
    output::write_csv(&improd_path, &result.unproductive)?;
    output::write_json(&summary_path, &result.summary)?;

    output::preview_table(
        "Médias por equipe/dia (produtivas)",
        &result.productive,
        cli.preview_rows,
    );
    output::preview_table(
        "Médias por equipe/dia (Improdutivas)",
        &result.unproductive,
        cli.preview_rows,
    );
    print_summary(
        &result,
        &[calc_path, prod_path, improd_path, summary_path],
    );

    Ok(())
}
