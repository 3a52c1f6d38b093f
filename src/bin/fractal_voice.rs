use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fractal_voice::{
    audio::{load_wav, ChannelReduction},
    comparison::compare_clips,
    report::{write_csv_file, ClipReport},
    AnalysisConfig, CombinationRule, MultiScaleAnalyzer,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fractal-voice",
    about = "Multi-scale HFD/DFA analysis of voice recordings"
)]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the left channel instead of averaging channels
    #[arg(long, global = true)]
    left_channel: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse and classify one WAV file
    Analyze {
        input: PathBuf,
        /// Window scales in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        scales: Option<Vec<f64>>,
        #[arg(long)]
        k_max: Option<usize>,
        /// Hop between windows in seconds (0.1 s by default)
        #[arg(long)]
        hop: Option<f64>,
        /// Threshold combination rule: and | or
        #[arg(long)]
        rule: Option<CombinationRule>,
        #[arg(long, allow_negative_numbers = true)]
        offset_hfd: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        offset_dfa: Option<f64>,
        /// Leading seconds of audio to analyse
        #[arg(long)]
        max_seconds: Option<f64>,
        /// Write the aligned timeline as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Analyse two WAV files and compare their measures
    Compare { first: PathBuf, second: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::sliding(),
    };
    let reduction = if cli.left_channel {
        ChannelReduction::Left
    } else {
        ChannelReduction::Average
    };

    match cli.command {
        Commands::Analyze {
            input,
            scales,
            k_max,
            hop,
            rule,
            offset_hfd,
            offset_dfa,
            max_seconds,
            csv,
            json,
        } => {
            if let Some(scales) = scales {
                config.window_scales_seconds = scales;
            }
            if let Some(k_max) = k_max {
                config.k_max = k_max;
            }
            if hop.is_some() {
                config.hop_seconds = hop;
            }
            if let Some(rule) = rule {
                config.combination_rule = rule;
            }
            if let Some(offset) = offset_hfd {
                config.threshold_offset_hfd = offset;
            }
            if let Some(offset) = offset_dfa {
                config.threshold_offset_dfa = offset;
            }
            if let Some(seconds) = max_seconds {
                config.max_clip_seconds = seconds;
            }
            run_analyze(&input, &config, reduction, csv, json)
        }
        Commands::Compare { first, second } => run_compare(&first, &second, &config, reduction),
    }
}

fn analyze_file(path: &Path, config: &AnalysisConfig, reduction: ChannelReduction) -> Result<ClipReport> {
    let audio = load_wav(path, reduction)?;
    let analyzer = MultiScaleAnalyzer::new(config.clone())?;
    let analysis = analyzer
        .analyze(&audio.samples, audio.sample_rate)
        .with_context(|| format!("analysing {}", path.display()))?;
    Ok(ClipReport::from_analysis(analysis, config)?)
}

fn run_analyze(
    input: &Path,
    config: &AnalysisConfig,
    reduction: ChannelReduction,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<ExitCode> {
    let report = analyze_file(input, config, reduction)?;

    if let Some(path) = csv {
        write_csv_file(&path, &report.analysis, report.segments.as_ref())?;
    }
    if let Some(path) = json {
        report.write_json_file(&path)?;
    }

    let c = &report.classification;
    println!(
        "Clip: {} (HFD {:.4} vs threshold {:.4}, DFA {:.4} vs threshold {:.4})",
        c.label, c.mean_hfd, c.thresholds.hfd, c.mean_dfa, c.thresholds.dfa
    );
    for failure in &report.analysis.failed_scales {
        println!("Skipped scale {}", failure);
    }

    for (i, span) in report.retroactive.iter().enumerate() {
        println!(
            "Segment {} ({:.1}s - {:.1}s): average classification {}",
            i + 1,
            span.start_seconds,
            span.end_seconds,
            format_optional(span.ai_fraction, 2)
        );
        for scale in &span.scales {
            println!(
                "  HFD {}s: {}  DFA {}s: {}",
                scale.scale_seconds,
                format_optional(scale.mean_hfd, 4),
                scale.scale_seconds,
                format_optional(scale.mean_dfa, 4)
            );
        }
    }

    if let Some(segments) = &report.segments {
        println!(
            "Overall classification: {} (confidence {:.2}%)",
            segments.overall,
            segments.confidence * 100.0
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn run_compare(
    first: &Path,
    second: &Path,
    config: &AnalysisConfig,
    reduction: ChannelReduction,
) -> Result<ExitCode> {
    let a = analyze_file(first, config, reduction)?;
    let b = analyze_file(second, config, reduction)?;

    let (labels_a, labels_b) = match (&a.segments, &b.segments) {
        (Some(sa), Some(sb)) => (sa.labels.clone(), sb.labels.clone()),
        _ => anyhow::bail!("both clips need at least {} aligned windows to compare", config.segment.segment_length),
    };
    let summary = compare_clips(&a.analysis, &labels_a, &b.analysis, &labels_b)?;

    println!(
        "{:<8}{:<8}{:<12}{:>10}{:>10}{:>10}{:>10}{:>10}",
        "Measure", "Window", "File", "mean", "median", "std", "min", "max"
    );
    for row in &summary.rows {
        for (path, stats) in [(first, &row.first), (second, &row.second)] {
            let name = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            println!(
                "{:<8}{:<8}{:<12}{:>10.4}{:>10.4}{:>10.4}{:>10.4}{:>10.4}",
                row.measure.to_string(),
                format!("{}s", row.scale_seconds),
                name,
                stats.mean,
                stats.median,
                stats.std_dev,
                stats.min,
                stats.max
            );
        }
    }
    println!(
        "Classification agreement over {} positions: {:.2}%",
        summary.compared_len, summary.label_agreement_percent
    );

    Ok(ExitCode::SUCCESS)
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}
