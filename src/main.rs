// Entry point - parses the CLI, assembles an AudioSource + Pipeline, and
// drives the read/process/report loop to stdout, optionally visualizing and
// writing a learned state file on exit.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use audioid::audio::{AudioSource, LiveCaptureSource, WavFileSource};
use audioid::cli::Cli;
use audioid::clock::{SampleClock, WallClock};
use audioid::config::{AppConfig, VisualizeMode};
use audioid::interval::{self, Interval, IntervalTracker};
use audioid::label::LabelTable;
use audioid::pipeline::Pipeline;
use audioid::state_file;
use audioid::viz::Visualizer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    run(config)
}

fn load_labels(config: &AppConfig) -> Result<(LabelTable, IntervalTracker)> {
    let mut labels = LabelTable::new(config.bucket_count);
    let mut intervals = Vec::<Interval>::new();

    if let Some(path) = &config.labels_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading label file {}", path.display()))?;
        let (parsed, skipped) = interval::parse_label_file(path, &contents, &mut labels)?;
        if skipped > 0 {
            info!(path = %path.display(), skipped, "skipped malformed label-file lines");
        }
        intervals = parsed;
    }

    if let Some(path) = &config.events_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading event-config file {}", path.display()))?;
        state_file::load(path, &contents, &mut labels)?;
    }

    if let Some(path) = &config.state_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file {}", path.display()))?;
        state_file::load(path, &contents, &mut labels)?;
    }

    Ok((labels, IntervalTracker::new(intervals)))
}

fn run(config: AppConfig) -> Result<()> {
    let (mut labels, intervals) = load_labels(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut viz = (config.visualize != VisualizeMode::Off).then(Visualizer::new);

    match &config.input_path {
        Some(path) => {
            let source = WavFileSource::open(path, config.sample_rate)
                .with_context(|| format!("opening {}", path.display()))?;
            run_loop(source, config.clone(), intervals, &mut labels, &mut out, viz.as_mut(), SampleClock::new(config.sample_rate))?;
        }
        None => {
            let source = LiveCaptureSource::new().context("opening default input device")?;
            run_loop(source, config.clone(), intervals, &mut labels, &mut out, viz.as_mut(), WallClock::new())?;
        }
    }

    if let Some(path) = &config.write_state_path {
        let serialized = state_file::save(&labels);
        std::fs::write(path, serialized).with_context(|| format!("writing state file {}", path.display()))?;
        info!(path = %path.display(), "wrote state file");
    }

    Ok(())
}

fn run_loop<S: AudioSource, C: audioid::clock::Clock>(
    mut source: S,
    config: AppConfig,
    intervals: IntervalTracker,
    labels: &mut LabelTable,
    out: &mut impl Write,
    mut viz: Option<&mut Visualizer>,
    clock: C,
) -> Result<()> {
    let mut pipeline = Pipeline::new(
        config.window_size,
        config.bucket_count,
        config.cycle_count,
        config.overlap,
        intervals,
        clock,
        config.learn,
    );

    let is_file = config.input_path.is_some();
    let mut buf = vec![0i16; config.window_size];
    let mut window_index: usize = 0;
    let reduced = config.visualize == VisualizeMode::Reduced;
    let cycle_count = config.cycle_count.max(1);

    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            if is_file {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
            continue;
        }

        let events = match viz.as_deref_mut() {
            Some(viz) => pipeline.process_with(&buf[..n], labels, |info| {
                let should_draw = !reduced || window_index % cycle_count == 0;
                if should_draw {
                    viz.set_annotation(info.matched_label.is_some(), info.matched_label, info.distance);
                    let _ = viz.push_row(&mut *out, info.buckets);
                }
                window_index += 1;
            }),
            None => pipeline.process(&buf[..n], labels),
        };

        for event in &events {
            writeln!(out, "{}", event.format(labels))?;
        }
    }

    Ok(())
}
