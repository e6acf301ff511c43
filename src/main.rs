use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use tricolage::engine_thread::{spawn_engine, EngineCommand, EngineUpdate};
use tricolage::settings::DEFAULT_SETTINGS_FILE;
use tricolage::{dna, Engine, RunSettings, TargetImage};

#[derive(Parser, Debug)]
#[command(name = "tricolage")]
#[command(version, about = "Approximate an image with triangles by hill climbing")]
struct Args {
    /// Target image path
    input: PathBuf,

    /// Settings JSON (missing file = defaults)
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Number of triangles
    #[arg(short = 't', long)]
    triangles: Option<usize>,

    /// Iterations per reported batch
    #[arg(short = 'i', long)]
    iterations_per_batch: Option<u32>,

    /// Number of batches to run
    #[arg(short = 'b', long, default_value_t = 1000)]
    batches: u32,

    /// Seed for the per-iteration mutation draws
    #[arg(long)]
    seed: Option<u32>,

    /// Write the best render here when done
    #[arg(long, default_value = "best.png")]
    output_png: PathBuf,

    /// Write the best genome as text records (one triangle per line)
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the best genome as JSON records
    #[arg(long)]
    dump_json: Option<PathBuf>,

    /// Write the final batch report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Save the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let args = Args::parse();

    let mut settings = RunSettings::load(&args.settings);
    if let Some(t) = args.triangles {
        settings.triangle_count = t;
    }
    if let Some(i) = args.iterations_per_batch {
        settings.iterations_per_batch = i;
    }
    if let Some(seed) = args.seed {
        settings.mutation_seed = seed;
    }
    if args.save_settings {
        settings
            .save(&args.settings)
            .map_err(|e| anyhow!("failed to save {}: {e}", args.settings.display()))?;
    }

    let img = image::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?
        .to_rgba8();
    let target = TargetImage::from_rgba8(img.width(), img.height(), img.as_raw())?;

    let engine = Engine::new(target, settings)?;
    let handle = spawn_engine(engine).context("failed to spawn engine thread")?;
    if !handle.send(EngineCommand::RunBatches(args.batches)) {
        return Err(anyhow!("engine thread exited before starting"));
    }

    let mut last_report = None;
    let mut failure = None;
    if args.batches > 0 {
        loop {
            match handle.updates().recv() {
                Ok(EngineUpdate::Batch { report, .. }) => {
                    tracing::info!(
                        "fit {:.2}% time {:.2}s iter {} impr {} psnr {:.2}dB",
                        report.fitness_percent,
                        report.elapsed_secs,
                        report.iterations,
                        report.improvements,
                        report.metrics.psnr
                    );
                    last_report = Some(report);
                }
                Ok(EngineUpdate::Idle) => break,
                Ok(EngineUpdate::Failed(e)) => {
                    failure = Some(e);
                    break;
                }
                Err(_) => break,
            }
        }
    }

    let engine = handle
        .stop()
        .ok_or_else(|| anyhow!("engine thread panicked"))?;
    if let Some(e) = failure {
        return Err(e).context("run aborted");
    }

    write_outputs(&engine, &args)?;

    if let (Some(path), Some(report)) = (&args.report_json, &last_report) {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

fn write_outputs(engine: &Engine, args: &Args) -> Result<()> {
    let (w, h) = (engine.target().width(), engine.target().height());
    let rgba = engine.render_best_rgba()?;
    image::save_buffer(&args.output_png, &rgba, w, h, image::ColorType::Rgba8)
        .with_context(|| format!("failed to write {}", args.output_png.display()))?;
    tracing::info!("wrote {}", args.output_png.display());

    let records = engine.dump_best();
    if let Some(path) = &args.dump {
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        dna::write_records(&records, BufWriter::new(file))?;
        tracing::info!("wrote {} triangles to {}", records.len(), path.display());
    }
    if let Some(path) = &args.dump_json {
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
        tracing::info!("wrote {} triangles to {}", records.len(), path.display());
    }
    Ok(())
}
