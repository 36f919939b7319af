use anyhow::Context;
use clap::{Parser, Subcommand};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use labelscan::detection::steps::{LabelDetectionStep, RefineCropStep};
use labelscan::tuning::{load_tuning, TuningParameters};
use labelscan::{
    classify, CropRegion, LabelDetector, Pipeline, Rotation, ScanError, ScanSession, TextLine,
    TextRecognizer, TuningStore,
};

#[derive(Parser)]
#[command(name = "labelscan")]
#[command(about = "Find shipment labels in photos and read roll and customer fields")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load tuning parameters from a TOML file
    #[arg(long, value_name = "FILE", global = true)]
    tuning: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, rectify and classify a captured frame
    Scan {
        /// Path to the captured frame
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// JSON array of {text, height} recognized lines
        #[arg(long, value_name = "FILE")]
        lines: Option<PathBuf>,

        /// Size of the view the crop box was laid out in (defaults to the image size)
        #[arg(long, value_name = "WxH", value_parser = parse_view)]
        view: Option<(u32, u32)>,

        /// Device rotation in degrees
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        rotation: i32,

        /// Write the image handed to the recognizer here
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },

    /// Rectify an already cropped label image
    Detect {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Trim towards the label aspect ratio before detection
        #[arg(long)]
        refine: bool,
    },

    /// Write the edge map the detector works on
    Edges {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Classify recognized lines from a JSON file
    Classify {
        #[arg(value_name = "FILE")]
        lines: PathBuf,
    },

    /// Print the effective tuning parameters as TOML
    Tuning,
}

fn parse_view(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("view dimensions must be positive".to_string());
    }
    Ok((w, h))
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    Ok(img)
}

fn load_lines(path: &Path) -> anyhow::Result<Vec<TextLine>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading lines from {}", path.display()))?;
    let lines: Vec<TextLine> = serde_json::from_str(&content)
        .with_context(|| format!("parsing lines from {}", path.display()))?;
    Ok(lines)
}

/// Stands in for the recognizer with lines read from a file
struct FixedLines(Vec<TextLine>);

impl TextRecognizer for FixedLines {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextLine>, ScanError> {
        Ok(self.0.clone())
    }
}

fn print_fields(fields: &labelscan::ClassifiedFields) {
    println!("Roll#: {}", fields.roll);
    println!("Cust:  {}", fields.customer);
}

async fn run_scan<R: TextRecognizer + 'static>(
    recognizer: R,
    store: TuningStore,
    frame: DynamicImage,
    region: CropRegion,
    out: Option<PathBuf>,
    debug_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut session = ScanSession::new(recognizer, store);
    if let Some(dir) = debug_out {
        session = session.with_debug(dir);
    }
    let outcome = session.scan(frame, region).await?;

    if outcome.quad.is_none() {
        println!("No label outline found; used the cropped frame as-is");
    }
    if let Some(path) = out {
        outcome.image.save(&path)?;
        println!("Saved {}", path.display());
    }
    print_fields(&outcome.fields);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let params = match &args.tuning {
        Some(path) => load_tuning(path)?,
        None => TuningParameters::default(),
    };
    let store = TuningStore::new(params);

    match args.command {
        Command::Scan {
            image_path,
            lines,
            view,
            rotation,
            out,
            debug_out,
        } => {
            let frame = load_image(&image_path)?;
            let (view_w, view_h) = view.unwrap_or((frame.width(), frame.height()));
            let region = CropRegion::for_view(view_w, view_h, Rotation::from_degrees(rotation));

            match lines {
                Some(path) => {
                    let recognizer = FixedLines(load_lines(&path)?);
                    run_scan(recognizer, store, frame, region, out, debug_out).await?;
                }
                #[cfg(feature = "ocr")]
                None => {
                    let dir = labelscan::ocr::default_model_dir()?;
                    let recognizer = labelscan::ocr::OcrsRecognizer::load(&dir)?;
                    run_scan(recognizer, store, frame, region, out, debug_out).await?;
                }
                #[cfg(not(feature = "ocr"))]
                None => anyhow::bail!("--lines is required when built without the `ocr` feature"),
            }
        }
        Command::Detect {
            image_path,
            out,
            refine,
        } => {
            let img = load_image(&image_path)?;
            let mut pipeline = Pipeline::new().add_step(Arc::new(LabelDetectionStep));
            if refine {
                pipeline = pipeline.insert_step(0, Arc::new(RefineCropStep));
            }
            let frame = pipeline.run(img, store.snapshot())?;
            match frame.quad {
                Some(quad) => println!("Label corners: {:?}", quad.control_points()),
                None => println!("No label outline found"),
            }
            frame.image.save(&out)?;
            println!("Saved {}", out.display());
        }
        Command::Edges { image_path, out } => {
            let img = load_image(&image_path)?;
            let edges = LabelDetector::new(store.snapshot()).edge_map(&img);
            edges.save(&out)?;
            println!("Saved {}", out.display());
        }
        Command::Classify { lines } => {
            let lines = load_lines(&lines)?;
            let fields = classify(&lines, &store.snapshot());
            print_fields(&fields);
        }
        Command::Tuning => {
            let snapshot = store.snapshot();
            print!("{}", toml::to_string_pretty(snapshot.as_ref())?);
        }
    }

    Ok(())
}
