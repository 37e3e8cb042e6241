use std::env;
use std::path::PathBuf;

use annotations::{AnnotationConfig, AnnotationSession, DecoratorRegistry, TaskOutcome};
use clap::{Parser, Subcommand};
use foundation::math::{Vec2, Vec3};
use runtime::cancel::CancelToken;
use runtime::frame::Frame;
use scene::{DecorateContext, PlanViewport, PointerEvent, Viewport};
use serde_json::json;
use streaming::InMemoryRowSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATASET: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/dataset.json");

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless viewer for scene annotations")]
struct Args {
    /// Annotation config JSON (default: $ANNOTATE_CONFIG, else built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the queries a session would issue
    Queries,

    /// Connect a session against a dataset and render frames
    Run {
        /// Dataset JSON: class name -> record array (default: $ANNOTATE_DATASET)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Number of frames to render
        #[arg(long, default_value_t = 3)]
        frames: u64,

        /// Viewport size in pixels: width,height
        #[arg(long, default_value = "800,600")]
        size: String,

        /// Pixels per world unit
        #[arg(long, default_value_t = 4.0)]
        scale: f64,

        /// World units to pan along x after each frame
        #[arg(long, default_value_t = 0.0)]
        pan: f64,

        /// Zoom factor applied after each frame
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,

        /// Primary-button clicks routed after the last frame: x,y (repeatable)
        #[arg(long)]
        click: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match args.config.or_else(|| env::var("ANNOTATE_CONFIG").ok().map(PathBuf::from)) {
        Some(path) => {
            info!("loading config from {}", path.display());
            AnnotationConfig::load(&path)?
        }
        None => AnnotationConfig::default(),
    };
    let session = AnnotationSession::from_config(&config);

    match args.command {
        Command::Queries => {
            println!("{}", session.visibility().query().statement());
            println!("{}", session.resolver().query().statement());
        }
        Command::Run {
            dataset,
            frames,
            size,
            scale,
            pan,
            zoom,
            click,
        } => {
            let dataset = dataset
                .or_else(|| env::var("ANNOTATE_DATASET").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
            let size = parse_pair(&size)?;
            let clicks = click
                .iter()
                .map(|c| parse_pair(c))
                .collect::<Result<Vec<_>, _>>()?;
            let run = RunOptions {
                frames,
                size,
                scale,
                pan,
                zoom,
                clicks,
            };
            run_session(&config, &session, dataset, run).await?;
        }
    }

    Ok(())
}

struct RunOptions {
    frames: u64,
    size: Vec2,
    scale: f64,
    pan: f64,
    zoom: f64,
    clicks: Vec<Vec2>,
}

async fn run_session(
    config: &AnnotationConfig,
    session: &AnnotationSession,
    dataset: PathBuf,
    opts: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading dataset from {}", dataset.display());
    let raw = tokio::fs::read_to_string(&dataset).await?;
    let source = InMemoryRowSource::from_json_str(&raw)?;

    // Start centred on the first known position so resolved markers are in view.
    let center = config
        .annotations
        .positions
        .values()
        .next()
        .map(|p| Vec3::from(*p))
        .unwrap_or(Vec3::from(config.annotations.fallback));
    let mut viewport = PlanViewport::new(center, opts.scale, opts.size);
    let mut registry = DecoratorRegistry::new();
    let cancel = CancelToken::new();

    let report = session
        .connect(&source, &mut viewport, &mut registry, &cancel)
        .await;
    match &report.categories {
        TaskOutcome::Applied(ids) => info!(hidden = ids.len(), "categories hidden"),
        TaskOutcome::Failed(err) => warn!("categories left visible: {err}"),
        TaskOutcome::Cancelled => warn!("category hiding cancelled"),
    }
    match &report.markers {
        TaskOutcome::Applied(id) => info!(decorator = id.0, "annotations attached"),
        TaskOutcome::Failed(err) => warn!("no annotations: {err}"),
        TaskOutcome::Cancelled => warn!("annotations cancelled"),
    }

    let mut frame = Frame::default();
    let mut frame_summaries = Vec::new();
    for _ in 0..opts.frames {
        let mut ctx = DecorateContext::new(frame, viewport.as_projector());
        let failures = registry.decorate_all(&mut ctx);
        let draws = ctx.into_draws();
        for draw in &draws {
            info!(
                frame = frame.index,
                label = %draw.label,
                x = draw.anchor_px.x,
                y = draw.anchor_px.y,
                cluster = draw.cluster_size,
                flagged = draw.flagged,
                "draw"
            );
        }
        frame_summaries.push(json!({
            "frame": frame.index,
            "draws": draws.len(),
            "failures": failures,
            "labels": draws.iter().map(|d| d.label.clone()).collect::<Vec<_>>(),
        }));

        viewport.pan(Vec3::new(opts.pan, 0.0, 0.0));
        viewport.zoom(opts.zoom);
        frame = frame.next();
    }

    let mut handled = 0usize;
    for position in &opts.clicks {
        registry.dispatch_pointer(&PointerEvent::moved(*position), viewport.as_projector());
        let status = registry.dispatch_pointer(
            &PointerEvent::button_down(0, *position),
            viewport.as_projector(),
        );
        info!(x = position.x, y = position.y, handled = status.is_handled(), "click");
        if status.is_handled() {
            handled += 1;
        }
    }

    let hidden: Vec<String> = viewport
        .hidden_categories()
        .iter()
        .map(|id| id.to_string())
        .collect();
    let summary = json!({
        "hidden_categories": hidden,
        "decorators": registry.len(),
        "frames": frame_summaries,
        "clicks": opts.clicks.len(),
        "clicks_handled": handled,
        "events": registry
            .events()
            .iter()
            .map(|e| json!({ "frame": e.frame_index, "kind": e.kind, "message": e.message }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    session.disconnect(&report, &mut registry);
    Ok(())
}

fn parse_pair(raw: &str) -> Result<Vec2, Box<dyn std::error::Error>> {
    let (a, b) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {raw:?}"))?;
    Ok(Vec2::new(a.trim().parse()?, b.trim().parse()?))
}
