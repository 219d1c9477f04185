//! Pirate Bomb boot binary.
//!
//! Loads the critical sprite set under its deadline, then runs a headless
//! render loop at a fixed timestep while the background pass upgrades the
//! asset table underneath it. Everything runs on one current-thread tokio
//! runtime, so loading and rendering interleave cooperatively.
//!
//! Usage: `kaboom_game [config.json] [manifest.json] [asset_dir_or_origin]`

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kaboom_assets::{
    load_config_from_path, AssetSource, DirSource, HttpSource, LoadError, LoadPhase, Loader,
    LoaderConfig,
};
use kaboom_core::manifest::load_manifest_from_path;
use kaboom_core::AssetManifest;
use url::Url;

use render::{HeadlessRenderer, FIXED_DT_US};

const CONFIG_PATH: &str = "assets/config/loader.json";
const MANIFEST_PATH: &str = "assets/manifest/pirate_bomb.json";
/// Frames rendered after the background pass completes before exiting.
const TAIL_FRAMES: u64 = 120;
const REPORT_EVERY_FRAMES: u64 = 60;

struct BootArgs {
    config: Option<PathBuf>,
    manifest: Option<PathBuf>,
    assets: Option<String>,
}

fn usage() -> String {
    "Usage: kaboom_game [config.json] [manifest.json] [asset_dir_or_origin]\nExample: kaboom_game assets/config/loader.json assets/manifest/pirate_bomb.json public".to_string()
}

fn parse_args() -> Result<BootArgs, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() > 3 || args.iter().any(|a| a == "-h" || a == "--help") {
        return Err(usage());
    }
    Ok(BootArgs {
        config: args.first().map(PathBuf::from),
        manifest: args.get(1).map(PathBuf::from),
        assets: args.get(2).cloned(),
    })
}

/// An explicit path must exist; the default path is optional.
fn pick_path(explicit: Option<PathBuf>, default: &str) -> Option<PathBuf> {
    explicit.or_else(|| {
        let path = Path::new(default);
        path.exists().then(|| path.to_path_buf())
    })
}

fn load_config(args: &BootArgs) -> Result<LoaderConfig, String> {
    match pick_path(args.config.clone(), CONFIG_PATH) {
        Some(path) => load_config_from_path(&path),
        None => {
            log::info!("No loader config found, using defaults");
            Ok(LoaderConfig::default())
        }
    }
}

fn load_manifest(args: &BootArgs) -> Result<AssetManifest, String> {
    match pick_path(args.manifest.clone(), MANIFEST_PATH) {
        Some(path) => load_manifest_from_path(&path),
        None => {
            log::info!("No asset manifest found, using the built-in list");
            Ok(AssetManifest::pirate_bomb())
        }
    }
}

fn make_source(
    config: &mut LoaderConfig,
    assets: Option<&str>,
) -> Result<Arc<dyn AssetSource>, String> {
    match assets {
        Some(origin) if origin.starts_with("http://") || origin.starts_with("https://") => {
            Url::parse(origin).map_err(|e| format!("Invalid asset origin '{origin}': {e}"))?;
            config.asset_origin = origin.to_string();
            Ok(Arc::new(HttpSource::new()))
        }
        Some(dir) => {
            let origin = config.origin()?;
            Ok(Arc::new(DirSource::new(dir, origin)))
        }
        None => Ok(Arc::new(HttpSource::new())),
    }
}

async fn run(loader: Arc<Loader>) -> Result<(), LoadError> {
    let table = loader
        .load_critical(&|completed: usize, total: usize| {
            log::info!("Loading critical assets: {completed}/{total}");
        })
        .await?;
    log::info!(
        "Playable with {} slot(s) in session {}",
        table.slot_count(),
        loader.session_id()
    );
    // Config may disable the automatic start; this is a no-op otherwise.
    loader.start_background_load();

    let mut renderer = HeadlessRenderer::demo_scene(table);
    let mut ticker = tokio::time::interval(Duration::from_micros(FIXED_DT_US));
    let mut frame: u64 = 0;
    let mut tail: Option<u64> = None;
    loop {
        ticker.tick().await;
        frame += 1;
        let report = renderer.tick(FIXED_DT_US);
        if report.missing > 0 {
            log::error!("Frame {frame}: {} sprite slot(s) missing", report.missing);
        }
        if frame % REPORT_EVERY_FRAMES == 0 {
            let stats = loader.fetch_stats();
            log::info!(
                "Frame {frame}: {} drawn, {} placeholder(s), phase {}, {} image(s) cached",
                report.drawn,
                report.placeholders,
                loader.phase(),
                stats.cached
            );
        }

        if loader.phase() == LoadPhase::Complete {
            let remaining = tail.get_or_insert(TAIL_FRAMES);
            if *remaining == 0 {
                break;
            }
            *remaining -= 1;
        }
    }

    loader.wait_background().await?;
    log::info!(
        "Session {} finished after {frame} frame(s), {} load event(s)",
        loader.session_id(),
        loader.events().len()
    );
    Ok(())
}

fn boot() -> Result<(), String> {
    let args = parse_args()?;
    let mut config = load_config(&args)?;
    let manifest = load_manifest(&args)?;
    let source = make_source(&mut config, args.assets.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;

    runtime.block_on(async move {
        let loader = Loader::new(config, manifest, source).map_err(|e| e.to_string())?;
        run(loader).await.map_err(|e| e.to_string())
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Pirate Bomb starting...");

    if let Err(err) = boot() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
