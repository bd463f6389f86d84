use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wallgrid::cache::ThumbnailCache;
use wallgrid::config::{self, GalleryConfig};
use wallgrid::controller::GalleryController;
use wallgrid::imaging::DecoderRegistry;
use wallgrid::types::Size;
use wallgrid::{output, scan};

#[derive(Parser)]
#[command(name = "wallgrid")]
#[command(about = "Thumbnail cache and grid layout for a wallpaper folder")]
#[command(long_about = "\
Thumbnail cache and grid layout for a wallpaper folder

Every image in the source folder gets a pre-sized JPEG thumbnail in the cache
directory. Thumbnails are rebuilt when their source changes, and deleted when
their source disappears. The grid adapts its column count to the viewport.

Run 'wallgrid gen-config' to generate a documented wallgrid.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (optional; stock defaults apply when absent)
    #[arg(long, default_value = "wallgrid.toml", global = true)]
    config: PathBuf,

    /// Wallpaper directory (overrides scan.root)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Thumbnail cache directory (overrides cache.root)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring the thumbnail cache in line with the wallpaper directory
    Refresh,
    /// Lay out the gallery for a viewport and print every placement
    Layout {
        /// Viewport width in pixels
        #[arg(long)]
        width: u32,
        /// Viewport height in pixels
        #[arg(long, default_value_t = 0)]
        height: u32,
    },
    /// Print a stock wallgrid.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut gallery_config = config::load_config(&cli.config)?;
    if let Some(source) = cli.source {
        gallery_config.scan.root = source;
    }
    if let Some(cache_dir) = cli.cache_dir {
        gallery_config.cache.root = Some(cache_dir);
    }
    init_thread_pool(&gallery_config.processing);

    let decoders = DecoderRegistry::with_defaults();
    let sources = scan::scan_sources(&gallery_config.scan, &decoders)?;
    let mut cache = open_cache(&gallery_config, decoders)?;

    match cli.command {
        Command::Refresh => {
            println!(
                "==> Refreshing {} sources into {}",
                sources.len(),
                cache.root().display()
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_cache_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = cache.refresh_with_events(&sources, Some(tx));
            let _ = printer.join();
            output::print_gallery(&result?);
        }
        Command::Layout { width, height } => {
            let (mut controller, _) = GalleryController::initialize(
                &mut cache,
                &sources,
                gallery_config.grid_spec()?,
                gallery_config.columns_hint()?,
            )?;
            println!(
                "Preferred window: {}",
                controller.preferred_size(gallery_config.rows_hint()?)
            );
            let relayout = controller.on_resize(Size::new(width, height));
            println!("{}", output::format_relayout(&relayout));
            output::print_layout(&controller);
            for err in controller.skipped() {
                eprintln!("skipped: {}", err);
            }
        }
        Command::GenConfig => {} // handled above
    }

    Ok(())
}

fn open_cache(
    gallery_config: &GalleryConfig,
    decoders: DecoderRegistry,
) -> Result<ThumbnailCache, config::ConfigError> {
    Ok(ThumbnailCache::with_decoders(
        gallery_config.cache_root(),
        gallery_config.thumbnail_params()?,
        decoders,
    ))
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default filter.
fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,wallgrid=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
