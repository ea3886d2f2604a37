use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use foilsim_api::{EngineState, RestApi};
use foilsim_core::SearchConfig;
use foilsim_storage::{load_engine, DataFiles};

/// Airfoil similarity search server
#[derive(Parser, Debug)]
#[command(name = "foilsim")]
#[command(about = "Weighted similarity search over airfoil performance data", long_about = None)]
struct Args {
    /// Directory holding airfoil_data.json and num_scaler.json
    #[arg(short, long, env = "FOILSIM_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Reference table file (overrides the one in --data-dir)
    #[arg(long, env = "FOILSIM_TABLE")]
    table: Option<PathBuf>,

    /// Fitted scaler file (overrides the one in --data-dir)
    #[arg(long, env = "FOILSIM_SCALER")]
    scaler: Option<PathBuf>,

    /// Address to bind the HTTP API to
    #[arg(long, env = "FOILSIM_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, env = "FOILSIM_HTTP_PORT", default_value_t = 5000)]
    http_port: u16,

    /// Log level
    #[arg(long, env = "FOILSIM_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Distance percentile used to calibrate similarity decay
    #[arg(long, env = "FOILSIM_PERCENTILE", default_value_t = 95.0)]
    percentile: f64,

    /// Similarity fraction reached at the calibration percentile
    #[arg(long, env = "FOILSIM_THRESHOLD", default_value_t = 0.01)]
    threshold: f64,

    /// Multiplier applied to the calibrated decay rate
    #[arg(long, env = "FOILSIM_DECAY_SCALE", default_value_t = 200.0)]
    decay_scale: f64,

    /// Results returned when a request does not set a limit
    #[arg(long, env = "FOILSIM_TOP_K", default_value_t = 3)]
    top_k: usize,

    /// Exit at startup if the reference data cannot be loaded
    #[arg(long, env = "FOILSIM_FAIL_FAST")]
    fail_fast: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting foilsim v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API port: {}", args.http_port);

    let mut files = DataFiles::in_dir(&args.data_dir);
    if let Some(table) = args.table.clone() {
        files = files.with_table(table);
    }
    if let Some(scaler) = args.scaler.clone() {
        files = files.with_scaler(scaler);
    }

    let config = SearchConfig {
        percentile: args.percentile,
        threshold: args.threshold,
        decay_scale: args.decay_scale,
        top_k: args.top_k,
    };

    let loaded = load_engine(&files, config);
    if let Err(e) = &loaded {
        if args.fail_fast {
            error!("Failed to load reference data: {}", e);
            return Err(anyhow::anyhow!("failed to load reference data: {}", e));
        }
        warn!("Failed to load reference data, searches will fail until restarted: {}", e);
    }
    let state = EngineState::from_load(loaded);
    info!("Engine initialized");

    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, host, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("foilsim started successfully");
    info!("HTTP API: http://localhost:{}/api", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
