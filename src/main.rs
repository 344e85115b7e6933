use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tower_http::services::ServeDir;

use bgcut::adapters::{
    display::registry::DisplayRegistry,
    http::{router, state::HttpState},
    imaging::{compose::BlurOptions, jpeg_encoder::JpegStillEncoder},
    remote::rembg_client::RembgHttpClient,
    v4l2::camera_repo::V4l2Camera,
};
use bgcut::application::{
    batch::{BatchOptions, BatchService},
    workflow::{WorkflowController, WorkflowOptions},
};
use bgcut::config::Settings;

#[derive(Parser)]
#[command(name = "bgcut")]
#[command(about = "Upload or capture an image and remove its background with a remote service")]
struct Args {
    /// Configuration file (TOML). Defaults to ./bgcut.toml when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the control API (default)
    Serve,
    /// Process every image in a directory
    Batch {
        #[arg(short, long, default_value = "input")]
        input: PathBuf,
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Image used for the "bg" variant
        #[arg(short, long)]
        background: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Batch { input, output, background } => {
            let background = background.or_else(|| settings.batch.background.clone().map(PathBuf::from));
            batch(settings, input, output, background).await
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Adaptadores
    let display = Arc::new(DisplayRegistry::new());
    let camera = Arc::new(V4l2Camera::new(settings.camera.clone()));
    let encoder = Arc::new(JpegStillEncoder::new());
    let remover = Arc::new(RembgHttpClient::new(&settings.service)?);
    tracing::info!("Servicio de eliminación de fondo: {}", remover.endpoint());

    // 3. Flujo de trabajo
    let workflow = WorkflowController::new(
        camera,
        encoder,
        remover,
        display.clone(),
        WorkflowOptions {
            initial_facing: settings.camera.initial_facing,
            jpeg_quality: settings.camera.jpeg_quality,
            download_name: settings.server.download_name.clone(),
        },
    );
    let state = HttpState::new(workflow, display, settings.server.download_name.clone());

    // 4. Router y archivos estáticos
    let app = router(state.clone()).fallback_service(ServeDir::new(&settings.server.static_dir));

    // 5. Servidor
    let listener = tokio::net::TcpListener::bind(&settings.server.listen).await?;
    tracing::info!("🚀 Servidor iniciado en http://{}", settings.server.listen);
    tracing::info!("📂 Archivos estáticos servidos desde '{}'", settings.server.static_dir);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // 6. Liberar cámara y referencias antes de salir
    state.workflow.lock().await.teardown();
    tracing::info!("Servidor detenido");
    Ok(())
}

async fn batch(settings: Settings, input: PathBuf, output: PathBuf, background: Option<PathBuf>) -> anyhow::Result<()> {
    let remover = Arc::new(RembgHttpClient::new(&settings.service)?);
    let opts = BatchOptions {
        input,
        output,
        background,
        fill: settings.batch.fill,
        blur: BlurOptions {
            radius: settings.batch.blur_radius,
            feather: settings.batch.feather,
            edge_desat: settings.batch.edge_desat,
        },
    };

    let report = BatchService::new(remover).run(&opts).await?;
    tracing::info!("Lote terminado: {} procesadas, {} con error", report.processed, report.failed);
    if report.failed > 0 {
        anyhow::bail!("{} image(s) failed", report.failed);
    }
    Ok(())
}
