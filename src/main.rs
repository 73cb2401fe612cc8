//! Pomodoro Widget - a work/break countdown served as a small local daemon
//! 
//! This is the main entry point for the pomodoro-widget application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pomodoro_widget::{
    api::create_router,
    config::Config,
    services::{check_player_available, CommandSoundCue, SilentCue, SoundCue},
    state::AppState,
    tasks::display_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_widget={},tower_http=info", config.log_level()))
        .init();

    let timer = config.timer()?;

    info!("Starting pomodoro-widget v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, work={}min, break={}min, theme={}",
          config.host, config.port, config.work_minutes, config.break_minutes, config.theme);

    // A missing player only costs us the sound
    let sound: Arc<dyn SoundCue> = if config.mute {
        info!("Sound cue muted");
        Arc::new(SilentCue)
    } else if let Err(e) = check_player_available(&config.player).await {
        warn!("{}", e);
        Arc::new(SilentCue)
    } else {
        Arc::new(CommandSoundCue::load(
            config.player.clone(),
            config.sound.clone(),
            config.fallback_sound.clone(),
        ))
    };

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        timer,
        config.theme,
        sound,
    ));

    if config.display {
        let display_state = Arc::clone(&state);
        tokio::spawn(async move {
            display_task(display_state).await;
        });
    }

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start        - Start the countdown");
    info!("  POST /pause        - Pause the countdown");
    info!("  POST /toggle       - Start or pause");
    info!("  POST /reset        - Back to a full work phase");
    info!("  PUT  /settings     - Change durations or theme");
    info!("  POST /theme/toggle - Switch between light and dark");
    info!("  GET  /status       - Current timer and settings");
    info!("  GET  /health       - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.shutdown() {
        warn!("Failed to stop timer cleanly: {}", e);
    }
    info!("Server shutdown complete");
    Ok(())
}
