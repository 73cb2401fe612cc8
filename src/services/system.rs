//! Host capability checks

use tokio::process::Command;
use tracing::info;

/// Check that the audio player can be executed on this system
pub async fn check_player_available(player: &str) -> Result<(), String> {
    Command::new(player)
        .arg("--version")
        .output()
        .await
        .map_err(|e| format!("{} is not available ({}), the completion sound will be muted", player, e))?;

    info!("{} is available", player);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_player() {
        let err = check_player_available("pomodoro-widget-no-such-player").await.unwrap_err();
        assert!(err.contains("muted"));
    }
}
