use tracing::Level;

/// Build-time level override, e.g. `AUDIO_PLAYER_LOG=trace dx serve`.
const LOG_LEVEL_OVERRIDE: Option<&str> = option_env!("AUDIO_PLAYER_LOG");

/// Install the Dioxus logger before `launch` does, so the level can be
/// raised to `trace` (per-tick persistence) or lowered to `warn`.
pub fn init_logging() {
    let level = log_level(LOG_LEVEL_OVERRIDE);

    if let Err(err) = dioxus::logger::init(level) {
        // Someone else installed a subscriber first; it still receives this.
        tracing::debug!(%err, "Logger already initialized");
        return;
    }
    if let Some(raw) = LOG_LEVEL_OVERRIDE.filter(|raw| parse_level(raw).is_none()) {
        tracing::warn!(raw, "Ignoring unknown AUDIO_PLAYER_LOG level");
    }
    tracing::debug!(%level, "Logging initialized");
}

fn log_level(override_level: Option<&str>) -> Level {
    override_level
        .and_then(parse_level)
        .unwrap_or(if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        })
}

fn parse_level(raw: &str) -> Option<Level> {
    raw.trim().parse().ok()
}
