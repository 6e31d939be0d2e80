/// Replays a JSON-lines message script through the station controller (native builds).
///
/// Usage:
/// - `photofinish-replay [SCRIPT]` reads messages from SCRIPT, or stdin when absent.
///   Each line is one `Message` as JSON; blank lines and lines starting with `#`
///   are skipped. Every resulting effect is printed to stdout as one JSON line.
/// - `photofinish-replay --init-config` writes the default configuration file.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = replay::run() {
        eprintln!("Replay error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use std::ffi::{OsStr, OsString};
    use std::io::{self, BufRead, BufReader, Write};
    use std::path::PathBuf;

    use photofinish::StationApp;
    use photofinish::config::StationConfig;
    use photofinish::message::Message;
    use photofinish::storage::MemoryStore;

    /// Environment variable pointing at an explicit config file.
    const CONFIG_ENV: &str = "PHOTOFINISH_CONFIG";

    const INIT_CONFIG_FLAG: &str = "--init-config";

    pub fn run() -> io::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Stderr)
            .init();

        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let arg = std::env::args_os().nth(1);
        if arg.as_deref() == Some(OsStr::new(INIT_CONFIG_FLAG)) {
            return init_config(explicit);
        }

        let config = StationConfig::resolve(explicit.as_deref()).map_err(io::Error::other)?;
        if std::env::var_os("RUST_LOG").is_none() {
            log::set_max_level(config.log_level.to_level_filter());
        }

        replay(config, arg)
    }

    fn init_config(explicit: Option<PathBuf>) -> io::Result<()> {
        let path = explicit
            .or_else(StationConfig::default_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory"))?;
        if path.exists() {
            log::warn!("{:?} already exists, leaving it untouched", path);
            return Ok(());
        }
        StationConfig::default()
            .write_to_path(&path)
            .map_err(io::Error::other)?;
        log::info!("⚙️  Wrote default configuration to {:?}", path);
        Ok(())
    }

    fn replay(config: StationConfig, script: Option<OsString>) -> io::Result<()> {
        let input: Box<dyn BufRead> = match script {
            Some(path) => {
                log::info!("Replaying {:?}", path);
                Box::new(BufReader::new(std::fs::File::open(path)?))
            }
            None => Box::new(BufReader::new(io::stdin())),
        };

        let mut app = StationApp::new(config, MemoryStore::new());
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for (number, line) in input.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let message: Message = match serde_json::from_str(trimmed) {
                Ok(message) => message,
                Err(e) => {
                    log::error!("Line {}: invalid message: {}", number + 1, e);
                    continue;
                }
            };

            for effect in app.update(message) {
                let json = serde_json::to_string(&effect).map_err(io::Error::other)?;
                writeln!(stdout, "{}", json)?;
            }
        }

        log::info!(
            "Final state: phase {:?}, selection {:?}, image {}/{}, enablement {:?}, unsaved {}",
            app.sync().phase(),
            app.navigator().selection(),
            app.navigator().index().get(),
            app.navigator().max_count(),
            app.enablement(),
            app.guard().has_unsaved_changes()
        );
        Ok(())
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
