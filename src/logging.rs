use std::io::Write;

use chrono::Local;
use log::{debug, LevelFilter};

/// Installs the global logger: `timestamp - LEVEL - message` on stdout.
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        });
    // A logger may already be installed (tests, embedding binaries).
    if let Err(err) = builder.try_init() {
        debug!("Keeping the existing logger: {}", err);
    }
}
