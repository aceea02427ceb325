//! Forwards `log` records from arcdvi-core to defmt.

use defmt::Display2Format;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        let msg = Display2Format(record.args());
        match record.level() {
            Level::Error => defmt::error!("{}", msg),
            Level::Warn => defmt::warn!("{}", msg),
            Level::Info => defmt::info!("{}", msg),
            Level::Debug => defmt::debug!("{}", msg),
            Level::Trace => defmt::trace!("{}", msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: DefmtLogger = DefmtLogger;

/// Install the adapter. Only the first call has any effect.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
