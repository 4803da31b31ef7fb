//! Checks the `log` backend of the logging macros. Run with `cargo test --features log`.

mod common;

use std::sync::Mutex;

use common::{fake_hw, NOTHING};
use epd_bw_spi::{EpdBwSpi, PanelConfig, IL3829};
use log::{Level, LevelFilter, Log, Metadata, Record};

struct Capture(Mutex<Vec<(Level, String)>>);

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.0.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

// The logger is process-wide, so everything that inspects it lives in this one test.
#[tokio::test]
async fn test_driver_logs_through_log_crate() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let (hw, mut spi, _recorder) = fake_hw(NOTHING);
    let mut epd = EpdBwSpi::new(hw, IL3829, PanelConfig::new(200, 200)).unwrap();
    epd.sleep(&mut spi).await.unwrap();

    let records = CAPTURE.0.lock().unwrap().clone();
    assert!(records
        .iter()
        .any(|(level, message)| *level == Level::Info && message.contains("200x200")));
    assert!(records.contains(&(Level::Debug, "Sleeping EPD".to_string())));
    assert!(records.contains(&(
        Level::Warn,
        "Sleeping without a reset line: the display can't be woken".to_string()
    )));
    assert!(records.contains(&(Level::Trace, "Sending EPD command: 0x10".to_string())));
}
