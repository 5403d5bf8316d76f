use std::io;
use std::sync::Arc;
use std::thread;

use pcmhal::config::ServiceConfig;
use pcmhal::hal::{DaiNameProbe, DeviceManager, DriverError, HalError, SimulatedDriver, CHANNEL_MAP_LEN};

fn setup() -> (DeviceManager, SimulatedDriver) {
    let driver = SimulatedDriver::new();
    let source = || -> io::Result<String> {
        Ok("00-00: CODEC_DMA-LPAIF_WSA-RX-0 (*) :  : playback 1\n\
            00-01: CODEC_DMA-LPAIF_VA-TX-0 (*) :  : capture 1\n"
            .to_string())
    };
    let manager = DeviceManager::init_with(
        &ServiceConfig::default(),
        Arc::new(driver.clone()),
        &source,
        &DaiNameProbe,
    )
    .unwrap();
    (manager, driver)
}

fn layout() -> [u32; CHANNEL_MAP_LEN] {
    let mut map = [0u32; CHANNEL_MAP_LEN];
    map[0] = 1; // FL
    map[1] = 2; // FR
    map
}

#[test]
fn test_reads_channel_map_for_endpoint() {
    let (manager, driver) = setup();
    driver.set_channel_map("CODEC_DMA-LPAIF_WSA-RX-0", layout());

    let device = manager.get_object(0).unwrap();
    assert_eq!(manager.get_channel_map(&device).unwrap(), layout());
}

#[test]
fn test_mixer_opened_once_and_reused() {
    let (manager, driver) = setup();
    driver.set_channel_map("CODEC_DMA-LPAIF_WSA-RX-0", layout());
    driver.set_channel_map("CODEC_DMA-LPAIF_VA-TX-0", [3; CHANNEL_MAP_LEN]);
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let device = manager.get_object(i % 2).unwrap();
                manager.get_channel_map(&device).unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(driver.stats().mixer_opens, 1);
    assert!(manager.channel_mapper().is_open());
}

#[test]
fn test_missing_control_is_reported() {
    let (manager, driver) = setup();
    let device = manager.get_object(1).unwrap();

    let err = manager.get_channel_map(&device).unwrap_err();
    assert!(matches!(
        err,
        HalError::Driver {
            endpoint: 1,
            source: DriverError { errno: DriverError::ENOENT, .. }
        }
    ));
    // The handle stays open for the next query
    assert_eq!(driver.stats().mixer_opens, 1);
}

#[test]
fn test_failed_mixer_open_is_retried() {
    let (manager, driver) = setup();
    driver.set_channel_map("CODEC_DMA-LPAIF_WSA-RX-0", layout());
    let device = manager.get_object(0).unwrap();

    driver.fail_mixer(true);
    assert!(manager.get_channel_map(&device).is_err());
    assert!(!manager.channel_mapper().is_open());

    driver.fail_mixer(false);
    assert_eq!(manager.get_channel_map(&device).unwrap(), layout());
    assert_eq!(driver.stats().mixer_opens, 1);
}

#[test]
fn test_short_control_read_is_driver_failure() {
    let (manager, driver) = setup();
    driver.set_channel_map("CODEC_DMA-LPAIF_WSA-RX-0", layout());
    driver.short_reads(true);
    let device = manager.get_object(0).unwrap();

    let err = manager.get_channel_map(&device).unwrap_err();
    assert!(matches!(
        err,
        HalError::Driver {
            endpoint: 0,
            source: DriverError { errno: DriverError::EIO, .. }
        }
    ));
    assert_eq!(err.errno(), -5);

    driver.short_reads(false);
    assert_eq!(manager.get_channel_map(&device).unwrap(), layout());
}
