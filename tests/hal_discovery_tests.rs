use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pcmhal::config::{DiscoveryConfig, ServiceConfig};
use pcmhal::hal::device_manager::discover_with_retry;
use pcmhal::hal::{
    DaiNameProbe, DeviceId, DeviceManager, Direction, EndpointInfo, EndpointQuery, HalError,
    HwEndpointInfo, SimulatedDriver,
};
use tempfile::tempdir;

fn fast_retries(max_retries: u32) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.discovery = DiscoveryConfig {
        max_retries,
        retry_interval_ms: 1,
    };
    config
}

#[test]
fn test_empty_source_retries_whole_budget() {
    let reads = AtomicUsize::new(0);
    let source = || -> io::Result<String> {
        reads.fetch_add(1, Ordering::SeqCst);
        Ok("00-00: MultiMedia1 (*) :  : playback 1\n".to_string())
    };

    let result = discover_with_retry(&source, &DaiNameProbe, &fast_retries(5).discovery);

    assert!(matches!(result, Err(HalError::DiscoveryRetryable)));
    assert_eq!(reads.load(Ordering::SeqCst), 5);
}

#[test]
fn test_endpoint_appearing_later_is_found() {
    let reads = AtomicUsize::new(0);
    let source = || -> io::Result<String> {
        if reads.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(String::new())
        } else {
            Ok("00-05: CODEC_DMA-LPAIF_WSA-RX-0 (*) :  : playback 1\n".to_string())
        }
    };

    let manager = DeviceManager::init_with(
        &fast_retries(10),
        Arc::new(SimulatedDriver::new()),
        &source,
        &DaiNameProbe,
    )
    .unwrap();

    assert_eq!(manager.endpoint_count(), 1);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(manager.get_object(0).unwrap().id(), DeviceId { card: 0, pcm: 5 });
}

#[test]
fn test_missing_source_is_fatal_without_retry() {
    let reads = AtomicUsize::new(0);
    let source = || -> io::Result<String> {
        reads.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(io::ErrorKind::NotFound, "no /proc/asound/pcm"))
    };

    let result = DeviceManager::init_with(
        &fast_retries(10),
        Arc::new(SimulatedDriver::new()),
        &source,
        &DaiNameProbe,
    );

    assert!(matches!(result, Err(HalError::DiscoveryFatal { .. })));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_custom_probe_decides_direction() {
    let source = || -> io::Result<String> { Ok("00-00: Speaker\n00-01: Mic\n00-02: Unknown\n".to_string()) };
    let probe = |_card: u32, _pcm: u32, name: &str| -> Option<HwEndpointInfo> {
        let direction = match name {
            "Speaker" => Direction::Output,
            "Mic" => Direction::Input,
            _ => return None,
        };
        Some(HwEndpointInfo {
            interface: pcmhal::hal::AudioInterface::UsbAudio,
            lpaif: None,
            direction,
            index: 0,
        })
    };

    let manager =
        DeviceManager::init_with(&fast_retries(1), Arc::new(SimulatedDriver::new()), &source, &probe)
            .unwrap();

    assert_eq!(
        manager.get_endpoint_info_list(8),
        EndpointQuery::Filled(vec![
            EndpointInfo {
                name: "Speaker".to_string(),
                direction: Direction::Output
            },
            EndpointInfo {
                name: "Mic".to_string(),
                direction: Direction::Input
            },
        ])
    );
}

#[test]
fn test_endpoint_info_list_protocol() {
    let source = || -> io::Result<String> {
        Ok("00-00: CODEC_DMA-LPAIF_WSA-RX-0\n\
            00-01: CODEC_DMA-LPAIF_VA-TX-0\n\
            00-02: TDM-LPAIF-RX-SECONDARY\n"
            .to_string())
    };
    let manager =
        DeviceManager::init_with(&fast_retries(1), Arc::new(SimulatedDriver::new()), &source, &DaiNameProbe)
            .unwrap();

    assert_eq!(manager.get_endpoint_info_list(0), EndpointQuery::Count(3));

    let EndpointQuery::Filled(partial) = manager.get_endpoint_info_list(2) else {
        panic!("expected entries");
    };
    assert_eq!(partial.len(), 2);

    let EndpointQuery::Filled(all) = manager.get_endpoint_info_list(10) else {
        panic!("expected entries");
    };
    let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["CODEC_DMA-LPAIF_WSA-RX-0", "CODEC_DMA-LPAIF_VA-TX-0", "TDM-LPAIF-RX-SECONDARY"]
    );
    assert_eq!(all[1].direction, Direction::Input);
}

#[test]
fn test_index_and_id_lookup() {
    let source = || -> io::Result<String> { Ok("01-04: USB_AUDIO-RX\n01-07: USB_AUDIO-TX\n".to_string()) };
    let manager =
        DeviceManager::init_with(&fast_retries(1), Arc::new(SimulatedDriver::new()), &source, &DaiNameProbe)
            .unwrap();

    assert_eq!(manager.get_card_id().unwrap(), 1);
    assert_eq!(manager.get_object(1).unwrap().pcm_id(), 7);
    assert!(matches!(manager.get_object(2), Err(HalError::InvalidArgument(_))));
    assert!(manager.find(DeviceId { card: 1, pcm: 4 }).is_some());
    assert!(manager.find(DeviceId { card: 0, pcm: 4 }).is_none());
}

#[tokio::test]
async fn test_init_waits_for_sound_card_registration() {
    let dir = tempdir().unwrap();
    let pcm_path = dir.path().join("pcm");
    tokio::fs::write(&pcm_path, "").await.unwrap();

    let mut config = ServiceConfig::default();
    config.enumeration_path = pcm_path.clone();
    config.notification_path = dir.path().join("state");
    config.discovery = DiscoveryConfig {
        max_retries: 200,
        retry_interval_ms: 10,
    };

    let init = tokio::task::spawn_blocking(move || {
        DeviceManager::init(&config, Arc::new(SimulatedDriver::new()))
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    tokio::fs::write(&pcm_path, "00-03: CODEC_DMA-LPAIF_RXTX-RX-1 (*) :  : playback 1\n")
        .await
        .unwrap();

    let manager = init.await.unwrap().unwrap();
    assert_eq!(manager.endpoint_count(), 1);
    assert_eq!(manager.get_object(0).unwrap().name(), "CODEC_DMA-LPAIF_RXTX-RX-1");
}

#[test]
fn test_non_utf8_line_does_not_hide_valid_endpoints() {
    let dir = tempdir().unwrap();
    let mut config = fast_retries(1);
    config.enumeration_path = dir.path().join("pcm");
    config.notification_path = dir.path().join("state");
    std::fs::write(
        &config.enumeration_path,
        b"00-00: CODEC_DMA-LPAIF_WSA-RX-0 (*) :  : playback 1\n\
          00-01: Bad\xffName (*) :  : playback 1\n",
    )
    .unwrap();

    let manager = DeviceManager::init(&config, Arc::new(SimulatedDriver::new())).unwrap();

    assert_eq!(manager.endpoint_count(), 1);
    assert_eq!(manager.get_object(0).unwrap().name(), "CODEC_DMA-LPAIF_WSA-RX-0");
}
