use chrono::{FixedOffset, Utc};
use eegpager::config::{ProtocolTiming, SecondsPerPage, ViewerConfig};
use eegpager::data::clock::{clock_label_in, uv_per_cm_label};
use eegpager::persistence::*;

#[test]
fn defaults() {
    let c = ViewerConfig::default();
    assert_eq!(c.seconds_per_page.get(), 30);
    assert!(c.negative_up);
    assert!(!c.multicolor);
    assert_eq!(c.channel_exclude, vec!["accel".to_string()]);
    assert_eq!(c.timing, ProtocolTiming::default());
    assert_eq!(c.timing.retry().as_millis(), 100);
    assert_eq!(c.timing.window_wait().as_millis(), 500);
    assert_eq!(c.timing.negotiation_timeout(), None);
}

#[test]
fn seconds_per_page_is_restricted() {
    assert!(SecondsPerPage::new(20).is_none());
    assert_eq!(
        SecondsPerPage::all().map(u32::from).collect::<Vec<_>>(),
        vec![5, 10, 15, 30, 45, 60]
    );
    assert!(serde_yaml::from_str::<ViewerConfig>("seconds_per_page: 7\n").is_err());
}

#[test]
fn partial_yaml_keeps_other_defaults() {
    let yaml = "seconds_per_page: 10\nmulticolor: true\ntiming:\n  window_timeout_secs: 3\n";
    let c: ViewerConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(c.seconds_per_page.get(), 10);
    assert!(c.multicolor);
    assert!(c.negative_up);
    assert_eq!(c.timing.window_timeout_secs, Some(3));
    assert_eq!(c.timing.retry_ms, 100);
}

#[test]
fn yaml_file_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("config.yaml");
    let mut c = ViewerConfig::default();
    c.dpi = 96.0;
    c.server_path = Some("/opt/eeg/eeg_page_server".into());
    c.save_to_path(&path).unwrap();
    assert_eq!(ViewerConfig::load_from_path(&path).unwrap(), c);

    let missing = tmp.path().join("absent.yaml");
    assert_eq!(ViewerConfig::load_or_default(&missing).unwrap(), ViewerConfig::default());
}

#[test]
fn explicit_server_path_wins() {
    let mut c = ViewerConfig::default();
    c.server_path = Some("/usr/local/bin/eeg_page_server".into());
    assert_eq!(
        c.resolve_server_path().unwrap(),
        std::path::PathBuf::from("/usr/local/bin/eeg_page_server")
    );
    c.server_path = None;
    let resolved = c.resolve_server_path().unwrap();
    assert!(resolved
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("eeg_page_server"));
}

#[test]
fn view_state_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = ViewStateSerde::default_path(&tmp.path().join("config.yaml"));
    let state = ViewStateSerde {
        seconds_per_page: SecondsPerPage::new(45).unwrap(),
        negative_up: false,
        multicolor: true,
        hide_annotations: true,
    };
    save_state_to_path(&state, &path).unwrap();
    let loaded = load_state_from_path(&path).unwrap();
    assert_eq!(loaded, state);

    let mut c = ViewerConfig::default();
    loaded.apply_to(&mut c);
    assert_eq!(c.seconds_per_page.get(), 45);
    assert!(!c.negative_up);
    assert!(c.hide_annotations);
}

#[test]
fn view_state_json_is_lenient() {
    let s = state_from_json("{\"multicolor\": true}").unwrap();
    assert!(s.multicolor);
    assert_eq!(s.seconds_per_page.get(), 30);
    assert!(state_from_json("{\"seconds_per_page\": 12}").is_err());
    assert!(state_to_json(&s).unwrap().contains("\"seconds_per_page\": 30"));
}

#[test]
fn clock_and_scale_labels() {
    assert_eq!(
        clock_label_in(1_498_484_904, &Utc),
        "Time: 06/26/2017 13:48:24"
    );
    let east = FixedOffset::east_opt(3600).unwrap();
    assert_eq!(clock_label_in(0, &east), "Time: 01/01/1970 01:00:00");
    assert_eq!(uv_per_cm_label(12.5), "\u{03BC}V/cm: 12.5000 ");
}
