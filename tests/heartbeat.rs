use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use eegpager::session::{files, LivenessSignal, SessionDirectory};

fn now() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64()
}

#[test]
fn writes_timestamp_every_other_tick() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = SessionDirectory::create_in(tmp.path()).unwrap();
    let mut signal =
        LivenessSignal::start(&dir, Duration::from_millis(10), Duration::from_millis(200)).unwrap();
    assert!(signal.is_running());

    let deadline = Instant::now() + Duration::from_secs(2);
    while !dir.exists(files::HEARTBEAT_UI) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    let stamp: f64 = dir.read_text(files::HEARTBEAT_UI).unwrap().trim().parse().unwrap();
    assert!((now() - stamp).abs() < 5.0);

    assert!(signal.stop());
    assert!(!signal.is_running());
    assert!(signal.stop());
}

#[test]
fn stop_is_prompt_with_a_long_tick() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = SessionDirectory::create_in(tmp.path()).unwrap();
    let mut signal =
        LivenessSignal::start(&dir, Duration::from_secs(10), Duration::from_secs(1)).unwrap();
    let started = Instant::now();
    assert!(signal.stop());
    assert!(started.elapsed() < Duration::from_secs(1));
    // no write happened before the first two ticks
    assert!(!dir.exists(files::HEARTBEAT_UI));
}
