//! In-process stand-in for the page server, driven entirely through the
//! session directory like the real one.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use eegpager::config::ProtocolTiming;
use eegpager::data::page::encode_le_f32;
use eegpager::session::{files, PageServerLauncher, SessionDirectory};

pub const START_USEC: i64 = 1_000_000_000_000_000;
pub const END_USEC: i64 = 1_000_000_100_000_000;
pub const START_SEC: f64 = 1_000_000_000.0;
pub const END_SEC: f64 = 1_000_000_100.0;

const SERVER_LIFETIME: Duration = Duration::from_secs(30);

pub fn timing() -> ProtocolTiming {
    ProtocolTiming {
        reset_settle_ms: 50,
        ..ProtocolTiming::fast()
    }
}

/// Sample the fake server stores for `channel` at stream column `column`.
pub fn sample_value(channel: usize, column: u64) -> f32 {
    channel as f32 * 10_000.0 + column as f32
}

/// `<root>/recording/<name>` for every name.
pub fn make_recording(root: &Path, names: &[&str]) -> PathBuf {
    let data = root.join("recording");
    for n in names {
        fs::create_dir_all(data.join(n)).unwrap();
    }
    data
}

#[derive(Debug, Clone, Default)]
pub struct FakeRecording {
    /// Required password; `None` for an unencrypted recording.
    pub password: Option<String>,
    pub events: Option<String>,
    pub discon: Option<String>,
    pub server_heartbeat: bool,
    /// Never write `server_info`.
    pub mute: bool,
    /// While set the server neither reads nor writes anything.
    pub paused: Arc<AtomicBool>,
}

impl FakeRecording {
    /// Stop serving and give an in-flight pass time to finish.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    pub recording: FakeRecording,
    pub launches: AtomicUsize,
    pub dirs: Mutex<Vec<PathBuf>>,
    pub passwords: Mutex<Vec<Option<String>>>,
}

impl FakeLauncher {
    pub fn new(recording: FakeRecording) -> Self {
        Self {
            recording,
            ..Default::default()
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl PageServerLauncher for FakeLauncher {
    fn launch(
        &self,
        dir: &SessionDirectory,
        password: Option<&str>,
    ) -> eegpager::Result<Option<Child>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.dirs.lock().unwrap().push(dir.path().to_path_buf());
        self.passwords
            .lock()
            .unwrap()
            .push(password.map(str::to_string));
        let dir = dir.clone();
        let recording = self.recording.clone();
        let password = password.map(str::to_string);
        thread::spawn(move || serve(dir, recording, password));
        Ok(None)
    }
}

struct Spec {
    nonce: String,
    channel_paths: Vec<String>,
    pixel_width: u64,
    seconds_per_page: u64,
}

impl Spec {
    fn parse(text: &str) -> Option<Spec> {
        let lines: Vec<&str> = text.lines().collect();
        let n: usize = lines.get(2)?.trim().parse().ok()?;
        let channel_paths = lines.get(3..3 + n)?.iter().map(|s| s.to_string()).collect();
        Some(Spec {
            nonce: lines.first()?.to_string(),
            channel_paths,
            pixel_width: lines.get(3 + n)?.trim().parse().ok()?,
            seconds_per_page: lines.get(4 + n)?.trim().parse().ok()?,
        })
    }
}

fn write_page_data(dir: &SessionDirectory, spec: &Spec) {
    let columns = ((END_SEC - START_SEC) * spec.pixel_width as f64
        / spec.seconds_per_page as f64)
        .ceil() as u64
        + spec.pixel_width;
    let n = spec.channel_paths.len();
    let mut samples = Vec::with_capacity(columns as usize * n);
    for k in 0..columns {
        for c in 0..n {
            samples.push(sample_value(c, k));
        }
    }
    let staging = dir.file(".page_data.tmp");
    fs::write(&staging, encode_le_f32(&samples)).unwrap();
    fs::rename(&staging, dir.file(files::PAGE_DATA)).unwrap();
}

fn write_info(dir: &SessionDirectory, spec: &Spec, recording: &FakeRecording) {
    let mut info = format!("{}\n", spec.channel_paths.len());
    for (i, path) in spec.channel_paths.iter().enumerate() {
        // Second channel ends later; the session ends with the first.
        let end = END_USEC + i as i64 * 5_000_000;
        info.push_str(&format!("{} {} {} {} 1.0\n", path, START_USEC, end, i));
    }
    info.push_str("end\n");
    if let Some(events) = &recording.events {
        dir.publish(files::EVENTS, events).unwrap();
    }
    if let Some(discon) = &recording.discon {
        dir.publish(files::DISCON, discon).unwrap();
    }
    dir.publish(files::SERVER_INFO, &info).unwrap();
}

fn serve(dir: SessionDirectory, recording: FakeRecording, password: Option<String>) {
    if recording.password.is_some() && recording.password != password {
        let _ = dir.publish(files::PASSWORD_NEEDED, "1\n");
        return;
    }
    let deadline = Instant::now() + SERVER_LIFETIME;
    let mut spec: Option<Spec> = None;
    let mut info_written = false;
    while Instant::now() < deadline && dir.path().exists() {
        if recording.paused.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        if let Some(parsed) = dir.read_text(files::PAGE_SPECS).ok().and_then(|t| Spec::parse(&t)) {
            if spec.as_ref().map_or(true, |s| s.nonce != parsed.nonce) {
                write_page_data(&dir, &parsed);
                spec = Some(parsed);
            }
        }
        if let Some(s) = &spec {
            if !info_written && !recording.mute {
                write_info(&dir, s, &recording);
                info_written = true;
            }
            let cursor = dir
                .read_text(files::CURRENT_SEC)
                .ok()
                .and_then(|t| t.trim().parse::<i64>().ok());
            if matches!(cursor, Some(c) if c < 0) {
                return;
            }
            let mut limits = format!("{:?}\n{:?}\n", START_SEC, END_SEC);
            if recording.server_heartbeat {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs();
                limits.push_str(&format!("{}\n", now));
            }
            let _ = dir.publish(files::BUFFER_LIMITS, &limits);
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Poll `cond` for up to two seconds.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}
