mod common;

use common::timing;
use eegpager::data::buffer::BufferWindow;
use eegpager::data::page::*;
use eegpager::session::{files, CancelToken, SessionDirectory};

fn write_page_data(dir: &SessionDirectory, samples: &[f32]) {
    std::fs::write(dir.file(files::PAGE_DATA), encode_le_f32(samples)).unwrap();
}

#[test]
fn offsets_count_columns_from_buffer_start() {
    assert_eq!(offset_samples(1000.0, 1000.0, 800, 30.0), 0);
    assert_eq!(offset_samples(1030.0, 1000.0, 800, 30.0), 800);
    assert_eq!(offset_samples(1001.0, 1000.0, 300, 10.0), 30);
    // a cursor before the buffer never seeks backwards
    assert_eq!(offset_samples(990.0, 1000.0, 300, 10.0), 0);
    // columns are rounded, not truncated
    assert_eq!(offset_samples(1001.0, 1000.0, 100, 60.0), 2);
    assert_eq!(byte_offset(1001.0, 1000.0, 300, 10.0, 4), 30 * 4 * 4);
}

#[test]
fn channel_varies_fastest() {
    // two channels, three columns
    let stream = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
    let m = SampleMatrix::from_interleaved(&stream, 2, 3);
    assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
    assert_eq!(m.row(1), &[10.0, 20.0, 30.0]);
    assert_eq!(m.to_interleaved(), stream.to_vec());
}

#[test]
fn short_stream_pads_with_nan() {
    let m = SampleMatrix::from_interleaved(&[1.0, 10.0, 2.0], 2, 3);
    assert_eq!(m.row(0)[..2], [1.0, 2.0]);
    assert!(m.row(0)[2].is_nan());
    assert_eq!(m.row(1)[0], 10.0);
    assert!(m.row(1)[1].is_nan());
}

#[test]
fn from_rows_rejects_ragged_input() {
    assert!(SampleMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
    let m = SampleMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    assert_eq!(m.to_interleaved(), vec![1.0, 3.0, 2.0, 4.0]);
}

#[test]
fn little_endian_decoding() {
    let bytes = [0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0, 0xff];
    assert_eq!(decode_le_f32(&bytes), vec![1.0, -2.0]);
}

#[test]
fn reads_page_at_cursor() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = SessionDirectory::create_in(tmp.path()).unwrap();
    // 3 channels, 40 columns; sample = channel * 100 + column
    let samples: Vec<f32> = (0..40)
        .flat_map(|k| (0..3).map(move |c| (c * 100 + k) as f32))
        .collect();
    write_page_data(&dir, &samples);

    let reader = PageReader::new(dir, timing(), CancelToken::new());
    let window = BufferWindow::new(500.0, 520.0);
    // 10 columns per 5 s page; cursor 2 s in starts at column 4
    let page = reader.read(&window, 502.0, 5.0, 10, 3).unwrap();
    assert_eq!(page.channel_count(), 3);
    assert_eq!(page.pixel_width(), 10);
    assert_eq!(page.row(0)[0], 4.0);
    assert_eq!(page.row(2)[9], 213.0);
}

#[test]
fn read_past_end_of_data_is_padded() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = SessionDirectory::create_in(tmp.path()).unwrap();
    let samples: Vec<f32> = (0..12).map(|v| v as f32).collect();
    write_page_data(&dir, &samples);

    let reader = PageReader::new(dir, timing(), CancelToken::new());
    let page = reader
        .read(&BufferWindow::new(0.0, 100.0), 1.0, 5.0, 5, 2)
        .unwrap();
    // starts at column 1: samples 2..12 cover columns 1..5
    assert_eq!(page.row(0), &[2.0, 4.0, 6.0, 8.0, 10.0]);
    assert_eq!(page.row(1), &[3.0, 5.0, 7.0, 9.0, 11.0]);

    let page = reader
        .read(&BufferWindow::new(0.0, 100.0), 4.0, 5.0, 5, 2)
        .unwrap();
    assert_eq!(page.row(0)[..2], [8.0, 10.0]);
    assert!(page.row(0)[2..].iter().all(|v| v.is_nan()));
}

#[test]
fn missing_page_data_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = SessionDirectory::create_in(tmp.path()).unwrap();
    let mut t = timing();
    t.window_timeout_secs = Some(0);
    let reader = PageReader::new(dir, t, CancelToken::new());
    let err = reader
        .read(&BufferWindow::new(0.0, 10.0), 0.0, 5.0, 5, 1)
        .unwrap_err();
    assert!(matches!(err, eegpager::Error::TimedOut { .. }));
}
