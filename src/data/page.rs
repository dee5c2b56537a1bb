//! Reading one page of samples out of `page_data`.
//!
//! `page_data` is a flat stream of little-endian `f32`. Each pixel column holds
//! one sample per channel, channel index varying fastest:
//!
//! ```text
//! [px0_ch0, px0_ch1, .., px0_chN-1, px1_ch0, px1_ch1, ..]
//! ```
//!
//! Column 0 of the stream corresponds to `available_start_sec` of the current
//! [`BufferWindow`], and columns are spaced `seconds_per_page / pixel_width`
//! seconds apart.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::config::ProtocolTiming;
use crate::data::buffer::BufferWindow;
use crate::error::{Error, Result};
use crate::session::cancel::{CancelToken, Waiter};
use crate::session::directory::{files, SessionDirectory};

#[cfg(feature = "page_read_debug")]
macro_rules! page_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*); } }
#[cfg(not(feature = "page_read_debug"))]
macro_rules! page_debug { ($($arg:tt)*) => {}; }

pub const BYTES_PER_SAMPLE: u64 = 4;

/// Samples of one page, stored channel-major: row `c` is channel `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    channels: usize,
    width: usize,
    data: Vec<f32>,
}

impl SampleMatrix {
    pub fn filled(channels: usize, width: usize, value: f32) -> Self {
        Self {
            channels,
            width,
            data: vec![value; channels * width],
        }
    }

    /// Build from per-channel rows. `None` if the rows differ in length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            channels: rows.len(),
            width,
            data: rows.concat(),
        })
    }

    /// De-interleave a channel-fastest stream. Missing trailing samples become NaN.
    pub fn from_interleaved(samples: &[f32], channels: usize, width: usize) -> Self {
        let mut m = Self::filled(channels, width, f32::NAN);
        for (i, &v) in samples.iter().take(channels * width).enumerate() {
            let (pixel, channel) = (i / channels, i % channels);
            m.data[channel * width + pixel] = v;
        }
        m
    }

    /// Channel-fastest stream, the inverse of [`SampleMatrix::from_interleaved`].
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.data.len());
        for pixel in 0..self.width {
            for channel in 0..self.channels {
                out.push(self.data[channel * self.width + pixel]);
            }
        }
        out
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn pixel_width(&self) -> usize {
        self.width
    }

    pub fn row(&self, channel: usize) -> &[f32] {
        &self.data[channel * self.width..(channel + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.channels).map(move |c| self.row(c))
    }
}

/// Column index of `curr_sec` within the buffered stream.
pub fn offset_samples(
    curr_sec: f64,
    available_start_sec: f64,
    pixel_width: u32,
    seconds_per_page: f64,
) -> u64 {
    let columns = (curr_sec - available_start_sec) * f64::from(pixel_width) / seconds_per_page;
    columns.round().max(0.0) as u64
}

/// Byte position of `curr_sec` in `page_data`.
pub fn byte_offset(
    curr_sec: f64,
    available_start_sec: f64,
    pixel_width: u32,
    seconds_per_page: f64,
    channel_count: usize,
) -> u64 {
    offset_samples(curr_sec, available_start_sec, pixel_width, seconds_per_page)
        * channel_count as u64
        * BYTES_PER_SAMPLE
}

pub fn decode_le_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE as usize)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub fn encode_le_f32(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Reader of `page_data` for one session.
pub struct PageReader {
    dir: SessionDirectory,
    timing: ProtocolTiming,
    token: CancelToken,
}

impl PageReader {
    pub fn new(dir: SessionDirectory, timing: ProtocolTiming, token: CancelToken) -> Self {
        Self { dir, timing, token }
    }

    /// Read the page starting at `curr_sec`.
    ///
    /// `window` must come from a wait that covered `[curr_sec, curr_sec + seconds_per_page]`.
    /// If the file ends early, the missing samples are NaN.
    pub fn read(
        &self,
        window: &BufferWindow,
        curr_sec: f64,
        seconds_per_page: f64,
        pixel_width: u32,
        channel_count: usize,
    ) -> Result<SampleMatrix> {
        let path = self.dir.file(files::PAGE_DATA);
        let waiter = Waiter::new(&self.token, "page data", self.timing.window_timeout());
        let mut file = loop {
            match File::open(&path) {
                Ok(f) => break f,
                Err(_) => waiter.pause(self.timing.retry())?,
            }
        };

        let offset = byte_offset(
            curr_sec,
            window.available_start_sec,
            pixel_width,
            seconds_per_page,
            channel_count,
        );
        let wanted = channel_count * pixel_width as usize * BYTES_PER_SAMPLE as usize;
        file.seek(SeekFrom::Start(offset)).map_err(|e| Error::io(&path, e))?;
        let mut bytes = Vec::with_capacity(wanted);
        file.take(wanted as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(&path, e))?;
        page_debug!(offset, wanted, got = bytes.len(), curr_sec, "page read");
        if bytes.len() < wanted {
            tracing::warn!(
                offset,
                wanted,
                got = bytes.len(),
                "page data shorter than requested, padding with NaN"
            );
        }

        let samples = decode_le_f32(&bytes);
        Ok(SampleMatrix::from_interleaved(
            &samples,
            channel_count,
            pixel_width as usize,
        ))
    }
}
