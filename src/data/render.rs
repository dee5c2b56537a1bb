//! Turning a raw page into stacked, scaled traces.
//!
//! Each channel gets its own horizontal slot: the plot spans `[0, vertical_limit]`
//! vertically and channel `i` is centred at `(i + 1) * vertical_limit / (n + 1)`.
//! Traces are mean-centred before offsetting so DC levels do not push a channel
//! out of its slot.

use crate::data::page::SampleMatrix;

/// Multiplier applied per scale step (up shrinks the limit, down grows it).
pub const SCALE_STEP: f64 = 1.4;

/// Linear-interpolated quantile of the non-NaN values, `q` in `[0, 1]`.
pub fn nan_quantile(values: &[f32], q: f64) -> Option<f64> {
    let mut v: Vec<f64> = values
        .iter()
        .filter(|x| !x.is_nan())
        .map(|&x| f64::from(x))
        .collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(v[lo] + (v[hi] - v[lo]) * (pos - lo as f64))
}

/// Mean of the non-NaN values.
pub fn nan_mean(values: &[f32]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|x| !x.is_nan())
        .fold((0.0f64, 0usize), |(s, n), &x| (s + f64::from(x), n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// 95th minus 5th percentile; `None` when the channel has no usable sample.
pub fn channel_range(values: &[f32]) -> Option<f64> {
    let r = nan_quantile(values, 0.95)? - nan_quantile(values, 0.05)?;
    r.is_finite().then_some(r)
}

/// Initial vertical extent for a page.
///
/// `pixel_height * avg_range / ((pixel_height / (n + 1)) / 4)`, averaging the
/// percentile range over the channels that have one. The result gives each
/// channel roughly four times its typical excursion so neighbouring traces
/// rarely collide. Falls back to `pixel_height` when no channel has a range.
pub fn autoscale_limit(raw: &SampleMatrix, pixel_height: f64) -> f64 {
    let ranges: Vec<f64> = raw.rows().filter_map(channel_range).collect();
    if ranges.is_empty() || pixel_height <= 0.0 {
        tracing::warn!("no channel produced a usable range, autoscale falls back to pixel height");
        return pixel_height.max(1.0);
    }
    let avg_range = ranges.iter().sum::<f64>() / ranges.len() as f64;
    let slot_px = pixel_height / (raw.channel_count() + 1) as f64;
    let limit = pixel_height * (avg_range / (slot_px / 4.0));
    if limit > 0.0 && limit.is_finite() {
        limit
    } else {
        pixel_height
    }
}

/// Session-wide vertical scale, established from the first page rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Autoscale {
    vertical_limit: Option<f64>,
}

impl Autoscale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertical_limit(&self) -> Option<f64> {
        self.vertical_limit
    }

    pub fn set(&mut self, vertical_limit: f64) {
        self.vertical_limit = Some(vertical_limit);
    }

    /// Forget the scale; the next render recomputes it.
    pub fn reset(&mut self) {
        self.vertical_limit = None;
    }

    /// Shrink the limit (traces appear larger).
    pub fn scale_up(&mut self) {
        if let Some(v) = self.vertical_limit.as_mut() {
            *v /= SCALE_STEP;
        }
    }

    /// Grow the limit (traces appear smaller).
    pub fn scale_down(&mut self) {
        if let Some(v) = self.vertical_limit.as_mut() {
            *v *= SCALE_STEP;
        }
    }

    fn resolve(&mut self, raw: &SampleMatrix, pixel_height: f64) -> f64 {
        *self
            .vertical_limit
            .get_or_insert_with(|| autoscale_limit(raw, pixel_height))
    }
}

/// Plot-ready page: one trace per channel, x in seconds since page start.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub traces: Vec<Vec<f64>>,
    /// Baseline of each channel's slot.
    pub offsets: Vec<f64>,
    pub vertical_limit: f64,
    pub seconds_per_page: f64,
}

impl RenderedPage {
    /// X coordinate of pixel column `i` out of `width` (evenly spaced, both ends included).
    pub fn x_at(&self, i: usize, width: usize) -> f64 {
        if width <= 1 {
            0.0
        } else {
            self.seconds_per_page * i as f64 / (width - 1) as f64
        }
    }

    /// `[x, y]` pairs for one channel.
    pub fn points(&self, channel: usize) -> Vec<[f64; 2]> {
        let trace = &self.traces[channel];
        let width = trace.len();
        trace
            .iter()
            .enumerate()
            .map(|(i, &y)| [self.x_at(i, width), y])
            .collect()
    }

    /// Runs of finite points of one channel; NaN samples split the trace.
    pub fn segments(&self, channel: usize) -> Vec<Vec<[f64; 2]>> {
        let mut out = Vec::new();
        let mut run = Vec::new();
        for p in self.points(channel) {
            if p[1].is_finite() {
                run.push(p);
            } else if !run.is_empty() {
                out.push(std::mem::take(&mut run));
            }
        }
        if !run.is_empty() {
            out.push(run);
        }
        out
    }
}

/// Stacks, centres and offsets the channels of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub pixel_height: f64,
    pub seconds_per_page: f64,
}

impl RenderTransform {
    pub fn new(pixel_height: f64, seconds_per_page: f64) -> Self {
        Self {
            pixel_height,
            seconds_per_page,
        }
    }

    /// Render `raw`. With `negative_up == false` each trace is negated
    /// (about its mean) before offsetting; the axis itself never flips.
    pub fn render(
        &self,
        raw: &SampleMatrix,
        negative_up: bool,
        autoscale: &mut Autoscale,
    ) -> RenderedPage {
        let vertical_limit = autoscale.resolve(raw, self.pixel_height);
        let n = raw.channel_count();
        let slot = vertical_limit / (n + 1) as f64;

        let mut traces = Vec::with_capacity(n);
        let mut offsets = Vec::with_capacity(n);
        for (i, row) in raw.rows().enumerate() {
            let offset = (i + 1) as f64 * slot;
            let mean = nan_mean(row).unwrap_or(0.0);
            let trace = row
                .iter()
                .map(|&x| {
                    let centred = f64::from(x) - mean;
                    if negative_up {
                        centred + offset
                    } else {
                        offset - centred
                    }
                })
                .collect();
            traces.push(trace);
            offsets.push(offset);
        }

        RenderedPage {
            traces,
            offsets,
            vertical_limit,
            seconds_per_page: self.seconds_per_page,
        }
    }
}

/// Physical scale readout: signal units per centimetre of screen.
pub fn microvolts_per_cm(vertical_limit: f64, pixel_height: f64, dpi: f64) -> f64 {
    vertical_limit / ((pixel_height / dpi) * 2.54)
}
