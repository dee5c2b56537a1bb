use eegpager::data::page::SampleMatrix;
use eegpager::data::render::*;

fn matrix(rows: &[Vec<f32>]) -> SampleMatrix {
    SampleMatrix::from_rows(rows).unwrap()
}

fn ramp() -> Vec<f32> {
    (0..50).map(|i| (i * 2) as f32).collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn quantiles_interpolate_linearly() {
    let r = ramp();
    assert!(approx(nan_quantile(&r, 0.95).unwrap(), 93.1));
    assert!(approx(nan_quantile(&r, 0.05).unwrap(), 4.9));
    assert!(approx(channel_range(&r).unwrap(), 88.2));
    assert_eq!(nan_quantile(&[], 0.5), None);
}

#[test]
fn nan_samples_are_ignored() {
    let v = [f32::NAN, 1.0, f32::NAN, 3.0];
    assert_eq!(nan_mean(&v), Some(2.0));
    assert_eq!(nan_quantile(&v, 0.0), Some(1.0));
    assert_eq!(nan_quantile(&v, 1.0), Some(3.0));
    assert_eq!(channel_range(&[f32::NAN, f32::NAN]), None);
}

#[test]
fn single_channel_autoscale() {
    let raw = matrix(&[ramp()]);
    let limit = autoscale_limit(&raw, 400.0);
    assert!(approx(limit, 705.6), "got {}", limit);
}

#[test]
fn all_nan_channel_is_left_out_of_the_average() {
    let raw = matrix(&[ramp(), vec![f32::NAN; 50]]);
    // average over the one usable channel, slots computed for two
    let limit = autoscale_limit(&raw, 300.0);
    assert!(approx(limit, 4.0 * 88.2 * 3.0), "got {}", limit);
}

#[test]
fn no_usable_channel_falls_back_to_pixel_height() {
    let raw = matrix(&[vec![f32::NAN; 10], vec![f32::NAN; 10]]);
    assert_eq!(autoscale_limit(&raw, 480.0), 480.0);
    let flat = matrix(&[vec![5.0; 10]]);
    assert_eq!(autoscale_limit(&flat, 480.0), 480.0);
}

#[test]
fn traces_are_centred_in_their_slots() {
    let raw = matrix(&[vec![10.0, 20.0, 30.0], vec![-1.0, 0.0, 1.0]]);
    let mut scale = Autoscale::new();
    scale.set(300.0);
    let page = RenderTransform::new(400.0, 10.0).render(&raw, true, &mut scale);

    assert_eq!(page.offsets, vec![100.0, 200.0]);
    assert_eq!(page.traces[0], vec![90.0, 100.0, 110.0]);
    assert_eq!(page.traces[1], vec![199.0, 200.0, 201.0]);
    assert_eq!(page.vertical_limit, 300.0);
}

#[test]
fn polarity_flip_mirrors_about_the_offset() {
    let raw = matrix(&[vec![10.0, 20.0, 30.0]]);
    let mut scale = Autoscale::new();
    scale.set(200.0);
    let t = RenderTransform::new(400.0, 10.0);
    let up = t.render(&raw, true, &mut scale);
    let down = t.render(&raw, false, &mut scale);
    assert_eq!(up.traces[0], vec![90.0, 100.0, 110.0]);
    assert_eq!(down.traces[0], vec![110.0, 100.0, 90.0]);
    assert_eq!(up.offsets, down.offsets);
}

#[test]
fn nan_stays_nan_and_splits_segments() {
    let raw = matrix(&[vec![1.0, f32::NAN, 3.0, 5.0, f32::NAN]]);
    let mut scale = Autoscale::new();
    scale.set(100.0);
    let page = RenderTransform::new(400.0, 4.0).render(&raw, true, &mut scale);
    assert!(page.traces[0][1].is_nan());

    let segments = page.segments(0);
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].len(), 1);
    assert_eq!(segments[1].iter().map(|p| p[0]).collect::<Vec<_>>(), vec![2.0, 3.0]);
}

#[test]
fn x_spans_the_page() {
    let raw = matrix(&[vec![0.0; 5]]);
    let mut scale = Autoscale::new();
    let page = RenderTransform::new(400.0, 30.0).render(&raw, true, &mut scale);
    let xs: Vec<f64> = page.points(0).iter().map(|p| p[0]).collect();
    assert_eq!(xs, vec![0.0, 7.5, 15.0, 22.5, 30.0]);
}

#[test]
fn scale_steps_and_reset() {
    let raw = matrix(&[ramp()]);
    let mut scale = Autoscale::new();
    scale.scale_up();
    assert_eq!(scale.vertical_limit(), None);

    let t = RenderTransform::new(400.0, 10.0);
    t.render(&raw, true, &mut scale);
    let initial = scale.vertical_limit().unwrap();
    scale.scale_up();
    assert!(approx(scale.vertical_limit().unwrap(), initial / SCALE_STEP));
    scale.scale_down();
    scale.scale_down();
    assert!(approx(scale.vertical_limit().unwrap(), initial * SCALE_STEP));

    // kept across pages until reset
    let other = matrix(&[vec![0.0, 1000.0, -1000.0, 0.0]]);
    assert!(approx(
        t.render(&other, true, &mut scale).vertical_limit,
        initial * SCALE_STEP
    ));
    scale.reset();
    assert_eq!(scale.vertical_limit(), None);
}

#[test]
fn microvolts_per_centimetre() {
    // 254 px at 100 dpi is 6.45 cm
    assert!(approx(microvolts_per_cm(645.16, 254.0, 100.0), 100.0));
}
