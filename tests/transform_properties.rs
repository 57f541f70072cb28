use ndarray::{s, Array, ArrayD, Axis, IxDyn};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rusty_xdata::transform::{
    concatenate, display_data, display_rgba, fft, fourier_mask, hstack, ifft, line_profile, pick, slice_sum, sum,
    sum_region, vstack,
};
use rusty_xdata::{ArrayData, CalibratedArray, Calibration, DataDescriptor, ElementKind, XDataError};

fn random_array(rng: &mut StdRng, shape: &[usize]) -> ArrayD<f64> {
    Array::from_shape_fn(IxDyn(shape), |_| rng.gen_range(-1.0..1.0))
}

fn unit_calibrations(units: &[&str]) -> Vec<Calibration> {
    units.iter().map(|u| Calibration::with_units(*u)).collect()
}

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v * v, count + 1));
    (sum / count as f64).sqrt()
}

fn real(xdata: &CalibratedArray) -> &ArrayD<f64> {
    xdata.data().as_real().expect("real data")
}

// ---------------------------------------------------------------------------
// Fourier transforms
// ---------------------------------------------------------------------------

#[test_log::test]
fn fft_forward_and_back_is_consistent() {
    let mut rng = StdRng::seed_from_u64(7);
    let src_data = random_array(&mut rng, &[256, 256]);
    let src = CalibratedArray::from_data(src_data.clone());

    let back = ifft(&fft(&src).unwrap()).unwrap();
    let restored = back.data().real_part();
    let max_error = (&src_data - &restored).iter().fold(0.0f64, |m, e| m.max(e.abs()));
    assert!(max_error < 1e-12, "max error {max_error}");
    assert!((&src_data - &restored).sum().abs() < 1e-12);
    assert!(back.data().imaginary_part().iter().all(|v| v.abs() < 1e-12));
    assert_eq!(back.data_shape(), back.dimensional_shape());
}

#[test_log::test]
fn fft_rms_is_same_as_original() {
    let mut rng = StdRng::seed_from_u64(11);
    let src_data = random_array(&mut rng, &[256, 256]);
    let spectrum = fft(&CalibratedArray::from_data(src_data.clone())).unwrap();
    let source_rms = rms(src_data.iter().copied());
    let spectrum_rms = rms(spectrum.data().as_complex().unwrap().iter().map(|z| z.norm()));
    assert!((source_rms - spectrum_rms).abs() < 1e-12);
}

#[test_log::test]
fn fft_rebases_offsets_independent_of_source_offsets() {
    let mut rng = StdRng::seed_from_u64(3);
    let src = CalibratedArray::from_data_with_calibrations(
        random_array(&mut rng, &[16, 16]),
        Calibration::default(),
        vec![Calibration::new(3.0, 1.0, ""), Calibration::new(2.0, 1.0, "")],
    )
    .unwrap();
    let spectrum = fft(&src).unwrap();
    assert_eq!(spectrum.dimensional_calibrations()[0].offset(), -0.5);
    assert_eq!(spectrum.dimensional_calibrations()[1].offset(), -0.5);
    assert_eq!(spectrum.dimensional_calibrations()[0].scale(), 1.0 / 16.0);
    let back = ifft(&spectrum).unwrap();
    assert_eq!(back.dimensional_calibrations()[0], Calibration::default());
    assert_eq!(back.dimensional_calibrations()[1], Calibration::default());
}

#[test_log::test]
fn fourier_round_trip_keeps_units() {
    let src = CalibratedArray::from_data_with_calibrations(
        ArrayD::<f64>::ones(IxDyn(&[32, 32])),
        Calibration::default(),
        unit_calibrations(&["mm", "mm"]),
    )
    .unwrap();
    let spectrum = fft(&src).unwrap();
    assert_eq!(spectrum.dimensional_calibrations()[0].units(), "1/mm");
    let back = ifft(&spectrum).unwrap();
    assert_eq!(back.dimensional_calibrations()[0].units(), "mm");
    assert_eq!(back.dimensional_calibrations()[1].units(), "mm");

    let unitless = CalibratedArray::from_data(ArrayD::<f64>::ones(IxDyn(&[32, 32])));
    let back = ifft(&fft(&unitless).unwrap()).unwrap();
    assert_eq!(back.dimensional_calibrations()[0].units(), "");
    assert_eq!(back.dimensional_calibrations()[1].units(), "");
}

#[test_log::test]
fn fourier_round_trip_restores_non_unit_scales() {
    let mut rng = StdRng::seed_from_u64(11);
    for (n, scale) in [(7, 0.3), (16, 0.25), (31, 1.7), (64, 0.01)] {
        let src = CalibratedArray::from_data_with_calibrations(
            random_array(&mut rng, &[n]),
            Calibration::with_units("counts"),
            vec![Calibration::new(2.0, scale, "nm")],
        )
        .unwrap();
        let back = ifft(&fft(&src).unwrap()).unwrap();
        let restored = &back.dimensional_calibrations()[0];
        assert_eq!(restored.offset(), 0.0);
        assert_eq!(restored.units(), "nm");
        assert!(
            ((restored.scale() - scale) / scale).abs() <= 4.0 * f64::EPSILON,
            "n={n}: scale {scale} came back as {}",
            restored.scale()
        );
        assert_eq!(back.intensity_calibration(), src.intensity_calibration());
    }
}

#[test_log::test]
fn fourier_mask_works_with_all_dimensions() {
    let mut rng = StdRng::seed_from_u64(5);
    for (h, w) in [(32, 32), (31, 30), (30, 31), (31, 31), (32, 31), (31, 32)] {
        let data = CalibratedArray::from_data(random_array(&mut rng, &[h, w]));
        let mask_values = random_array(&mut rng, &[h, w]).mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let mask = CalibratedArray::from_data(mask_values);
        let spectrum = fft(&data).unwrap();
        let masked = fourier_mask(&spectrum, &mask).unwrap();
        assert_eq!(masked.dimensional_calibrations(), spectrum.dimensional_calibrations());
        let filtered = ifft(&masked).unwrap();
        let imaginary_sum = filtered.data().imaginary_part().sum();
        assert!(imaginary_sum.abs() < 1e-9, "{h}x{w}: imaginary sum {imaginary_sum}");
    }
}

#[test_log::test]
fn fft_works_on_rgba_data() {
    let mut rng = StdRng::seed_from_u64(13);
    let channels = Array::from_shape_fn(IxDyn(&[32, 32, 4]), |_| rng.gen::<u8>());
    let src = CalibratedArray::from_data(ArrayData::from_rgba_channels(channels).unwrap());
    let spectrum = fft(&src).unwrap();
    assert_eq!(spectrum.data_shape(), vec![32, 32]);
    assert_eq!(spectrum.element_kind(), ElementKind::Complex);
}

#[test_log::test]
fn fft_works_on_1d_rgba_data() {
    let mut rng = StdRng::seed_from_u64(17);
    let channels = Array::from_shape_fn(IxDyn(&[32, 4]), |_| rng.gen::<u8>());
    let src = CalibratedArray::from_data(ArrayData::from_rgba_channels(channels).unwrap());
    assert_eq!(src.data_shape(), vec![32]);
    let spectrum = fft(&src).unwrap();
    assert_eq!(spectrum.data_shape(), vec![32]);
    assert_eq!(spectrum.element_kind(), ElementKind::Complex);
    assert_eq!(spectrum.dimensional_calibrations()[0].offset(), -0.5);
}

// ---------------------------------------------------------------------------
// Line profiles
// ---------------------------------------------------------------------------

fn bar_image() -> CalibratedArray {
    let mut data = ArrayD::<f64>::zeros(IxDyn(&[32, 32]));
    data[[16, 15]] = 1.0;
    data[[16, 16]] = 1.0;
    data[[16, 17]] = 1.0;
    CalibratedArray::from_data_with_calibrations(data, Calibration::with_units("e"), vec![Calibration::default(); 2])
        .unwrap()
}

#[test_log::test]
fn line_profile_uses_integer_coordinates() {
    let src = bar_image();
    let expected: Vec<f64> = real(&src).slice(s![8..24, 16]).to_vec();

    let profile = line_profile(&src, ((8.0 / 32.0, 16.0 / 32.0), (24.0 / 32.0, 16.0 / 32.0)), 1.0).unwrap();
    assert_eq!(real(&profile).iter().copied().collect::<Vec<_>>(), expected);

    let jittered = line_profile(
        &src,
        (
            (8.0 / 32.0 + 1.0 / 128.0, 16.0 / 32.0 + 1.0 / 128.0),
            (24.0 / 32.0 + 2.0 / 128.0, 16.0 / 32.0 + 2.0 / 128.0),
        ),
        1.0,
    )
    .unwrap();
    assert_eq!(jittered.data(), profile.data());

    let wide = line_profile(&src, ((8.0 / 32.0, 16.0 / 32.0), (24.0 / 32.0, 16.0 / 32.0)), 3.0).unwrap();
    let tripled: Vec<f64> = expected.iter().map(|v| v * 3.0).collect();
    assert_eq!(real(&wide).iter().copied().collect::<Vec<_>>(), tripled);
}

#[test_log::test]
fn line_profile_width_adjusts_only_output_intensity() {
    let src = bar_image();
    let profile = line_profile(&src, ((8.0 / 32.0, 16.0 / 32.0), (24.0 / 32.0, 16.0 / 32.0)), 3.0).unwrap();
    assert!((profile.intensity_calibration().scale() - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(src.intensity_calibration(), &Calibration::with_units("e"));
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

#[test_log::test]
fn sum_over_two_axes_returns_correct_shape() {
    let src = CalibratedArray::from_data(ArrayD::<f64>::ones(IxDyn(&[4, 4, 16])));
    let dst = sum(&src, &[0, 1]).unwrap();
    assert_eq!(dst.data_shape(), vec![16]);
    assert_eq!(dst.dimensional_calibrations().len(), 1);
}

#[test_log::test]
fn slice_sum_grabs_signal_index() {
    let mut rng = StdRng::seed_from_u64(17);
    let random_data = random_array(&mut rng, &[3, 4, 5]);
    let c = unit_calibrations(&["a", "b", "c", "d"]);
    let src =
        CalibratedArray::from_data_with_calibrations(random_data.clone(), c[0].clone(), c[1..].to_vec()).unwrap();
    let slice = slice_sum(&src, 2, 2).unwrap();
    let expected = random_data.slice(s![.., .., 1..3]).sum_axis(Axis(2)).into_dyn();
    assert_eq!(real(&slice), &expected);
    assert_eq!(slice.dimensional_shape(), vec![3, 4]);
    assert_eq!(slice.intensity_calibration(), &c[0]);
    assert_eq!(slice.dimensional_calibrations(), &c[1..3]);
}

#[test_log::test]
fn slice_sum_works_on_2d_data() {
    let mut rng = StdRng::seed_from_u64(19);
    let random_data = random_array(&mut rng, &[4, 10]);
    let c = unit_calibrations(&["a", "b", "c"]);
    let src =
        CalibratedArray::from_data_with_calibrations(random_data.clone(), c[0].clone(), c[1..].to_vec()).unwrap();
    let result = slice_sum(&src, 5, 3).unwrap();
    let expected = random_data.slice(s![.., 4..7]).sum_axis(Axis(1)).into_dyn();
    assert_eq!(real(&result), &expected);
    assert_eq!(result.intensity_calibration(), src.intensity_calibration());
    assert_eq!(result.dimensional_calibrations()[0], src.dimensional_calibrations()[0]);
}

#[test_log::test]
fn sum_region_produces_correct_result() {
    let mut rng = StdRng::seed_from_u64(23);
    let random_data = random_array(&mut rng, &[3, 4, 5]);
    let c = unit_calibrations(&["a", "b", "c", "d"]);
    let src =
        CalibratedArray::from_data_with_calibrations(random_data.clone(), c[0].clone(), c[1..].to_vec()).unwrap();
    let mut mask_data = ArrayD::<f64>::zeros(IxDyn(&[3, 4]));
    mask_data[[0, 1]] = 1.0;
    mask_data[[2, 2]] = 1.0;
    let mask = CalibratedArray::from_data(ArrayData::scalar(rusty_xdata::ScalarKind::Int64, mask_data));

    let region = sum_region(&src, &mask).unwrap();
    let expected = (&random_data.slice(s![0, 1, ..]) + &random_data.slice(s![2, 2, ..])).into_dyn();
    let got = real(&region);
    assert!(got.iter().zip(expected.iter()).all(|(a, b)| (a - b).abs() < 1e-15));
    assert_eq!(region.dimensional_shape(), vec![5]);
    assert_eq!(region.intensity_calibration(), &c[0]);
    assert_eq!(region.dimensional_calibrations(), &c[3..]);
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test_log::test]
fn pick_grabs_datum_index_from_3d() {
    let mut rng = StdRng::seed_from_u64(29);
    let random_data = random_array(&mut rng, &[3, 4, 5]);
    let c = unit_calibrations(&["a", "b", "c", "d"]);
    let src =
        CalibratedArray::from_data_with_calibrations(random_data.clone(), c[0].clone(), c[1..].to_vec()).unwrap();
    let picked = pick(&src, &[2.0 / 3.0, 1.0 / 4.0]).unwrap();
    assert_eq!(real(&picked), &random_data.slice(s![2, 1, ..]).into_dyn().to_owned());
    assert_eq!(picked.dimensional_shape(), vec![5]);
    assert_eq!(picked.intensity_calibration(), &c[0]);
    assert_eq!(picked.dimensional_calibrations(), &c[3..]);
}

#[test_log::test]
fn pick_grabs_datum_index_from_4d() {
    let mut rng = StdRng::seed_from_u64(31);
    let random_data = random_array(&mut rng, &[3, 4, 5, 6]);
    let c = unit_calibrations(&["a", "b", "c", "d", "e"]);
    let src = CalibratedArray::new_with_data(
        random_data.clone(),
        c[0].clone(),
        c[1..].to_vec(),
        DataDescriptor::new(false, 2, 2),
    )
    .unwrap();
    let picked = pick(&src, &[2.0 / 3.0, 1.0 / 4.0]).unwrap();
    assert_eq!(real(&picked), &random_data.slice(s![2, 1, .., ..]).into_dyn().to_owned());
    assert_eq!(picked.dimensional_shape(), vec![5, 6]);
    assert_eq!(picked.intensity_calibration(), &c[0]);
    assert_eq!(picked.dimensional_calibrations(), &c[3..]);
    assert_eq!(picked.data_descriptor(), DataDescriptor::new(false, 0, 2));
}

fn offset_spectrum(rng: &mut StdRng) -> CalibratedArray {
    CalibratedArray::from_data_with_calibrations(
        random_array(rng, &[16]).mapv(|v| (v.abs() + 1.0) * 10.0),
        Calibration::default(),
        vec![Calibration::new(3.0, 1.0, "")],
    )
    .unwrap()
}

#[test_log::test]
fn concatenate_works_with_1d_inputs() {
    let mut rng = StdRng::seed_from_u64(37);
    let (a1, a2) = (offset_spectrum(&mut rng), offset_spectrum(&mut rng));
    let c0 = concatenate(&[a1.clone(), a2.clone()], 0).unwrap();
    assert_eq!(c0.data_shape(), c0.dimensional_shape());
    let expected = ndarray::concatenate(Axis(0), &[real(&a1).view(), real(&a2).view()]).unwrap();
    assert_eq!(real(&c0), &expected);
    assert_eq!(c0.dimensional_calibrations(), a1.dimensional_calibrations());
}

#[test_log::test]
fn vstack_and_hstack_work_with_1d_inputs() {
    let mut rng = StdRng::seed_from_u64(41);
    let (a1, a2) = (offset_spectrum(&mut rng), offset_spectrum(&mut rng));

    let stacked = vstack(&[a1.clone(), a2.clone()]).unwrap();
    assert_eq!(stacked.data_shape(), vec![2, 16]);
    assert_eq!(real(&stacked).index_axis(Axis(0), 1), real(&a2).view());

    let joined = hstack(&[a1.clone(), a2.clone()]).unwrap();
    assert_eq!(joined.data_shape(), vec![32]);
    assert_eq!(real(&joined).slice(s![..16]), real(&a1).slice(s![..]));
}

#[test_log::test]
fn stacking_rejects_mismatched_shapes() {
    let a = CalibratedArray::from_data(ArrayD::<f64>::zeros(IxDyn(&[31, 30])));
    let b = CalibratedArray::from_data(ArrayD::<f64>::zeros(IxDyn(&[32, 32])));
    let is_shape_mismatch = |r: rusty_xdata::Result<CalibratedArray>| matches!(r, Err(XDataError::ShapeMismatch { .. }));

    assert!(is_shape_mismatch(concatenate(&[a.clone(), b.clone()], 0)));
    assert!(is_shape_mismatch(vstack(&[a.clone(), b.clone()])));
    assert!(is_shape_mismatch(hstack(&[a.clone(), b.clone()])));
    assert!(is_shape_mismatch(fourier_mask(&fft(&a).unwrap(), &b)));

    let cube = CalibratedArray::from_data(ArrayD::<f64>::zeros(IxDyn(&[32, 32, 8])));
    assert!(is_shape_mismatch(sum_region(&cube, &a)));
    assert!(sum_region(&cube, &b).is_ok());

    let line = CalibratedArray::from_data(ArrayD::<f64>::zeros(IxDyn(&[30])));
    assert!(is_shape_mismatch(concatenate(&[a, line], 0)));
}

// ---------------------------------------------------------------------------
// Display projections
// ---------------------------------------------------------------------------

#[test_log::test]
fn display_data_2d_not_a_view() {
    let mut rng = StdRng::seed_from_u64(43);
    let values = Array::from_shape_fn(IxDyn(&[2, 2]), |_| rng.gen::<u8>());
    let mut src = CalibratedArray::from_data(ArrayData::from_u8(values));
    let display = display_data(&src).unwrap();
    let display_copy = display.clone();

    src.real_values_mut().unwrap().fill(0.0);
    assert_eq!(display.data(), display_copy.data());
    assert!(real(&src).iter().all(|&v| v == 0.0));
}

#[test_log::test]
fn display_rgba_with_1d_rgba() {
    let mut rng = StdRng::seed_from_u64(47);
    let channels = Array::from_shape_fn(IxDyn(&[32, 4]), |_| rng.gen::<u8>());
    let mut src = CalibratedArray::from_data(ArrayData::from_rgba_channels(channels).unwrap());
    let rgba = display_rgba(&src).unwrap();
    assert_eq!(rgba.data_shape(), vec![1, 32]);
    assert_eq!(rgba.element_kind(), ElementKind::Rgba);
    assert_eq!(
        rgba.data().as_rgba().unwrap().index_axis(Axis(0), 0),
        src.data().as_rgba().unwrap().view()
    );

    let before = rgba.clone();
    src.rgba_values_mut().unwrap().fill(rusty_xdata::Rgba::TRANSPARENT);
    assert_eq!(rgba, before);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test_log::test]
fn transforms_share_a_read_only_input_across_threads() {
    let mut rng = StdRng::seed_from_u64(53);
    let src = CalibratedArray::from_data(random_array(&mut rng, &[8, 8, 32]));
    let expected = sum(&src, &[2]).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| (sum(&src, &[2]).unwrap(), fft(&src).unwrap())))
            .collect();
        for handle in handles {
            let (summed, _) = handle.join().unwrap();
            assert_eq!(summed, expected);
        }
    });
}
