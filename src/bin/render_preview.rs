use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use rusty_xdata::transform::{display_rgba_image, fft, pick, slice_sum};
use rusty_xdata::{Calibration, CalibratedArray, DataDescriptor, DisplaySettings, MetadataValue};

/// Peak of height `amplitude` and standard deviation `sigma` centred on `center`.
fn peak(channel: f64, center: f64, sigma: f64, amplitude: f64) -> f64 {
    let z = (channel - center) / sigma;
    amplitude * (-0.5 * z * z).exp()
}

/// A 64×64 scan of 512-channel spectra. The peak position drifts across the
/// scan so the slice image shows structure.
fn synthesize_spectrum_image(rng: &mut StdRng) -> Result<CalibratedArray> {
    let (rows, cols, channels) = (64, 64, 512);
    let noise = Normal::new(0.0, 1.5).context("building noise distribution")?;
    let mut values = Array3::<f64>::zeros((rows, cols, channels));
    for ((y, x, c), v) in values.indexed_iter_mut() {
        let radius = ((y as f64 - 32.0).powi(2) + (x as f64 - 32.0).powi(2)).sqrt();
        let center = 256.0 + 2.0 * radius;
        let channel = c as f64;
        *v = peak(channel, center, 12.0, 100.0) + peak(channel, 80.0, 30.0, 40.0) + noise.sample(rng);
    }

    let xdata = CalibratedArray::new_with_data(
        values.into_dyn(),
        Calibration::with_units("counts"),
        vec![
            Calibration::new(0.0, 2.5, "nm"),
            Calibration::new(0.0, 2.5, "nm"),
            Calibration::new(100.0, 0.5, "eV"),
        ],
        DataDescriptor::new(false, 2, 1),
    )?;
    let mut metadata = rusty_xdata::Metadata::new();
    metadata.insert("source".into(), MetadataValue::String("synthetic".into()));
    Ok(xdata.with_metadata(metadata))
}

fn write_png(xdata: &CalibratedArray, settings: &DisplaySettings, path: &Path) -> Result<()> {
    let image = display_rgba_image(xdata, settings).with_context(|| format!("rendering {}", path.display()))?;
    image.save(path).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} ({}x{})", path.display(), image.width(), image.height());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let settings = match args.next() {
        Some(path) => DisplaySettings::load(Path::new(&path))?,
        None => DisplaySettings::default(),
    };
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);
    let spectrum_image = synthesize_spectrum_image(&mut rng)?;
    log::info!(
        "Synthesized {:?} with calibrations {:?}",
        spectrum_image.data_shape(),
        spectrum_image.dimensional_calibrations()
    );

    let slice = slice_sum(&spectrum_image, 256, 16)?;
    write_png(&slice, &settings, &out_dir.join("slice.png"))?;

    let spectrum = pick(&spectrum_image, &[0.5, 0.5])?;
    let brightest = spectrum
        .data()
        .real_part()
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let energy = spectrum.dimensional_calibrations()[0].convert_to_calibrated(brightest.0 as f64);
    log::info!("Center spectrum peaks at channel {} ({energy:.1} eV)", brightest.0);
    write_png(&spectrum, &settings, &out_dir.join("center_spectrum.png"))?;

    let spectrum_fft = fft(&slice)?;
    log::info!(
        "FFT calibrations: {}",
        spectrum_fft
            .dimensional_calibrations()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    write_png(&spectrum_fft, &settings, &out_dir.join("slice_fft.png"))?;

    println!("Wrote previews to {}", out_dir.display());
    Ok(())
}
