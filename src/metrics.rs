//! Quality and size measurements for judging compression runs. None of
//! this participates in encode/decode correctness; it only reports.

use image::RgbImage;

/// Mean squared error between two images of the same dimensions,
/// averaged over every channel sample.
pub fn mean_squared_error(a: &RgbImage, b: &RgbImage) -> f64 {
	let mut total = 0.0;
	let mut samples = 0u64;
	for (pixel_a, pixel_b) in a.pixels().zip(b.pixels()) {
		for channel in 0..3 {
			let diff = pixel_a.0[channel] as f64 - pixel_b.0[channel] as f64;
			total += diff * diff;
			samples += 1;
		}
	}
	if samples == 0 {
		return 0.0;
	}
	total / samples as f64
}

pub fn root_mean_squared_error(a: &RgbImage, b: &RgbImage) -> f64 {
	mean_squared_error(a, b).sqrt()
}

/// Mean absolute error between two images of the same dimensions.
pub fn mean_average_error(a: &RgbImage, b: &RgbImage) -> f64 {
	let mut total = 0.0;
	let mut samples = 0u64;
	for (pixel_a, pixel_b) in a.pixels().zip(b.pixels()) {
		for channel in 0..3 {
			total += (pixel_a.0[channel] as f64 - pixel_b.0[channel] as f64).abs();
			samples += 1;
		}
	}
	if samples == 0 {
		return 0.0;
	}
	total / samples as f64
}

/// Similarity on a 0 to 1 scale: 1 minus the mean absolute error as a
/// fraction of the sample range.
pub fn image_similarity(a: &RgbImage, b: &RgbImage) -> f64 {
	1.0 - mean_average_error(a, b) / 255.0
}

/// Shannon entropy of one channel's value histogram, in bits.
fn channel_entropy(histogram: &[u64; 256], total: u64) -> f64 {
	let mut entropy = 0.0;
	for &count in histogram.iter() {
		if count == 0 {
			continue;
		}
		let p = count as f64 / total as f64;
		entropy -= p * p.log2();
	}
	entropy
}

/// Mean of the per-channel histogram entropies, in bits. A uniform
/// image scores zero; heavily textured images approach eight.
pub fn histogram_entropy(image: &RgbImage) -> f64 {
	let total = image.width() as u64 * image.height() as u64;
	if total == 0 {
		return 0.0;
	}
	let mut histograms = [[0u64; 256]; 3];
	for pixel in image.pixels() {
		for channel in 0..3 {
			histograms[channel][pixel.0[channel] as usize] += 1;
		}
	}
	histograms.iter().map(|h| channel_entropy(h, total)).sum::<f64>() / 3.0
}

/// Everything a benchmark run reports about one compressed image.
#[derive(Debug)]
pub struct BenchmarkReport {
	pub original_size: u64,
	pub compressed_size: u64,
	pub rmse: f64,
	pub similarity: f64,
	pub entropy: f64,
}

impl BenchmarkReport {
	pub fn size_reduction(&self) -> i64 {
		self.original_size as i64 - self.compressed_size as i64
	}

	pub fn size_reduction_percent(&self) -> f64 {
		if self.original_size == 0 {
			return 0.0;
		}
		self.size_reduction() as f64 / self.original_size as f64 * 100.0
	}
}

/// Compares a source image against its reconstruction and the sizes on
/// either side of the codec.
pub fn benchmark(
	original: &RgbImage,
	original_size: u64,
	compressed_size: u64,
	reconstructed: &RgbImage,
) -> BenchmarkReport {
	BenchmarkReport {
		original_size,
		compressed_size,
		rmse: root_mean_squared_error(original, reconstructed),
		similarity: image_similarity(original, reconstructed),
		entropy: histogram_entropy(original),
	}
}
