use image::error::ImageError;

use qid_img::error::{CompressError, EncodeError};
use qid_img::image::{compress_image_data, reconstruct_image_data};
use qid_img::metrics;

use std::fs::File;

use std::io::{Read, Write};

use std::path::Path;

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

/// `clap`-based CLI for working with QID files.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 5: computation limits exceeded
///
/// 10: other, potentially unknown error
fn main() {
	env_logger::init();
	let clap_matches = clap::App::new("qid_img")
		.version("0.1.0")
		.about("Converts to and from an adaptive-quadtree image compression format (QID).")
		.arg_from_usage("-c, --compress 'Convert the input file from PNG or JFIF to QID'")
		.arg_from_usage("-r, --reconstruct 'Convert the input file from QID to PNG'")
		.arg_from_usage("-n, --iterations=[N] 'Subdivision budget (--compress only); useful range 1000-50000; defaults to 20000'")
		.arg_from_usage("-t, --threshold=[N] 'Detail score at or below which a region stays one leaf (--compress only); defaults to 10'")
		.arg_from_usage("-b, --benchmark 'Print size and quality metrics after compressing (--compress only)'")
		.arg_from_usage("<INPUT> 'Path to input file'")
		.arg_from_usage("[OUTPUT] 'Path to output file; defaults to INPUT with a modified file extension'")
		.get_matches();

	let (compress, reconstruct) = (
		clap_matches.is_present("compress"),
		clap_matches.is_present("reconstruct"),
	);
	match (compress, reconstruct) {
		(true, true) => error_exit("Only one of -c/--compress and -r/--reconstruct must be present", 2),
		(true, false) => {
			let input_path = clap_matches.value_of("INPUT").unwrap();
			let source = match image::open(input_path) {
				Ok(i) => i,
				Err(e) => {
					let (msg, code) = match e {
						ImageError::Decoding(_) => ("Invalid image data", 4),
						ImageError::Limits(_) => ("Computation limits exceeded", 5),
						ImageError::IoError(_) => ("File not found or could not be read", 3),
						_ => ("An error occurred", 10)
					};
					error_exit(msg, code)
				}
			}.into_rgb();
			let (iterations, threshold) = (
				match clap_matches.value_of("iterations").unwrap_or("20000").parse::<u32>() {
					Ok(n) => n,
					Err(_) => error_exit("Non-numeric value for iterations", 2)
				},
				match clap_matches.value_of("threshold").unwrap_or("10").parse::<f64>() {
					Ok(n) if n >= 0.0 => n,
					_ => error_exit("Invalid value for threshold", 2)
				}
			);
			let qid_data = match compress_image_data(&source, iterations, threshold) {
				Ok(data) => data,
				Err(CompressError::InvalidConfiguration) =>
					error_exit("Iteration budget must be positive", 2),
				Err(CompressError::Encode(EncodeError::DimensionOverflow { .. })) |
				Err(CompressError::Encode(EncodeError::BitmapOverflow(_))) =>
					error_exit("Computation limits exceeded", 5),
				Err(_) => error_exit("An error occurred", 10)
			};
			let output_path = clap_matches.value_of("OUTPUT")
				.map(str::to_string)
				.unwrap_or_else(|| input_path.rsplitn(2, '.').last().unwrap().to_string() + ".qid");
			let mut out_fh = match File::create(&output_path) {
				Ok(f) => f,
				Err(_) => error_exit("Could not open output file", 3)
			};
			match out_fh.write_all(&qid_data) {
				Ok(_) => (),
				Err(_) => error_exit("Could not write to output file", 3)
			}
			if clap_matches.is_present("benchmark") {
				let restored = match reconstruct_image_data(&qid_data) {
					Ok(i) => i,
					Err(_) => error_exit("An error occurred", 10)
				};
				let original_size = std::fs::metadata(input_path)
					.map(|m| m.len())
					.unwrap_or(0);
				let report = metrics::benchmark(
					&source,
					original_size,
					qid_data.len() as u64,
					&restored,
				);
				let name = Path::new(input_path).file_name()
					.map(|n| n.to_string_lossy().into_owned())
					.unwrap_or_else(|| input_path.to_string());
				println!("Image: {}", name);
				println!("Original size: {} bytes", report.original_size);
				println!("Compressed size: {} bytes", report.compressed_size);
				println!("Size reduced: {} bytes", report.size_reduction());
				println!("Size reduction: {:.2}%", report.size_reduction_percent());
				println!("RMSE: {:.2}", report.rmse);
				println!("Similarity: {:.4}", report.similarity);
				println!("Histogram entropy: {:.2} bits", report.entropy);
			}
		},
		(false, true) => {
			let input_path = clap_matches.value_of("INPUT").unwrap();
			let mut source_data = Vec::new();
			let mut source_fh = match File::open(input_path) {
				Ok(f) => f,
				Err(_) => error_exit("File not found or could not be read", 3)
			};
			match source_fh.read_to_end(&mut source_data) {
				Ok(_) => (),
				Err(_) => error_exit("Could not read from input file", 3)
			}
			let output = match reconstruct_image_data(&source_data) {
				Ok(i) => i,
				// Every decode failure means the payload is malformed.
				Err(_) => error_exit("Invalid image data", 4)
			};
			match output.save(clap_matches.value_of("OUTPUT")
				.unwrap_or(&(input_path.rsplitn(2, '.').last().unwrap().to_string() + ".png"))) {
				Ok(_) => (),
				Err(_) => error_exit("Could not save output", 3)
			}
		},
		(false, false) => error_exit("One of -c/--compress and -r/--reconstruct must be present", 2)
	}
}
