use image::RgbImage;
use log::{debug, info};

use super::error::{CompressError, DecodeError};
use super::qid;
use super::rebuild::ReconstructNode;
use super::refine::Compressor;
use super::Rect;

/// Compresses a pixel buffer into a QID artifact.
///
/// `iterations` bounds how many subdivisions refinement may spend
/// (20 000 is a reasonable default, 1 000 to 50 000 the useful range)
/// and must be at least one; `detail_threshold` is the detail score at
/// or below which a region is left as a single leaf.
pub fn compress_image_data(
	source: &RgbImage,
	iterations: u32,
	detail_threshold: f64,
) -> Result<Vec<u8>, CompressError> {
	if iterations == 0 {
		return Err(CompressError::InvalidConfiguration);
	}
	let mut compressor = Compressor::new(source);
	compressor.refine(iterations, detail_threshold);
	let (flags, colors) = compressor.extract();
	let data = qid::encode_image_data(
		source.width() as usize,
		source.height() as usize,
		&flags,
		&colors,
	)?;
	info!(
		"compressed {}x{} into {} leaves, {} bytes",
		source.width(),
		source.height(),
		colors.len(),
		data.len()
	);
	Ok(data)
}

/// Rebuilds the quadtree described by a QID artifact.
///
/// The codec hands back both sequences in traversal order; rebuilding
/// consumes them from the tail, so both are reversed here first. A
/// payload whose tree does not consume both sequences exactly is
/// malformed.
pub fn reconstruct_quadtree(data: &[u8]) -> Result<ReconstructNode, DecodeError> {
	let (width, height, mut flags, mut colors) = qid::decode_image_data(data)?;
	flags.reverse();
	colors.reverse();
	let root = ReconstructNode::rebuild(Rect::new(0, 0, width, height), &mut flags, &mut colors)?;
	if !flags.is_empty() || !colors.is_empty() {
		return Err(DecodeError::TrailingStructure {
			flags: flags.len(),
			colors: colors.len(),
		});
	}
	debug!("rebuilt {}x{} quadtree", width, height);
	Ok(root)
}

/// Decodes a QID artifact into a pixel buffer of the encoded
/// dimensions.
pub fn reconstruct_image_data(data: &[u8]) -> Result<RgbImage, DecodeError> {
	let root = reconstruct_quadtree(data)?;
	let mut canvas = RgbImage::new(root.rect.w, root.rect.h);
	root.render(&mut canvas);
	Ok(canvas)
}
