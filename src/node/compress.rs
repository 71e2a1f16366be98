use image::RgbImage;

use super::{Color, QuadNode, Rect};

/// Compression-side quadtree node: carries a view into the source
/// pixels and an eagerly computed detail score.
pub type CompressNode<'a> = QuadNode<Analysis<'a>>;

/// Payload of a [`CompressNode`].
///
/// The region view is present from construction until the node
/// subdivides, at which point the four children own the four quarter
/// views and the parent's own view is released. This keeps pixel-data
/// residency at one image's worth, spread over the current leaves.
#[derive(Debug)]
pub struct Analysis<'a> {
	region: Option<Region<'a>>,
	/// Detail score: the sum of the per-channel standard deviations
	/// over the region, weighted by the region's element count
	/// (width x height x 3). Large noisy regions score highest.
	pub detail: f64,
}

/// A rectangle-scoped read-only view into a source image.
#[derive(Debug)]
struct Region<'a> {
	source: &'a RgbImage,
	rect: Rect,
}

impl<'a> Region<'a> {
	/// One pass over the region computing its mean color (per-channel,
	/// truncated to u8) and its detail score. An empty region scores
	/// zero detail and reads as black.
	fn stats(&self) -> (Color, f64) {
		let count = self.rect.w as f64 * self.rect.h as f64;
		if count == 0.0 {
			return (image::Rgb([0, 0, 0]), 0.0);
		}
		let mut sums = [0.0f64; 3];
		let mut square_sums = [0.0f64; 3];
		for y in self.rect.y..self.rect.y + self.rect.h {
			for x in self.rect.x..self.rect.x + self.rect.w {
				let pixel = self.source.get_pixel(x, y);
				for channel in 0..3 {
					let value = pixel.0[channel] as f64;
					sums[channel] += value;
					square_sums[channel] += value * value;
				}
			}
		}
		let mut color = [0u8; 3];
		let mut spread = 0.0;
		for channel in 0..3 {
			let mean = sums[channel] / count;
			// Population variance; clamp the rounding residue so the
			// square root stays real.
			let variance = (square_sums[channel] / count - mean * mean).max(0.0);
			spread += variance.sqrt();
			color[channel] = mean as u8;
		}
		(image::Rgb(color), spread * count * 3.0)
	}
}

impl<'a> CompressNode<'a> {
	/// Builds a leaf over `rect`, sampling `source` for its mean color
	/// and detail score.
	pub fn from_region(source: &'a RgbImage, rect: Rect) -> CompressNode<'a> {
		let region = Region { source, rect };
		let (color, detail) = region.stats();
		QuadNode {
			rect,
			color: Some(color),
			children: None,
			payload: Analysis { region: Some(region), detail },
		}
	}

	/// Subdivides this node, handing each child its quarter of the
	/// pixel region and releasing this node's own view.
	///
	/// Returns the new children, or an empty slice when the node is
	/// already subdivided, has already released its view, or covers a
	/// rectangle too small to split.
	pub fn split(&mut self) -> &mut [CompressNode<'a>] {
		let source = match self.payload.region {
			Some(ref region) => region.source,
			None => return &mut [],
		};
		let fresh = !self
			.subdivide_with(|rect| CompressNode::from_region(source, rect))
			.is_empty();
		if fresh {
			self.payload.region = None;
		}
		match self.children {
			Some(ref mut children) if fresh => &mut children[..],
			_ => &mut [],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn checkerboard() -> RgbImage {
		RgbImage::from_raw(2, 2, vec![
			255, 255, 255, 0, 0, 0,
			0, 0, 0, 255, 255, 255,
		]).unwrap()
	}

	#[test]
	fn detail_weighs_spread_by_element_count() {
		let source = checkerboard();
		let node = CompressNode::from_region(&source, Rect::new(0, 0, 2, 2));
		// Each channel holds [255, 0, 0, 255]: std-dev 127.5, summed
		// over three channels and weighted by the 12 samples.
		assert_eq!(node.payload.detail, 4590.0);
		assert_eq!(node.color, Some(image::Rgb([127, 127, 127])));
	}

	#[test]
	fn detail_is_zero_for_uniform_region() {
		let source = RgbImage::from_pixel(4, 4, image::Rgb([42, 13, 200]));
		let node = CompressNode::from_region(&source, Rect::new(0, 0, 4, 4));
		assert_eq!(node.payload.detail, 0.0);
		assert_eq!(node.color, Some(image::Rgb([42, 13, 200])));
	}

	#[test]
	fn mean_color_truncates() {
		let source = RgbImage::from_raw(2, 1, vec![10, 0, 0, 11, 0, 0]).unwrap();
		let node = CompressNode::from_region(&source, Rect::new(0, 0, 2, 1));
		// 10.5 truncates to 10, as the original system's uint8 cast did.
		assert_eq!(node.color, Some(image::Rgb([10, 0, 0])));
	}

	#[test]
	fn empty_region_reads_as_black_with_zero_detail() {
		let source = RgbImage::new(0, 0);
		let node = CompressNode::from_region(&source, Rect::new(0, 0, 0, 0));
		assert_eq!(node.payload.detail, 0.0);
		assert_eq!(node.color, Some(image::Rgb([0, 0, 0])));
	}

	#[test]
	fn split_hands_each_child_its_own_pixel() {
		let source = checkerboard();
		let mut root = CompressNode::from_region(&source, Rect::new(0, 0, 2, 2));
		let children = root.split();
		assert_eq!(children.len(), 4);
		let expected = [
			image::Rgb([255, 255, 255]),
			image::Rgb([0, 0, 0]),
			image::Rgb([0, 0, 0]),
			image::Rgb([255, 255, 255]),
		];
		for (child, expected) in children.iter().zip(expected.iter()) {
			assert_eq!(child.color.as_ref(), Some(expected));
			assert_eq!(child.payload.detail, 0.0);
		}
	}

	#[test]
	fn split_releases_the_parent_view() {
		let source = checkerboard();
		let mut root = CompressNode::from_region(&source, Rect::new(0, 0, 2, 2));
		assert!(root.payload.region.is_some());
		root.split();
		assert!(root.payload.region.is_none());
		// A second split is a no-op, not a rebuild.
		assert_eq!(root.split().len(), 0);
	}

	#[test]
	fn split_refuses_single_pixel_node() {
		let source = checkerboard();
		let mut node = CompressNode::from_region(&source, Rect::new(0, 0, 1, 1));
		assert_eq!(node.split().len(), 0);
		assert!(!node.is_subdivided());
		// The view stays with the leaf.
		assert!(node.payload.region.is_some());
	}
}
