use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::RgbImage;
use log::debug;

use super::compress::CompressNode;
use super::{Color, Rect};

/// A frontier entry: one current leaf still eligible for subdivision,
/// addressed by its quadrant path from the root.
#[derive(Debug)]
struct Candidate {
	detail: f64,
	path: Vec<u8>,
}

// Max-heap ordering on the detail score. Ties go to the candidate
// earlier in pre-order, so refinement stays deterministic.
impl PartialEq for Candidate {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Candidate {
	fn cmp(&self, other: &Self) -> Ordering {
		self.detail
			.total_cmp(&other.detail)
			.then_with(|| other.path.cmp(&self.path))
	}
}

/// Walks `path` down from the root. Frontier paths only ever lead
/// through nodes that were subdivided when the path was recorded, and
/// the tree never sheds children, so the walk cannot miss.
fn descend<'t, 'a>(
	mut node: &'t mut CompressNode<'a>,
	path: &[u8],
) -> &'t mut CompressNode<'a> {
	for &quadrant in path {
		node = &mut node.children.as_mut().unwrap()[quadrant as usize];
	}
	node
}

/// Greedy quadtree refinement over one source image.
///
/// Owns the compression-side tree and a max-first frontier of leaves
/// keyed by detail score. Each instance serves a single compression
/// call: build it, refine it, extract the flattened tree, drop it.
pub struct Compressor<'a> {
	root: CompressNode<'a>,
	frontier: BinaryHeap<Candidate>,
	width: u32,
	height: u32,
}

impl<'a> Compressor<'a> {
	/// Builds the single-leaf tree covering `source` and seeds the
	/// frontier with it.
	pub fn new(source: &'a RgbImage) -> Compressor<'a> {
		let (width, height) = (source.width(), source.height());
		let root = CompressNode::from_region(source, Rect::new(0, 0, width, height));
		let mut frontier = BinaryHeap::new();
		frontier.push(Candidate { detail: root.payload.detail, path: Vec::new() });
		Compressor { root, frontier, width, height }
	}

	/// Spends up to `max_iterations` subdivisions, always on the
	/// pending region with the highest detail score.
	///
	/// Regions scoring at or below `detail_threshold` are never split:
	/// children are filtered when they are produced, and a popped
	/// candidate at or below the threshold (the root of a near-uniform
	/// image, or survivors of an earlier call with a lower threshold)
	/// is retired as a permanent leaf. Either way the pop consumes its
	/// iteration, as does popping a region that turns out to be too
	/// small to split; the loop always terminates because each pop
	/// shrinks the frontier or the budget.
	pub fn refine(&mut self, max_iterations: u32, detail_threshold: f64) {
		let mut spent = 0u32;
		for _ in 0..max_iterations {
			let candidate = match self.frontier.pop() {
				Some(candidate) => candidate,
				None => break,
			};
			spent += 1;
			if candidate.detail <= detail_threshold {
				continue;
			}
			let node = descend(&mut self.root, &candidate.path);
			for (quadrant, child) in node.split().iter().enumerate() {
				if child.payload.detail > detail_threshold {
					let mut path = candidate.path.clone();
					path.push(quadrant as u8);
					self.frontier.push(Candidate { detail: child.payload.detail, path });
				}
			}
		}
		debug!(
			"refinement spent {} of {} iterations, {} candidates left",
			spent,
			max_iterations,
			self.frontier.len()
		);
	}

	/// Flattens the tree depth-first pre-order into parallel structure
	/// flags and leaf colors, ready for the codec.
	pub fn extract(&self) -> (Vec<bool>, Vec<Color>) {
		let mut flags = Vec::new();
		let mut colors = Vec::new();
		self.root.extract(&mut flags, &mut colors);
		(flags, colors)
	}

	/// Renders the current tree into a fresh canvas, for previews and
	/// quality measurements without an encode/decode round trip.
	pub fn draw(&self) -> RgbImage {
		let mut canvas = RgbImage::new(self.width, self.height);
		self.root.render(&mut canvas);
		canvas
	}

	pub fn root(&self) -> &CompressNode<'a> {
		&self.root
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}
}
