use super::error::DecodeError;
use super::{Color, QuadNode, Rect};

/// Reconstruction-side quadtree node: pure structure and leaf colors,
/// rebuilt from a decoded payload.
pub type ReconstructNode = QuadNode<()>;

impl ReconstructNode {
	/// Rebuilds the subtree covering `rect` by consuming `flags` and
	/// `colors` from their tails.
	///
	/// Every node below one rebuild shares the same two stacks, so the
	/// caller must reverse both sequences from wire order first; popping
	/// then replays the encoder's pre-order traversal. One flag is
	/// consumed per node; a `true` flag recurses over the four quarters
	/// in fixed order, a `false` flag consumes one color.
	///
	/// Payloads whose flags outrun the stacks, or that ask to split a
	/// region with nothing left to halve, are rejected as malformed.
	pub fn rebuild(
		rect: Rect,
		flags: &mut Vec<bool>,
		colors: &mut Vec<Color>,
	) -> Result<ReconstructNode, DecodeError> {
		let mut node = QuadNode { rect, color: None, children: None, payload: () };
		let subdivided = flags.pop().ok_or(DecodeError::FlagsExhausted)?;
		if subdivided {
			let [bottom_left, bottom_right, top_left, top_right] = rect
				.quarters()
				.ok_or(DecodeError::SplitBelowMinimum(rect.w, rect.h))?;
			node.children = Some(Box::new([
				Self::rebuild(bottom_left, flags, colors)?,
				Self::rebuild(bottom_right, flags, colors)?,
				Self::rebuild(top_left, flags, colors)?,
				Self::rebuild(top_right, flags, colors)?,
			]));
		} else {
			node.color = Some(colors.pop().ok_or(DecodeError::ColorsExhausted)?);
		}
		Ok(node)
	}
}
