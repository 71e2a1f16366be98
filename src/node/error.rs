use thiserror::Error;

/// Reason a compression request was rejected or failed to serialize.
#[derive(Debug, Error)]
pub enum CompressError {
	/// The iteration budget was zero; refinement needs at least one.
	#[error("iteration budget must be positive")]
	InvalidConfiguration,
	#[error(transparent)]
	Encode(#[from] EncodeError),
}

/// Reason a quadtree could not be serialized into a QID payload.
#[derive(Debug, Error)]
pub enum EncodeError {
	/// Width or height does not fit the 32-bit header fields.
	#[error("image dimensions {width}x{height} exceed the 32-bit header fields")]
	DimensionOverflow { width: u64, height: u64 },
	/// The structure bitmap has more flags than its 32-bit count field
	/// can record.
	#[error("structure bitmap of {0} flags exceeds the 32-bit count field")]
	BitmapOverflow(usize),
	/// The outer compression stage failed.
	#[error("compression container: {0}")]
	Container(#[from] std::io::Error),
}

/// Reason a QID payload could not be decoded.
///
/// Every variant means the payload is malformed for this decoder; none
/// of them are retryable, and a failed decode leaves nothing behind.
#[derive(Debug, Error)]
pub enum DecodeError {
	/// The payload ended before the named field was complete.
	#[error("payload truncated while reading {0}")]
	Truncated(&'static str),
	/// Bytes were left over after the last expected leaf color.
	#[error("{0} trailing bytes after the last leaf color")]
	TrailingData(usize),
	/// The structure bitmap ran out while the tree still had nodes to
	/// describe.
	#[error("structure bitmap exhausted before the tree was complete")]
	FlagsExhausted,
	/// The color list ran out while leaves still needed colors.
	#[error("leaf colors exhausted before the tree was complete")]
	ColorsExhausted,
	/// A subdivision flag was set for a region too small to split.
	#[error("subdivision flag set for an unsplittable {0}x{1} region")]
	SplitBelowMinimum(u32, u32),
	/// The tree completed without consuming every flag and color.
	#[error("{flags} structure flags and {colors} colors left over after the tree was complete")]
	TrailingStructure { flags: usize, colors: usize },
	/// The outer compression container could not be read at all.
	#[error("corrupt compression container: {0}")]
	Container(#[from] std::io::Error),
}
