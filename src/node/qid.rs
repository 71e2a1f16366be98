//! The QID binary layout and its outer lossless wrap.
//!
//! Payload, before the outer wrap (all integers little-endian):
//!
//! ```text
//! width      : u32
//! height     : u32
//! flag_count : u32
//! flag_bytes : ceil(flag_count / 8) bytes; bit i of byte b, counted
//!              from the least significant bit, is flag b * 8 + i
//! colors     : (r, g, b) u8 triple per unset flag, traversal order
//! ```
//!
//! The whole payload then passes through zlib. The wrap is generic and
//! swappable; only the inner layout is the format.

use std::convert::TryFrom;
use std::io::{Read, Write};

use bitvec::prelude::*;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::error::{DecodeError, EncodeError};
use super::Color;

/// Byte reader tracking its position, so truncation errors can name
/// the field that ran dry.
struct Reader<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	fn new(data: &'a [u8]) -> Reader<'a> {
		Reader { data, pos: 0 }
	}

	fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
		if self.data.len() - self.pos < len {
			return Err(DecodeError::Truncated(what));
		}
		let bytes = &self.data[self.pos..self.pos + len];
		self.pos += len;
		Ok(bytes)
	}

	fn read_u32(&mut self, what: &'static str) -> Result<u32, DecodeError> {
		let bytes = self.take(4, what)?;
		Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
	}

	fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}
}

/// Appends the count-prefixed packed bitmap for `flags`. Unused bits
/// of the final byte stay zero.
fn encode_bitset(flags: &[bool], out: &mut Vec<u8>) -> Result<(), EncodeError> {
	let count = u32::try_from(flags.len()).map_err(|_| EncodeError::BitmapOverflow(flags.len()))?;
	out.extend_from_slice(&count.to_le_bytes());
	let mut bits = BitVec::<u8, Lsb0>::with_capacity(flags.len());
	for &flag in flags {
		bits.push(flag);
	}
	out.extend_from_slice(bits.as_raw_slice());
	Ok(())
}

/// Reads back a bitmap written by `encode_bitset`. Bits past the count
/// are ignored.
fn decode_bitset(reader: &mut Reader) -> Result<Vec<bool>, DecodeError> {
	let count = reader.read_u32("bitmap count")? as usize;
	// Ceiling division without overflowing on a hostile count.
	let byte_count = count / 8 + (count % 8 > 0) as usize;
	let bytes = reader.take(byte_count, "structure bitmap")?;
	let bits = bytes.view_bits::<Lsb0>();
	let mut flags = Vec::with_capacity(count);
	for index in 0..count {
		flags.push(bits[index]);
	}
	Ok(flags)
}

fn deflate(payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
	let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), Compression::default());
	encoder.write_all(payload)?;
	Ok(encoder.finish()?)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
	let mut payload = Vec::new();
	ZlibDecoder::new(data).read_to_end(&mut payload)?;
	Ok(payload)
}

/// Serializes an extracted tree into a compressed QID artifact.
///
/// `flags` and `colors` must come from one pre-order extraction, so
/// that the color list holds exactly one entry per unset flag.
pub fn encode_image_data(
	width: usize,
	height: usize,
	flags: &[bool],
	colors: &[Color],
) -> Result<Vec<u8>, EncodeError> {
	let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
		(Ok(width), Ok(height)) => (width, height),
		_ => {
			return Err(EncodeError::DimensionOverflow {
				width: width as u64,
				height: height as u64,
			})
		}
	};
	let mut payload = Vec::with_capacity(12 + flags.len() / 8 + colors.len() * 3);
	payload.extend_from_slice(&width.to_le_bytes());
	payload.extend_from_slice(&height.to_le_bytes());
	encode_bitset(flags, &mut payload)?;
	for color in colors {
		payload.extend_from_slice(&color.0);
	}
	deflate(&payload)
}

/// Parses a compressed QID artifact back into its dimensions,
/// structure flags, and leaf colors, all in traversal order.
///
/// Exactly one color is read per unset flag; a payload with too few
/// color bytes, or with any bytes left over, is malformed.
pub fn decode_image_data(data: &[u8]) -> Result<(u32, u32, Vec<bool>, Vec<Color>), DecodeError> {
	let payload = inflate(data)?;
	let mut reader = Reader::new(&payload);
	let width = reader.read_u32("width")?;
	let height = reader.read_u32("height")?;
	let flags = decode_bitset(&mut reader)?;
	let leaf_count = flags.iter().filter(|&&flag| !flag).count();
	let mut colors = Vec::with_capacity(leaf_count);
	for _ in 0..leaf_count {
		let bytes = reader.take(3, "leaf colors")?;
		colors.push(image::Rgb([bytes[0], bytes[1], bytes[2]]));
	}
	if reader.remaining() != 0 {
		return Err(DecodeError::TrailingData(reader.remaining()));
	}
	Ok((width, height, flags, colors))
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgb;

	fn bitset_roundtrip(flags: &[bool]) -> Vec<bool> {
		let mut out = Vec::new();
		encode_bitset(flags, &mut out).unwrap();
		decode_bitset(&mut Reader::new(&out)).unwrap()
	}

	#[test]
	fn bitset_roundtrips_awkward_lengths() {
		for len in &[0usize, 1, 7, 8, 9, 13, 64] {
			let flags: Vec<bool> = (0..*len).map(|n| n % 3 == 0).collect();
			assert_eq!(bitset_roundtrip(&flags), flags, "length {}", len);
		}
	}

	#[test]
	fn bitset_packs_least_significant_bit_first() {
		let flags = [true, false, false, true, true, false, false, false, true];
		let mut out = Vec::new();
		encode_bitset(&flags, &mut out).unwrap();
		assert_eq!(out, vec![9, 0, 0, 0, 0b0001_1001, 0b0000_0001]);
	}

	#[test]
	fn bitset_decode_reports_missing_bytes() {
		// Count says 16 flags but only one byte follows.
		let data = [16, 0, 0, 0, 0xff];
		let result = decode_bitset(&mut Reader::new(&data));
		assert!(matches!(result, Err(DecodeError::Truncated("structure bitmap"))));
	}

	#[test]
	fn payload_roundtrips() {
		let flags = [true, false, false, false, false];
		let colors = [Rgb([1, 2, 3]), Rgb([4, 5, 6]), Rgb([7, 8, 9]), Rgb([10, 11, 12])];
		let data = encode_image_data(640, 480, &flags, &colors).unwrap();
		let (width, height, out_flags, out_colors) = decode_image_data(&data).unwrap();
		assert_eq!((width, height), (640, 480));
		assert_eq!(out_flags, flags);
		assert_eq!(out_colors, colors);
	}

	#[test]
	fn outer_wrap_inverts() {
		let payload = b"any bytes at all, compressible or not".to_vec();
		assert_eq!(inflate(&deflate(&payload).unwrap()).unwrap(), payload);
	}

	#[test]
	fn garbage_container_is_rejected() {
		let result = decode_image_data(b"definitely not zlib");
		assert!(matches!(result, Err(DecodeError::Container(_))));
	}

	#[test]
	fn missing_colors_are_reported() {
		// Two leaves declared, one color supplied.
		let mut payload = Vec::new();
		payload.extend_from_slice(&2u32.to_le_bytes());
		payload.extend_from_slice(&2u32.to_le_bytes());
		encode_bitset(&[false, false], &mut payload).unwrap();
		payload.extend_from_slice(&[1, 2, 3]);
		let result = decode_image_data(&deflate(&payload).unwrap());
		assert!(matches!(result, Err(DecodeError::Truncated("leaf colors"))));
	}

	#[test]
	fn trailing_bytes_are_reported() {
		let mut payload = Vec::new();
		payload.extend_from_slice(&1u32.to_le_bytes());
		payload.extend_from_slice(&1u32.to_le_bytes());
		encode_bitset(&[false], &mut payload).unwrap();
		payload.extend_from_slice(&[1, 2, 3]);
		payload.push(0xaa);
		let result = decode_image_data(&deflate(&payload).unwrap());
		assert!(matches!(result, Err(DecodeError::TrailingData(1))));
	}

	#[test]
	fn truncated_header_is_reported() {
		let result = decode_image_data(&deflate(&[1, 0, 0, 0, 1, 0]).unwrap());
		assert!(matches!(result, Err(DecodeError::Truncated("height"))));
	}

	#[cfg(target_pointer_width = "64")]
	#[test]
	fn oversized_dimensions_are_rejected() {
		let result = encode_image_data(1 << 33, 1, &[false], &[Rgb([0; 3])]);
		assert!(matches!(result, Err(EncodeError::DimensionOverflow { .. })));
	}
}
