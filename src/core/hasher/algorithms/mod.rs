//! Hash variant implementations.

mod average;
mod gradient;
mod perceptual;

pub use average::AverageHasher;
pub use gradient::GradientHasher;
pub use perceptual::PerceptualHasher;

/// Pack a row-major bit sequence into bytes, most significant bit first.
///
/// A trailing partial byte is kept, zero-padded on the right.
pub(super) fn pack_bits(bits: impl IntoIterator<Item = bool>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut current_byte: u8 = 0;
    let mut bit_position = 0;

    for bit in bits {
        if bit {
            current_byte |= 1 << (7 - bit_position);
        }

        bit_position += 1;

        if bit_position == 8 {
            bytes.push(current_byte);
            current_byte = 0;
            bit_position = 0;
        }
    }

    if bit_position > 0 {
        bytes.push(current_byte);
    }

    bytes
}
