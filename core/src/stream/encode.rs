use crate::prelude::{EncodeError, Frame};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::borrow::Cow;

/// PNG-encodes a `(height, width, channels)` frame.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, EncodeError> {
    let (height, width, channels) = frame.dim();
    let color = match channels {
        1 => ExtendedColorType::L8,
        2 => ExtendedColorType::La8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        other => return Err(EncodeError::Channels(other)),
    };
    let width_px = u32::try_from(width).map_err(|_| EncodeError::Dimension(width))?;
    let height_px = u32::try_from(height).map_err(|_| EncodeError::Dimension(height))?;

    let samples: Cow<'_, [u8]> = match frame.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(frame.iter().copied().collect()),
    };

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&samples, width_px, height_px, color)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::placeholder_frame;
    use image::{GenericImageView, ImageFormat};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn rgb_frame_encodes_with_matching_dimensions() {
        let frame = Frame::from_shape_fn((4, 6, 3), |(r, c, ch)| (r * 40 + c * 10 + ch) as u8);
        let png = encode_png(&frame).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.to_rgb8().get_pixel(2, 1).0, [60, 61, 62]);
    }

    #[test]
    fn placeholder_encodes_as_grayscale() {
        let png = encode_png(&placeholder_frame()).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn unsupported_channel_counts_are_rejected() {
        let frame = Frame::zeros((2, 2, 5));
        assert!(matches!(encode_png(&frame), Err(EncodeError::Channels(5))));
    }
}
