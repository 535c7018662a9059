/// Boundary separating the parts of the frame stream.
pub const BOUNDARY: &str = "frame";

/// Response content type of the frame stream.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/png\r\n\r\n";
const PART_TRAILER: &[u8] = b"\r\n\r\n";

/// Wraps PNG bytes as one part of the multipart stream.
pub fn frame_part(png: &[u8]) -> Vec<u8> {
    let mut part = Vec::with_capacity(PART_HEADER.len() + png.len() + PART_TRAILER.len());
    part.extend_from_slice(PART_HEADER);
    part.extend_from_slice(png);
    part.extend_from_slice(PART_TRAILER);
    part
}
