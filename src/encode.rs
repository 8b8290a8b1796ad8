//! Multipart JPEG chunk encoding.

use bytes::{BufMut, Bytes, BytesMut};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::Result;
use crate::frame::Frame;

/// Multipart boundary used by the `/image` stream.
pub const BOUNDARY: &str = "frame";

/// Content type of the `/image` response.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const CHUNK_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
const CHUNK_TRAILER: &[u8] = b"\r\n";

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 80;

/// Encodes a frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    frame.validate()?;
    let rgb = frame.to_rgb();

    let mut out = Vec::with_capacity(rgb.len() / 8);
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        &rgb,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Encodes a frame as one self-delimited `multipart/x-mixed-replace` chunk.
pub fn encode_multipart_chunk(frame: &Frame, quality: u8) -> Result<Bytes> {
    let jpeg = encode_jpeg(frame, quality)?;

    let mut chunk = BytesMut::with_capacity(CHUNK_HEADER.len() + jpeg.len() + CHUNK_TRAILER.len());
    chunk.put_slice(CHUNK_HEADER);
    chunk.put_slice(&jpeg);
    chunk.put_slice(CHUNK_TRAILER);
    Ok(chunk.freeze())
}
