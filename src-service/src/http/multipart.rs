//! Multipart MJPEG wire format.
//!
//! Browsers render `multipart/x-mixed-replace` by replacing the displayed
//! image with each arriving part, which is what turns a part-per-frame
//! stream into live video in an `<img>` tag. The byte layout here is a
//! compatibility contract with that behavior.

use bytes::{BufMut, Bytes, BytesMut};

/// Boundary token separating frames in the multipart stream.
pub const BOUNDARY: &str = "FRAME";

/// `Content-Type` of the streaming response.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=FRAME";

/// Response headers for the stream endpoint.
///
/// Every caching and buffering layer between the camera and the viewer has
/// to be switched off or frames arrive late and in bursts.
pub const STREAM_HEADERS: [(&str, &str); 6] = [
    ("Content-Type", CONTENT_TYPE),
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
    ("Connection", "close"),
    ("X-Accel-Buffering", "no"),
];

/// Encode one JPEG frame as a multipart part.
///
/// Layout: boundary line, part headers, blank line, payload, trailing CRLF.
/// The part is assembled into a single buffer so each frame reaches the
/// socket as one write.
pub fn encode_part(frame: &[u8]) -> Bytes {
    let header = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        frame.len()
    );

    let mut part = BytesMut::with_capacity(header.len() + frame.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(frame);
    part.put_slice(b"\r\n");
    part.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test the exact part layout; viewers parse these bytes literally.
    #[test]
    fn part_bytes_are_exact() {
        let frame = [0xFF, 0xD8, 0xAB, 0xFF, 0xD9];
        let part = encode_part(&frame);

        let mut expected =
            b"--FRAME\r\nContent-Type: image/jpeg\r\nContent-Length: 5\r\n\r\n".to_vec();
        expected.extend_from_slice(&frame);
        expected.extend_from_slice(b"\r\n");

        assert_eq!(&part[..], &expected[..]);
    }

    /// Test that the declared length always matches the payload, including
    /// the empty payload.
    #[test]
    fn content_length_matches_payload() {
        for len in [0usize, 1, 17, 4096] {
            let frame = vec![0x5A; len];
            let part = encode_part(&frame);
            let text = String::from_utf8_lossy(&part[..part.len() - len - 2]);
            assert!(
                text.contains(&format!("Content-Length: {len}\r\n")),
                "part header for len {len}: {text}"
            );
        }
    }

    /// Test that a payload containing the boundary text is carried verbatim;
    /// `Content-Length` framing makes the payload opaque.
    #[test]
    fn boundary_text_in_payload_is_not_escaped() {
        let frame = b"--FRAME inside payload";
        let part = encode_part(frame);
        let needle = b"\r\n\r\n--FRAME inside payload\r\n";
        assert!(part
            .windows(needle.len())
            .any(|window| window == needle));
    }
}
