//! multipart/alternative body assembly

use std::fmt::Write;

use rand::Rng;

/// Tag prefixing every generated boundary
const BOUNDARY_TAG: &str = "bnd_";

/// Create a random MIME boundary.
///
/// 16 bytes from a cryptographically secure generator, rendered as
/// hex. Collision with body text is accepted as astronomically
/// unlikely rather than scanned for.
pub(crate) fn make_boundary() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    let mut boundary = String::with_capacity(BOUNDARY_TAG.len() + bytes.len() * 2);
    boundary.push_str(BOUNDARY_TAG);
    for byte in bytes {
        let _ = write!(boundary, "{byte:02x}");
    }
    boundary
}

/// Assembles the two-part alternative body: plain text first, HTML
/// second, closed by the terminal boundary marker.
pub(crate) fn multipart_alternative(boundary: &str, text: &str, html: &str) -> String {
    let mut body = String::with_capacity(text.len() + html.len() + 200);
    let _ = write!(
        body,
        "--{boundary}\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n{text}\r\n"
    );
    let _ = write!(
        body,
        "--{boundary}\r\nContent-Type: text/html; charset=UTF-8\r\n\r\n{html}\r\n"
    );
    let _ = write!(body, "--{boundary}--\r\n");
    body
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::{make_boundary, multipart_alternative};

    #[test]
    fn boundaries_do_not_collide() {
        let mut boundaries = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            boundaries.insert(make_boundary());
        }

        assert_eq!(10_000, boundaries.len());

        for boundary in boundaries {
            assert!(boundary.starts_with("bnd_"));
            assert_eq!(boundary.len(), 4 + 32);
            assert!(boundary[4..].bytes().all(|b| b.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn boundary_never_appears_in_a_body_corpus() {
        let corpus = [
            "hello world",
            "Name: Jane\nEmail: jane@example.org\nMessage: --bnd_ is not a boundary",
            "<p>multi\r\nline\r\nhtml</p>",
            "bnd_0000000000000000000000000000000e",
        ];

        for _ in 0..100 {
            let boundary = make_boundary();
            for body in corpus {
                assert!(!body.lines().any(|line| line == boundary));
            }
        }
    }

    #[test]
    fn two_parts_under_one_boundary() {
        let body = multipart_alternative("bnd_test", "hello", "<p>hi</p>");

        assert_eq!(
            body,
            concat!(
                "--bnd_test\r\n",
                "Content-Type: text/plain; charset=UTF-8\r\n",
                "\r\n",
                "hello\r\n",
                "--bnd_test\r\n",
                "Content-Type: text/html; charset=UTF-8\r\n",
                "\r\n",
                "<p>hi</p>\r\n",
                "--bnd_test--\r\n",
            )
        );
    }
}
