//! multipart/form-data encoding.
//!
//! Parts are emitted in insertion order, each framed by `--boundary` with a
//! `Content-Disposition: form-data` header, and the body is closed by
//! `--boundary--`. Generated boundaries embed a random UUID.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("facade.boundary.{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Append a plain named field.
    pub fn append(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            data: data.into(),
        });
        self
    }

    /// Append a file field with an explicit file name and media type.
    pub fn append_file(
        mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        });
        self
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(b"Content-Disposition: form-data; name=\"");
            out.extend_from_slice(escape_quoted(&part.name).as_bytes());
            out.extend_from_slice(b"\"");
            if let Some(file_name) = &part.file_name {
                out.extend_from_slice(b"; filename=\"");
                out.extend_from_slice(escape_quoted(file_name).as_bytes());
                out.extend_from_slice(b"\"");
            }
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(b"Content-Type: ");
                out.extend_from_slice(content_type.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        out
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal multipart reader: splits on the boundary delimiter and pulls
    /// the `name` parameter out of each part's headers.
    fn decode(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
        let delimiter = format!("\r\n--{boundary}").into_bytes();
        let mut framed = b"\r\n".to_vec();
        framed.extend_from_slice(body);

        let mut parts = Vec::new();
        for section in split(&framed, &delimiter).into_iter().skip(1) {
            if section.starts_with(b"--") {
                break;
            }
            let section = section.strip_prefix(b"\r\n").expect("CRLF after boundary");
            let split_at = find(section, b"\r\n\r\n").expect("header terminator");
            let head = std::str::from_utf8(&section[..split_at]).unwrap();
            let data = section[split_at + 4..].to_vec();
            let name = head
                .split("name=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap()
                .to_string();
            parts.push((name, data));
        }
        parts
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn split<'a>(mut haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
        let mut out = Vec::new();
        while let Some(pos) = find(haystack, needle) {
            out.push(&haystack[..pos]);
            haystack = &haystack[pos + needle.len()..];
        }
        out.push(haystack);
        out
    }

    #[test]
    fn two_named_parts_decode_back() {
        let form = MultipartForm::new().append("one", "o-n-e").append("two", "t-w-o");
        let parts = decode(&form.encode(), form.boundary());
        assert_eq!(
            parts,
            vec![
                ("one".to_string(), b"o-n-e".to_vec()),
                ("two".to_string(), b"t-w-o".to_vec()),
            ]
        );
    }

    #[test]
    fn encoding_is_byte_exact() {
        let form = MultipartForm::with_boundary("XyZ").append("one", "one");
        assert_eq!(
            form.encode(),
            b"--XyZ\r\nContent-Disposition: form-data; name=\"one\"\r\n\r\none\r\n--XyZ--\r\n".to_vec()
        );
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XyZ");
    }

    #[test]
    fn file_part_carries_filename_and_type() {
        let form = MultipartForm::with_boundary("b").append_file(
            "video",
            "clip.mp4",
            "video/mp4",
            [0u8, 1, 2],
        );
        let encoded = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(encoded
            .contains("name=\"video\"; filename=\"clip.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"));
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let form = MultipartForm::with_boundary("b").append("a\"b", "x");
        let encoded = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(encoded.contains("name=\"a\\\"b\""));
    }

    #[test]
    fn empty_form_is_just_the_closing_delimiter() {
        let form = MultipartForm::with_boundary("b");
        assert_eq!(form.encode(), b"--b--\r\n".to_vec());
    }

    #[test]
    fn generated_boundaries_differ() {
        assert_ne!(MultipartForm::new().boundary(), MultipartForm::new().boundary());
    }
}
