//! Form body encoding
//!
//! Nested form data and file descriptors flatten into bracketed field names
//! (`user[name]`, `tags[0]`) before encoding. Backends with a native multipart
//! builder use [`flatten`] and [`flatten_files`] directly; raw transports take
//! the complete body from [`encode`].

use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::{Configuration, EncodingType};
use crate::errors::{CourierError, Result};
use crate::message::{FileData, FileValue, FormData, FormValue, InternalRequest};

/// A request body ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// `None` when the caller supplied a raw body without a content type
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

fn child_key(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}[{}]", parent, child)
    }
}

/// Flatten nested form data into ordered `(name, value)` pairs
pub fn flatten(data: &FormData) -> Vec<(String, String)> {
    fn walk(key: String, value: &FormValue, out: &mut Vec<(String, String)>) {
        match value {
            FormValue::Text(text) => out.push((key, text.clone())),
            FormValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    walk(child_key(&key, &index.to_string()), item, out);
                }
            }
            FormValue::Map(map) => {
                for (name, item) in map {
                    walk(child_key(&key, name), item, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    for (name, value) in data {
        walk(name.clone(), value, &mut out);
    }
    out
}

/// Flatten nested file descriptors into ordered `(name, path)` pairs
pub fn flatten_files(files: &FileData) -> Vec<(String, PathBuf)> {
    fn walk(key: String, value: &FileValue, out: &mut Vec<(String, PathBuf)>) {
        match value {
            FileValue::Path(path) => out.push((key, path.clone())),
            FileValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    walk(child_key(&key, &index.to_string()), item, out);
                }
            }
            FileValue::Map(map) => {
                for (name, item) in map {
                    walk(child_key(&key, name), item, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    for (name, value) in files {
        walk(name.clone(), value, &mut out);
    }
    out
}

/// `application/x-www-form-urlencoded` serialization of `data`
pub fn urlencode(data: &FormData) -> Result<String> {
    serde_urlencoded::to_string(flatten(data))
        .map_err(|e| CourierError::InvalidRequest(format!("cannot url-encode form data: {}", e)))
}

/// File name sent for an upload
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "file".to_string())
}

/// MIME type guessed from the file extension
pub fn mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `multipart/form-data` body with the given boundary; files are read asynchronously
pub async fn multipart(data: &FormData, files: &FileData, boundary: &str) -> Result<Bytes> {
    let mut body = BytesMut::new();

    for (name, value) in flatten(data) {
        body.put_slice(format!("--{}\r\n", boundary).as_bytes());
        body.put_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.put_slice(value.as_bytes());
        body.put_slice(b"\r\n");
    }

    for (name, path) in flatten_files(files) {
        let contents = tokio::fs::read(&path).await?;
        body.put_slice(format!("--{}\r\n", boundary).as_bytes());
        body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name,
                file_name(&path)
            )
            .as_bytes(),
        );
        body.put_slice(format!("Content-Type: {}\r\n\r\n", mime_type(&path)).as_bytes());
        body.put_slice(&contents);
        body.put_slice(b"\r\n");
    }

    body.put_slice(format!("--{}--\r\n", boundary).as_bytes());
    Ok(body.freeze())
}

/// Complete body for `request`, or `None` when it carries no payload
pub async fn encode(request: &InternalRequest, config: &Configuration) -> Result<Option<EncodedBody>> {
    if let Some(body) = request.body() {
        return Ok(Some(EncodedBody {
            content_type: request.header("Content-Type").map(str::to_string),
            bytes: body.clone(),
        }));
    }

    if !request.has_data() && !request.has_files() {
        return Ok(None);
    }

    let encoding = config.effective_encoding(request);
    let bytes = match encoding {
        EncodingType::UrlEncoded => Bytes::from(urlencode(request.data())?),
        EncodingType::Multipart => multipart(request.data(), request.files(), config.boundary()).await?,
    };

    Ok(Some(EncodedBody {
        content_type: Some(encoding.content_type(config.boundary())),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use indexmap::IndexMap;
    use std::io::Write;

    fn nested() -> FormData {
        let mut user = IndexMap::new();
        user.insert("name".to_string(), FormValue::from("ann"));
        user.insert("role".to_string(), FormValue::from("admin"));

        let mut data = FormData::new();
        data.insert("q".into(), "a b".into());
        data.insert("user".into(), FormValue::Map(user));
        data.insert("tags".into(), FormValue::List(vec!["x".into(), "y".into()]));
        data
    }

    #[test]
    fn test_flatten_nested() {
        let pairs = flatten(&nested());
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["q", "user[name]", "user[role]", "tags[0]", "tags[1]"]);
    }

    #[test]
    fn test_urlencode() {
        let mut data = FormData::new();
        data.insert("foo".into(), "bar baz".into());
        data.insert("list".into(), FormValue::List(vec!["1".into()]));
        assert_eq!(urlencode(&data).unwrap(), "foo=bar+baz&list%5B0%5D=1");
    }

    #[test]
    fn test_flatten_files() {
        let mut files = FileData::new();
        files.insert(
            "docs".into(),
            FileValue::List(vec!["/tmp/a.txt".into(), "/tmp/b.png".into()]),
        );
        let pairs = flatten_files(&files);
        assert_eq!(pairs[0], ("docs[0]".to_string(), PathBuf::from("/tmp/a.txt")));
        assert_eq!(pairs[1].0, "docs[1]");
    }

    #[test]
    fn test_mime_and_file_name() {
        assert_eq!(mime_type(Path::new("/tmp/a.txt")), "text/plain");
        assert_eq!(mime_type(Path::new("/tmp/blob")), "application/octet-stream");
        assert_eq!(file_name(Path::new("/tmp/a.txt")), "a.txt");
    }

    #[tokio::test]
    async fn test_multipart_body() {
        let mut upload = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        upload.write_all(b"file contents").unwrap();

        let mut data = FormData::new();
        data.insert("field".into(), "value".into());
        let mut files = FileData::new();
        files.insert("upload".into(), FileValue::Path(upload.path().to_path_buf()));

        let body = multipart(&data, &files, "XYZ").await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"field\"\r\n\r\nvalue\r\n"));
        assert!(text.contains("name=\"upload\"; filename=\""));
        assert!(text.contains("Content-Type: text/plain\r\n\r\nfile contents\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let mut files = FileData::new();
        files.insert("upload".into(), "/definitely/not/here.txt".into());
        let err = multipart(&FormData::new(), &files, "XYZ").await.unwrap_err();
        assert!(matches!(err, CourierError::Io(_)));
    }

    #[tokio::test]
    async fn test_encode_picks_encoding() {
        let config = Configuration::default();

        let plain = InternalRequest::new("http://example.com", Method::Get);
        assert!(encode(&plain, &config).await.unwrap().is_none());

        let raw = InternalRequest::new("http://example.com", Method::Post)
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        let encoded = encode(&raw, &config).await.unwrap().unwrap();
        assert_eq!(encoded.content_type.as_deref(), Some("application/json"));
        assert_eq!(encoded.bytes, Bytes::from_static(b"{}"));

        let form = InternalRequest::new("http://example.com", Method::Post).with_data(nested());
        let encoded = encode(&form, &config).await.unwrap().unwrap();
        assert_eq!(
            encoded.content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert!(encoded.bytes.starts_with(b"q=a+b&user%5Bname%5D=ann"));
    }
}
