//! Body compression middleware.
//!
//! [`CompressionHandler`] gzips outgoing request bodies.
//! [`DecompressionHandler`] advertises `Accept-Encoding` and decodes responses
//! compressed with gzip, deflate, br (brotli) or zstd.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::StatusCode;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, HeaderValue};

use crate::{BoxFuture, Error, HandlerOption, Interceptor, Next, Request, Response, Result};

/// Encodings the [`DecompressionHandler`] can decode.
pub const ACCEPTED_ENCODINGS: &str = "gzip, deflate, br, zstd";

/// Options for [`CompressionHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    enabled: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CompressionOptions {
    /// Enable or disable request body compression.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns `true` if request bodies are compressed.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl HandlerOption for CompressionOptions {}

/// Gzips request bodies.
///
/// A server answering `415 Unsupported Media Type` to the compressed request
/// gets the uncompressed one once.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionHandler {
    options: CompressionOptions,
}

impl CompressionHandler {
    /// Create a compression handler; `None` uses [`CompressionOptions::default`].
    #[must_use]
    pub fn new(options: Option<CompressionOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// The options resolved at construction.
    #[must_use]
    pub const fn options(&self) -> CompressionOptions {
        self.options
    }
}

fn gzip(body: &[u8]) -> Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(body)
        .map_err(|e| Error::compression(format!("gzip compression failed: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::compression(format!("gzip compression failed: {e}")))?;
    Ok(Bytes::from(compressed))
}

impl Interceptor for CompressionHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let options = CompressionOptions::resolve(&self.options, &request);
        let already_encoded = request.headers().contains_key(CONTENT_ENCODING);
        let body = request.body().filter(|body| !body.is_empty()).cloned();

        let (true, false, Some(body)) = (options.enabled, already_encoded, body) else {
            return next.run(request);
        };

        Box::pin(async move {
            let mut compressed = request.clone();
            let encoded = gzip(&body)?;
            compressed.headers_mut().insert(
                CONTENT_ENCODING,
                HeaderValue::from_static("gzip"),
            );
            compressed
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(encoded.len()));
            compressed.set_body(Some(encoded));

            let response = next.clone().run(compressed).await?;
            if response.status() != StatusCode::UNSUPPORTED_MEDIA_TYPE {
                return Ok(response);
            }

            tracing::debug!("server rejected gzip body, sending it uncompressed");
            next.run(request).await
        })
    }

    fn name(&self) -> &'static str {
        "compression"
    }
}

/// Decodes compressed responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecompressionHandler;

impl DecompressionHandler {
    /// Create a new decompression handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn read_all(mut reader: impl Read, encoding: &str) -> Result<Bytes> {
    let mut decompressed = Vec::new();
    reader
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::compression(format!("{encoding} decompression failed: {e}")))?;
    Ok(Bytes::from(decompressed))
}

/// Decode a body sent with the given `Content-Encoding` value.
///
/// Returns `None` for an unknown coding or a list of stacked codings: the
/// body is then left as the server sent it.
fn decompress(encoding: &str, body: Bytes) -> Result<Option<Bytes>> {
    let decoded = match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => read_all(flate2::read::GzDecoder::new(body.as_ref()), "gzip")?,
        "deflate" => read_all(flate2::read::ZlibDecoder::new(body.as_ref()), "deflate")?,
        "br" => read_all(brotli::Decompressor::new(body.as_ref(), 4096), "brotli")?,
        "zstd" => zstd::decode_all(body.as_ref())
            .map(Bytes::from)
            .map_err(|e| Error::compression(format!("zstd decompression failed: {e}")))?,
        "identity" => body,
        _ => return Ok(None),
    };
    Ok(Some(decoded))
}

impl Interceptor for DecompressionHandler {
    fn process<'a>(
        &'a self,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Response>> {
        if !request.headers().contains_key(ACCEPT_ENCODING) {
            request
                .headers_mut()
                .insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPTED_ENCODINGS));
        }

        Box::pin(async move {
            let mut response = next.run(request).await?;

            let Some(encoding) = response.header(CONTENT_ENCODING.as_str()).map(str::to_owned)
            else {
                return Ok(response);
            };
            if encoding.trim().is_empty() || encoding.trim().eq_ignore_ascii_case("identity") {
                return Ok(response);
            }

            let Some(decompressed) = decompress(&encoding, response.body().clone())? else {
                tracing::debug!(%encoding, "unsupported content encoding, body left as is");
                return Ok(response);
            };

            // The body is no longer encoded
            response.headers_mut().remove(CONTENT_ENCODING);
            response
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(decompressed.len()));
            response.set_body(decompressed);

            Ok(response)
        })
    }

    fn name(&self) -> &'static str {
        "decompression"
    }
}
