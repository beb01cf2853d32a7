//! Prometheus remote-write message types
//!
//! Only the fields the adapter consumes are modelled; prost skips the rest
//! (metadata, exemplars, histograms) when decoding.

use prost::Message;
use thiserror::Error;

/// Errors decoding a remote-write request body
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("snappy decode failed: {0}")]
    Snappy(#[from] snap::Error),

    #[error("protobuf decode failed: {0}")]
    Protobuf(#[from] prost::DecodeError),
}

#[derive(Clone, PartialEq, Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Sample {
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Milliseconds since the Unix epoch
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct TimeSeries {
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WriteRequest {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Sample {
    #[must_use]
    pub const fn new(value: f64, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

impl TimeSeries {
    /// Build a series from `(name, value)` label pairs
    pub fn new(labels: &[(&str, &str)], samples: Vec<Sample>) -> Self {
        Self {
            labels: labels
                .iter()
                .map(|(name, value)| Label::new(*name, *value))
                .collect(),
            samples,
        }
    }

    /// Value of the first label called `name`
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

/// Decode a snappy-compressed, protobuf-encoded write request
pub fn decode_write_request(body: &[u8]) -> Result<WriteRequest, DecodeError> {
    let raw = snap::raw::Decoder::new().decompress_vec(body)?;
    Ok(WriteRequest::decode(raw.as_slice())?)
}

/// Encode a write request the way Prometheus sends it
pub fn encode_write_request(request: &WriteRequest) -> Result<Vec<u8>, snap::Error> {
    let raw = request.encode_to_vec();
    snap::raw::Encoder::new().compress_vec(&raw)
}
