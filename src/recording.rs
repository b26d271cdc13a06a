use chrono::{DateTime, Utc};

use crate::error::{TtyreelError, TtyreelResult};

/// One timestamped unit of recorded terminal output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    /// Decoded text, ready to hand to a terminal surface.
    pub payload: String,
    /// Seconds since the recording's time origin. The first chunk sits at
    /// 0.0; later chunks are expected (but not guaranteed) to be
    /// non-decreasing, and may dip slightly negative in out-of-order
    /// recordings.
    pub time_sec: f64,
}

/// Terminal dimensions announced by a recording's metadata header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TermSize {
    pub rows: u16,
    pub cols: u16,
}

/// A fully decoded recording: ordered chunks plus optional metadata.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Recording {
    pub chunks: Vec<Chunk>,
    pub dimensions: Option<TermSize>,
    /// Wall-clock time of the recording's origin, when the origin is
    /// plausible as a Unix timestamp (>= 1e8 seconds). Heuristic only;
    /// ttyrec writers that stamp elapsed seconds instead get `None`.
    pub origin_timestamp: Option<DateTime<Utc>>,
}

/// Character decoding mode for record payloads, selected by the metadata
/// header (`ESC % G` for UTF-8, `ESC % @` for the legacy single-byte set).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PayloadEncoding {
    Utf8,
    Latin1,
}

impl PayloadEncoding {
    fn decode(self, bytes: &[u8]) -> String {
        match self {
            // Lossy on purpose: invalid sequences become U+FFFD rather
            // than failing the whole recording.
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

impl Recording {
    /// Decodes a ttyrec byte stream.
    ///
    /// The format is a sequence of records: `u32le seconds`,
    /// `u32le microseconds`, `u32le payload_length`, then that many raw
    /// payload bytes. Fails with [`TtyreelError::MalformedRecording`] if
    /// the stream ends mid-record.
    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn decode(bytes: &[u8]) -> TtyreelResult<Self> {
        let mut chunks = Vec::new();
        let mut dimensions = None;
        let mut encoding = PayloadEncoding::Utf8;
        let mut origin = 0.0f64;
        let mut offset = 0usize;

        while offset < bytes.len() {
            let header = bytes.get(offset..offset + 12).ok_or_else(|| {
                TtyreelError::malformed(format!("record header truncated at byte {offset}"))
            })?;
            let sec = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let usec = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
            let len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;

            let payload_start = offset + 12;
            let payload = payload_start
                .checked_add(len)
                .and_then(|payload_end| bytes.get(payload_start..payload_end))
                .ok_or_else(|| {
                    TtyreelError::malformed(format!(
                        "record at byte {offset} declares {len} payload bytes but only {} remain",
                        bytes.len() - payload_start
                    ))
                })?;

            let time = f64::from(sec) + f64::from(usec) / 1e6;
            if offset == 0 {
                origin = time;
                if let Some((header_encoding, size)) = parse_metadata_header(payload) {
                    // The first record was pure metadata (termrec writes
                    // one): it configures decoding and the terminal size
                    // but is not replayable output.
                    encoding = header_encoding;
                    dimensions = Some(size);
                    offset = payload_start + len;
                    continue;
                }
            }

            chunks.push(Chunk {
                payload: encoding.decode(payload),
                time_sec: time - origin,
            });
            offset = payload_start + len;
        }

        let origin_timestamp = if origin >= 1e8 {
            let secs = origin.trunc() as i64;
            let nanos = ((origin - origin.trunc()) * 1e9).round() as u32;
            DateTime::<Utc>::from_timestamp(secs, nanos)
        } else {
            None
        };

        tracing::debug!(
            chunks = chunks.len(),
            has_dimensions = dimensions.is_some(),
            "decoded recording"
        );

        Ok(Self {
            chunks,
            dimensions,
            origin_timestamp,
        })
    }

    /// Time offset of the final chunk, or 0.0 for an empty recording.
    pub fn duration_sec(&self) -> f64 {
        self.chunks.last().map_or(0.0, |chunk| chunk.time_sec)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Matches a payload of exactly `ESC % (G|@) ESC [ 8 ; rows ; cols t`.
fn parse_metadata_header(payload: &[u8]) -> Option<(PayloadEncoding, TermSize)> {
    let rest = payload.strip_prefix(b"\x1b%")?;
    let (encoding, rest) = match rest.first()? {
        b'G' => (PayloadEncoding::Utf8, &rest[1..]),
        b'@' => (PayloadEncoding::Latin1, &rest[1..]),
        _ => return None,
    };
    let rest = rest.strip_prefix(b"\x1b[8;")?;
    let rest = rest.strip_suffix(b"t")?;
    let mut fields = rest.split(|&b| b == b';');
    let rows = ascii_u16(fields.next()?)?;
    let cols = ascii_u16(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some((encoding, TermSize { rows, cols }))
}

fn ascii_u16(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
