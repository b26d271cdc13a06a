use base64::Engine as _;
use percent_encoding::percent_decode_str;

/// What a poster specification asks the idle overlay to show.
///
/// Recomputed whenever the host's poster attribute changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Poster {
    /// No poster, or a no-op poster (`npt:0`, unparsable time).
    None,
    /// Render the recording's frame at this offset, in seconds.
    TimeOffset(f64),
    /// Show this literal text on a blank terminal.
    LiteralText(String),
    /// Recognised as a poster but not renderable here (reserved for
    /// image posters).
    Unsupported,
}

impl Poster {
    /// Classifies a raw poster string.
    ///
    /// - empty / whitespace → [`Poster::None`]
    /// - `npt:…` or a bare time (`90`, `1:02:03.5`) → [`Poster::TimeOffset`],
    ///   except zero or unparsable times, which mean "no poster"
    /// - `data:text/plain…` (optionally `;base64`) → [`Poster::LiteralText`]
    /// - anything else → [`Poster::Unsupported`]
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::None;
        }
        match scheme_of(raw) {
            Some(scheme) if scheme.eq_ignore_ascii_case("data") => match parse_data_uri(raw) {
                Some((mime, text)) if mime.eq_ignore_ascii_case("text/plain") => {
                    Self::LiteralText(text)
                }
                _ => Self::Unsupported,
            },
            Some(scheme) if scheme.eq_ignore_ascii_case("npt") => Self::from_time(raw),
            Some(_) => Self::Unsupported,
            None => Self::from_time(raw),
        }
    }

    fn from_time(raw: &str) -> Self {
        match parse_npt(raw) {
            // Zero is the same as no poster: the frame at 0 is blank.
            Some(time) if time > 0.0 => Self::TimeOffset(time),
            _ => Self::None,
        }
    }
}

/// Extracts an RFC-3986-shaped scheme (`alpha *(alnum / + / - / .)`)
/// before the first colon. `1:02:03` has no scheme; its `1` is a time
/// field.
fn scheme_of(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once(':')?;
    let first = *scheme.as_bytes().first()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let tail_ok = scheme
        .bytes()
        .skip(1)
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    tail_ok.then_some(scheme)
}

/// Parses a normal-play-time string: `[npt:][[hours:]minutes:]seconds[.frac]`.
///
/// Fields are unbounded (`1:2:3.4` and `0:90` are fine), matching the
/// relaxed format ttyrec players accept.
pub(crate) fn parse_npt(input: &str) -> Option<f64> {
    let rest = strip_prefix_ignore_case(input, "npt:").unwrap_or(input);
    let mut fields: Vec<&str> = rest.split(':').collect();
    if fields.len() > 3 {
        return None;
    }
    let seconds = parse_seconds(fields.pop()?)?;
    let minutes = match fields.pop() {
        Some(f) => parse_integer_field(f)? as f64,
        None => 0.0,
    };
    let hours = match fields.pop() {
        Some(f) => parse_integer_field(f)? as f64,
        None => 0.0,
    };
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// `\d+` only.
fn parse_integer_field(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `\d+(\.\d+)?` only.
fn parse_seconds(s: &str) -> Option<f64> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    s.parse().ok()
}

/// Parses `data:<mime>[;base64],<data>` (any `#fragment` is dropped),
/// returning the declared media type and the decoded payload text.
///
/// The payload is percent-decoded first, then base64-decoded if the
/// media type carried a trailing `;base64`. Any structural or decoding
/// problem yields `None`; the caller classifies that as unsupported.
fn parse_data_uri(uri: &str) -> Option<(String, String)> {
    let rest = strip_prefix_ignore_case(uri, "data:")?;
    let (mime_raw, data_raw) = rest.split_once(',')?;
    let data_raw = match data_raw.split_once('#') {
        Some((before, _)) => before,
        None => data_raw,
    };
    if data_raw.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(data_raw).decode_utf8().ok()?;
    let (mime, is_base64) = match mime_raw.strip_suffix(";base64") {
        Some(stripped) => (stripped, true),
        None => (mime_raw, false),
    };

    let text = if is_base64 {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(decoded.as_bytes())
            .ok()?;
        String::from_utf8(bytes).ok()?
    } else {
        decoded.into_owned()
    };
    Some((mime.to_string(), text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npt_times_accumulate_fields() {
        assert_eq!(parse_npt("90"), Some(90.0));
        assert_eq!(parse_npt("1:30"), Some(90.0));
        assert_eq!(parse_npt("npt:1:02:03.5"), Some(3723.5));
        assert_eq!(parse_npt("NPT:2"), Some(2.0));
        assert_eq!(parse_npt("1:2:3.4"), Some(3723.4));
    }

    #[test]
    fn npt_rejects_malformed_fields() {
        assert_eq!(parse_npt(""), None);
        assert_eq!(parse_npt("npt:"), None);
        assert_eq!(parse_npt("1:2:3:4"), None);
        assert_eq!(parse_npt("1:-2"), None);
        assert_eq!(parse_npt("1."), None);
        assert_eq!(parse_npt(".5"), None);
        assert_eq!(parse_npt("1:02:03x"), None);
    }

    #[test]
    fn classify_time_posters() {
        assert_eq!(
            Poster::classify("npt:1:02:03.5"),
            Poster::TimeOffset(3723.5)
        );
        assert_eq!(Poster::classify("12.25"), Poster::TimeOffset(12.25));
        assert_eq!(Poster::classify("1:02:03"), Poster::TimeOffset(3723.0));
        assert_eq!(Poster::classify("npt:0"), Poster::None);
        assert_eq!(Poster::classify("npt:bogus"), Poster::None);
    }

    #[test]
    fn classify_blank_and_unknown() {
        assert_eq!(Poster::classify(""), Poster::None);
        assert_eq!(Poster::classify("   "), Poster::None);
        assert_eq!(Poster::classify("not a time"), Poster::None);
        assert_eq!(
            Poster::classify("https://example.com/poster.png"),
            Poster::Unsupported
        );
    }

    #[test]
    fn classify_text_data_uris() {
        assert_eq!(
            Poster::classify("data:text/plain,hello"),
            Poster::LiteralText("hello".to_string())
        );
        assert_eq!(
            Poster::classify("data:text/plain,hello%20world#frag"),
            Poster::LiteralText("hello world".to_string())
        );
        assert_eq!(
            Poster::classify("data:text/plain;base64,MTIzNA=="),
            Poster::LiteralText("1234".to_string())
        );
        assert_eq!(
            Poster::classify("data:TEXT/PLAIN,caps"),
            Poster::LiteralText("caps".to_string())
        );
    }

    #[test]
    fn classify_non_text_or_broken_data_uris() {
        assert_eq!(Poster::classify("data:image/png,xxxx"), Poster::Unsupported);
        assert_eq!(
            Poster::classify("data:text/plain;charset=utf-8,x"),
            Poster::Unsupported
        );
        assert_eq!(Poster::classify("data:nocomma"), Poster::Unsupported);
        assert_eq!(
            Poster::classify("data:text/plain;base64,@@@"),
            Poster::Unsupported
        );
    }
}
