use crate::error::RangeError;

// Single `bytes` range as the client wrote it, not yet checked against the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    From { start: u64, end: Option<u64> }, // start- or start-end
    Suffix(u64),                           // -suffix, the last n bytes
}

// Inclusive [start, end] slice actually served, at most one chunk long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub content_length: u64,
}

impl ResolvedRange {
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

// Strict RFC 7233 parsing: one range, unit `bytes`, digits only, end >= start
pub fn parse_range_header(header: &str) -> Result<RangeSpec, RangeError> {
    let malformed = || RangeError::Malformed {
        header: header.to_string(),
    };

    let (unit, set) = header.trim().split_once('=').ok_or_else(malformed)?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Err(malformed());
    }
    if set.contains(',') {
        return Err(malformed());
    }

    let (first, last) = set.trim().split_once('-').ok_or_else(malformed)?;
    let (first, last) = (first.trim(), last.trim());

    match (first.is_empty(), last.is_empty()) {
        (true, true) => Err(malformed()),
        (true, false) => Ok(RangeSpec::Suffix(parse_offset(last).ok_or_else(malformed)?)),
        (false, true) => Ok(RangeSpec::From {
            start: parse_offset(first).ok_or_else(malformed)?,
            end: None,
        }),
        (false, false) => {
            let start = parse_offset(first).ok_or_else(malformed)?;
            let end = parse_offset(last).ok_or_else(malformed)?;
            if end < start {
                return Err(malformed());
            }
            Ok(RangeSpec::From {
                start,
                end: Some(end),
            })
        }
    }
}

// Digits only, no sign and no whitespace inside the number
fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// Check a parsed range against the file size and clamp it to one chunk.
// Start at or past EOF (always, for an empty file) and `-0` are not satisfiable.
pub fn resolve_spec(
    spec: RangeSpec,
    total_size: u64,
    chunk_size: u64,
) -> Result<ResolvedRange, RangeError> {
    let not_satisfiable = RangeError::NotSatisfiable { total_size };

    let (start, requested_end) = match spec {
        RangeSpec::From { start, end } => (start, end),
        RangeSpec::Suffix(0) => return Err(not_satisfiable),
        RangeSpec::Suffix(suffix) => (total_size.saturating_sub(suffix), None),
    };

    if start >= total_size {
        return Err(not_satisfiable);
    }

    let chunk_end = start.saturating_add(chunk_size.max(1) - 1);
    let mut end = chunk_end.min(total_size - 1);
    if let Some(requested_end) = requested_end {
        end = end.min(requested_end);
    }

    Ok(ResolvedRange {
        start,
        end,
        content_length: end - start + 1,
    })
}

// No header at all is an error: whole-file delivery is not offered
pub fn resolve_range(
    header: Option<&str>,
    total_size: u64,
    chunk_size: u64,
) -> Result<ResolvedRange, RangeError> {
    let spec = parse_range_header(header.ok_or(RangeError::Missing)?)?;
    resolve_spec(spec, total_size, chunk_size)
}
