//! Durable CSV format
//!
//! One header row `Timestamp,Event,Details`, then one row per event in
//! append order. Quoting follows standard CSV rules, so details may carry
//! commas, quotes and newlines.

use crate::error::LedgerError;
use crate::event::Event;
use std::io::Read;

/// Header row of the durable file
pub const HEADER: [&str; 3] = ["Timestamp", "Event", "Details"];

/// `chrono` format string for the `Timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encode one event as a CSV record, optionally preceded by the header row
pub(crate) fn encode_record(event: &Event, with_header: bool) -> Result<Vec<u8>, LedgerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(128));

    writer.serialize(event)?;

    writer
        .into_inner()
        .map_err(|e| LedgerError::Encode(csv::Error::from(e.into_error())))
}

/// Decode every event from a durable stream, oldest first
///
/// An empty stream (no header yet) decodes to an empty ledger.
pub(crate) fn decode_events<R: Read>(reader: R) -> Result<Vec<Event>, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(|e| corrupt(&e, 1))?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(LedgerError::Corrupt {
            line: 1,
            reason: format!(
                "unexpected header {:?}, expected {}",
                headers.iter().collect::<Vec<_>>(),
                HEADER.join(",")
            ),
        });
    }

    let mut events = Vec::new();
    for (idx, row) in reader.deserialize::<Event>().enumerate() {
        // Header is line 1, first data row is line 2
        let fallback_line = idx as u64 + 2;
        events.push(row.map_err(|e| corrupt(&e, fallback_line))?);
    }
    Ok(events)
}

/// Length of the prefix of `data` made of complete, terminated records
///
/// A record cut short by a crash (no line terminator before end of data)
/// is excluded, along with anything after the last terminated record.
pub(crate) fn complete_prefix_len(data: &[u8]) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut record = csv::ByteRecord::new();

    let mut complete = 0;
    while let Ok(true) = reader.read_byte_record(&mut record) {
        let end = usize::try_from(reader.position().byte())
            .map_or(data.len(), |end| end.min(data.len()));
        if end > 0 && matches!(data[end - 1], b'\n' | b'\r') {
            complete = end;
        }
    }
    complete
}

/// Check if `data` ends mid-record
pub(crate) fn has_torn_tail(data: &[u8]) -> bool {
    data.last().is_some_and(|&b| b != b'\n')
}

fn corrupt(err: &csv::Error, fallback_line: u64) -> LedgerError {
    LedgerError::Corrupt {
        line: err.position().map_or(fallback_line, csv::Position::line),
        reason: err.to_string(),
    }
}

/// Serde adapter for the `Timestamp` column
pub(crate) mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample(details: &str) -> Event {
        let ts = NaiveDate::from_ymd_opt(2025, 12, 17)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        Event::from_parts(ts, "SEAL_INITIATED", details)
    }

    #[test]
    fn first_record_carries_header() {
        let bytes = encode_record(&sample("source=Manual"), true).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Timestamp,Event,Details\n2025-12-17 09:30:05,SEAL_INITIATED,source=Manual\n"
        );
    }

    #[test]
    fn later_records_omit_header() {
        let bytes = encode_record(&sample("plain"), false).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "2025-12-17 09:30:05,SEAL_INITIATED,plain\n"
        );
    }

    #[test]
    fn commas_and_quotes_are_quoted() {
        let bytes = encode_record(&sample(r#"a, "b""#), false).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "2025-12-17 09:30:05,SEAL_INITIATED,\"a, \"\"b\"\"\"\n"
        );
    }

    #[test]
    fn decode_restores_awkward_details() {
        let awkward = "line one\nline \"two\", with comma";
        let mut bytes = encode_record(&sample("first"), true).unwrap();
        bytes.extend(encode_record(&sample(awkward), false).unwrap());

        let events = decode_events(bytes.as_slice()).unwrap();
        assert_eq!(events, vec![sample("first"), sample(awkward)]);
    }

    #[test]
    fn decode_empty_stream_is_empty_ledger() {
        assert!(decode_events(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn decode_header_only_is_empty_ledger() {
        assert!(decode_events(&b"Timestamp,Event,Details\n"[..])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn decode_accepts_crlf_rows() {
        let raw = "Timestamp,Event,Details\r\n2025-12-17 09:30:05,Pulse,Optimal\r\n";
        let events = decode_events(raw.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details(), "Optimal");
    }

    #[test]
    fn complete_prefix_stops_before_torn_record() {
        let mut bytes = encode_record(&sample("whole"), true).unwrap();
        let whole = bytes.len();
        bytes.extend_from_slice(b"2025-12-17 09:30:05,Pul");

        assert!(has_torn_tail(&bytes));
        assert_eq!(complete_prefix_len(&bytes), whole);
    }

    #[test]
    fn complete_prefix_excludes_torn_quoted_newline() {
        let mut bytes = encode_record(&sample("whole"), true).unwrap();
        let whole = bytes.len();
        bytes.extend_from_slice(b"2025-12-17 09:30:05,Pulse,\"line one\nline t");

        assert_eq!(complete_prefix_len(&bytes), whole);
    }

    #[test]
    fn complete_prefix_of_terminated_data_is_everything() {
        let mut bytes = encode_record(&sample("a"), true).unwrap();
        bytes.extend(encode_record(&sample("b\nc"), false).unwrap());

        assert!(!has_torn_tail(&bytes));
        assert_eq!(complete_prefix_len(&bytes), bytes.len());
        assert_eq!(complete_prefix_len(b"Timest"), 0);
        assert!(!has_torn_tail(b""));
    }

    #[test]
    fn decode_rejects_foreign_header() {
        let err = decode_events(&b"when,what\n"[..]).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn decode_reports_line_of_bad_timestamp() {
        let raw = "Timestamp,Event,Details\n\
                   2025-12-17 09:30:05,Pulse,Optimal\n\
                   yesterday,Pulse,Stress\n";
        let err = decode_events(raw.as_bytes()).unwrap_err();
        match err {
            LedgerError::Corrupt { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("yesterday"));
            }
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }
}
