//! Forward/backward cursor over a spooled query result.
//!
//! The payload is copied once to an unnamed temp file. A single structural
//! pass records the byte offset of every element of `query_rows` and decodes
//! the small top-level fields (`status`, `row_count`, `column_types`, error
//! fields). Each move then seeks to one row and parses only that row, so
//! memory stays bounded by the widest row, not by the result size.
//!
//! Positions run from 0 (before first) to N + 1 (after last). Column values
//! are read from the current row by 1-based index or by name.

use crate::{
    compression::decompressing_reader,
    envelope::{json_to_string, ResultEnvelope},
    error::{AceQlLinkError, Result},
    models::NULL_MARKER,
    transport::{drain_into, HttpStream},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::time::Instant;

/// Column selector: 1-based index or column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ColumnRef<'_> {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl From<u32> for ColumnRef<'_> {
    fn from(index: u32) -> Self {
        ColumnRef::Index(index as usize)
    }
}

impl From<i32> for ColumnRef<'_> {
    fn from(index: i32) -> Self {
        // negative indexes can never match a column
        ColumnRef::Index(usize::try_from(index).unwrap_or(0))
    }
}

impl<'a> From<&'a str> for ColumnRef<'a> {
    fn from(name: &'a str) -> Self {
        ColumnRef::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnRef<'a> {
    fn from(name: &'a String) -> Self {
        ColumnRef::Name(name.as_str())
    }
}

impl std::fmt::Display for ColumnRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{}", i),
            ColumnRef::Name(n) => f.write_str(n),
        }
    }
}

/// Random-access cursor over a query result.
///
/// Not internally synchronized; drive it from one thread at a time.
pub struct ResultCursor {
    /// Spooled payload, `None` once closed
    source: Option<File>,
    row_offsets: Vec<u64>,
    row_count: usize,
    column_types: Vec<String>,
    column_names: Vec<String>,
    index_by_name: HashMap<String, usize>,
    position: usize,
    /// Raw values of the current row; empty on a sentinel position
    values: Vec<String>,
    was_null: bool,
}

impl ResultCursor {
    /// Spool a query response and open a cursor over it.
    ///
    /// The row count is taken from the payload's `row_count` field.
    /// A FAIL payload becomes a `ServerError`.
    pub fn from_http_stream(stream: HttpStream) -> Result<Self> {
        let HttpStream {
            reader,
            status_code,
            status_message,
        } = stream;

        let mut source = spool(reader)?;
        let layout = match scan_payload(&mut source) {
            Ok(layout) => layout,
            Err(e) if status_code != 200 => {
                debug!("[ACEQL_CURSOR] Undecodable error payload: {}", e);
                return Err(ResultEnvelope::http_failure(status_code, &status_message)
                    .to_error()
                    .unwrap_or(e));
            },
            Err(e) => return Err(e),
        };

        let envelope =
            ResultEnvelope::from_document(layout.fields.clone(), status_code, &status_message)
                .into_result()?;
        let row_count = match envelope.int_value("row_count") {
            Some(count) => usize::try_from(count).map_err(|_| {
                AceQlLinkError::protocol(format!("Invalid row_count: {}", count))
            })?,
            None => layout.row_offsets.len(),
        };

        Self::with_layout(source, layout, row_count)
    }

    /// Open a cursor over an already spooled, uncompressed payload.
    pub fn open(mut source: File, row_count: usize) -> Result<Self> {
        let layout = scan_payload(&mut source)?;
        ResultEnvelope::from_document(layout.fields.clone(), 200, "OK").into_result()?;
        Self::with_layout(source, layout, row_count)
    }

    fn with_layout(source: File, layout: PayloadLayout, row_count: usize) -> Result<Self> {
        if row_count > layout.row_offsets.len() {
            return Err(AceQlLinkError::protocol(format!(
                "Result declares {} rows but only {} were received",
                row_count,
                layout.row_offsets.len()
            )));
        }

        let column_types = layout
            .fields
            .get("column_types")
            .and_then(JsonValue::as_array)
            .map(|types| types.iter().filter_map(json_to_string).collect())
            .unwrap_or_default();

        let mut cursor = Self {
            source: Some(source),
            row_offsets: layout.row_offsets,
            row_count,
            column_types,
            column_names: Vec::new(),
            index_by_name: HashMap::new(),
            position: 0,
            values: Vec::new(),
            was_null: false,
        };

        // column names come from the first row
        if row_count > 0 {
            let first = cursor.parse_row(1)?;
            cursor.register_columns(&first);
        }

        debug!(
            "[ACEQL_CURSOR] Opened cursor: rows={} columns={}",
            cursor.row_count,
            cursor.column_names.len()
        );
        Ok(cursor)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Current position: 0 before first, N + 1 after last.
    pub fn row(&self) -> usize {
        self.position
    }

    pub fn is_before_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_after_last(&self) -> bool {
        self.position == self.row_count + 1
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// SQL type names reported by the server, in column order.
    pub fn column_types(&self) -> &[String] {
        &self.column_types
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Name of the 1-based column `index`.
    pub fn column_name(&self, index: usize) -> Result<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.column_names.get(i))
            .map(String::as_str)
            .ok_or_else(|| AceQlLinkError::InvalidColumn(format!("Invalid column index: {}", index)))
    }

    /// 1-based index of the first column called `name`.
    pub fn find_column(&self, name: &str) -> Result<usize> {
        self.index_by_name
            .get(name)
            .map(|i| i + 1)
            .ok_or_else(|| AceQlLinkError::InvalidColumn(format!("Invalid column name: {}", name)))
    }

    /// Move to the next row. Returns false, without moving, once the last
    /// row (or the after-last sentinel) is current.
    pub fn next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if self.position >= self.row_count {
            return Ok(false);
        }
        self.move_to(self.position + 1)?;
        Ok(true)
    }

    /// Move to the previous row. Never descends below row 1.
    pub fn previous(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if self.position <= 1 {
            return Ok(false);
        }
        self.move_to(self.position - 1)?;
        Ok(true)
    }

    /// Jump to `row`. `absolute(0)` resets to before-first.
    pub fn absolute(&mut self, row: i64) -> Result<bool> {
        self.ensure_open()?;
        let target = match usize::try_from(row) {
            Ok(target) if target <= self.row_count => target,
            _ => return Ok(false),
        };
        if target == 0 {
            self.before_first()?;
        } else {
            self.move_to(target)?;
        }
        Ok(true)
    }

    pub fn first(&mut self) -> Result<bool> {
        self.absolute(1)
    }

    pub fn last(&mut self) -> Result<bool> {
        self.absolute(self.row_count as i64)
    }

    pub fn before_first(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.position = 0;
        self.values.clear();
        Ok(())
    }

    pub fn after_last(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.position = self.row_count + 1;
        self.values.clear();
        Ok(())
    }

    /// Whether the most recent column access read a null.
    pub fn was_null(&self) -> bool {
        self.was_null
    }

    pub fn get_string<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<String>> {
        Ok(self.raw_value(column.into())?.map(str::to_string))
    }

    pub fn get_int<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i32> {
        self.get_number(column.into(), "int")
    }

    pub fn get_long<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i64> {
        self.get_number(column.into(), "long")
    }

    pub fn get_short<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i16> {
        self.get_number(column.into(), "short")
    }

    pub fn get_float<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<f32> {
        self.get_number(column.into(), "float")
    }

    pub fn get_double<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<f64> {
        self.get_number(column.into(), "double")
    }

    /// "true" in any case is true; anything else, null included, is false.
    pub fn get_boolean<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<bool> {
        Ok(self
            .raw_value(column.into())?
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false))
    }

    /// Epoch milliseconds or `YYYY-MM-DD`.
    pub fn get_date<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<NaiveDate>> {
        let column = column.into();
        let Some(raw) = self.raw_value(column)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if let Ok(millis) = raw.parse::<i64>() {
            return from_epoch_millis(millis, column).map(|ts| Some(ts.date()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid_value("date", column, raw))
    }

    /// Epoch milliseconds or `YYYY-MM-DD HH:MM:SS[.fff]`.
    pub fn get_timestamp<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<NaiveDateTime>> {
        let column = column.into();
        let Some(raw) = self.raw_value(column)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if let Ok(millis) = raw.parse::<i64>() {
            return from_epoch_millis(millis, column).map(Some);
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(Some)
            .ok_or_else(|| invalid_value("timestamp", column, raw))
    }

    /// Blob id to hand to the blob download; bytes are never inlined.
    pub fn get_binary_stream_reference<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<String>> {
        self.get_string(column)
    }

    /// Release the spooled payload. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("[ACEQL_CURSOR] Cursor closed");
        }
        self.values.clear();
        self.row_offsets.clear();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(AceQlLinkError::ClosedResource("ResultCursor".to_string()));
        }
        Ok(())
    }

    fn move_to(&mut self, row: usize) -> Result<()> {
        match self.parse_row(row) {
            Ok(cells) => {
                if self.column_names.is_empty() {
                    self.register_columns(&cells);
                }
                self.values = cells.into_iter().map(|(_, value)| value).collect();
                self.position = row;
                Ok(())
            },
            Err(e) => {
                self.values.clear();
                Err(e)
            },
        }
    }

    fn register_columns(&mut self, cells: &[(String, String)]) {
        self.column_names = cells.iter().map(|(name, _)| name.clone()).collect();
        self.index_by_name.clear();
        for (i, name) in self.column_names.iter().enumerate() {
            self.index_by_name.entry(name.clone()).or_insert(i);
        }
    }

    /// Re-read row `row` (1-based) from the backing file.
    fn parse_row(&mut self, row: usize) -> Result<Vec<(String, String)>> {
        let offset = self.row_offsets[row - 1];
        let file = self
            .source
            .as_mut()
            .ok_or_else(|| AceQlLinkError::ClosedResource("ResultCursor".to_string()))?;
        file.seek(SeekFrom::Start(offset)).map_err(AceQlLinkError::local_io)?;

        let reader = BufReader::new(&mut *file);
        let value = serde_json::Deserializer::from_reader(reader)
            .into_iter::<JsonValue>()
            .next()
            .ok_or_else(|| AceQlLinkError::protocol(format!("Row {} is missing", row)))??;

        row_cells(value, row)
    }

    fn raw_value(&mut self, column: ColumnRef<'_>) -> Result<Option<&str>> {
        self.ensure_open()?;
        let index = match column {
            ColumnRef::Index(index) => index
                .checked_sub(1)
                .filter(|i| *i < self.values.len())
                .ok_or_else(|| {
                    AceQlLinkError::InvalidColumn(format!("Invalid column index: {}", index))
                })?,
            ColumnRef::Name(name) => self
                .index_by_name
                .get(name)
                .copied()
                .filter(|i| *i < self.values.len())
                .ok_or_else(|| {
                    AceQlLinkError::InvalidColumn(format!("Invalid column name: {}", name))
                })?,
        };

        // was_null matches any case; only the exact marker reads as absent
        let value = self.values[index].as_str();
        self.was_null = value.eq_ignore_ascii_case(NULL_MARKER);
        Ok(if value == NULL_MARKER { None } else { Some(value) })
    }

    fn get_number<T>(&mut self, column: ColumnRef<'_>, type_name: &str) -> Result<T>
    where
        T: std::str::FromStr + Default,
    {
        match self.raw_value(column)? {
            None => Ok(T::default()),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| invalid_value(type_name, column, raw)),
        }
    }
}

impl std::fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("row_count", &self.row_count)
            .field("position", &self.position)
            .field("columns", &self.column_names)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn invalid_value(type_name: &str, column: ColumnRef<'_>, raw: &str) -> AceQlLinkError {
    AceQlLinkError::DataFormatError(format!(
        "Column {} value '{}' is not a valid {}",
        column, raw, type_name
    ))
}

fn from_epoch_millis(millis: i64, column: ColumnRef<'_>) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| invalid_value("timestamp", column, &millis.to_string()))
}

/// `{"row_n":[{"col":v},...]}` into ordered `(name, raw value)` pairs.
fn row_cells(value: JsonValue, row: usize) -> Result<Vec<(String, String)>> {
    let cells = match value {
        JsonValue::Object(map) => map.into_iter().next().map(|(_, cells)| cells),
        array @ JsonValue::Array(_) => Some(array),
        _ => None,
    };
    let Some(JsonValue::Array(cells)) = cells else {
        return Err(AceQlLinkError::protocol(format!(
            "Row {} is not a column array",
            row
        )));
    };

    cells
        .into_iter()
        .map(|cell| match cell {
            JsonValue::Object(map) => map
                .into_iter()
                .next()
                .map(|(name, value)| {
                    let raw = json_to_string(&value).unwrap_or_else(|| NULL_MARKER.to_string());
                    (name, raw)
                })
                .ok_or_else(|| AceQlLinkError::protocol(format!("Row {} has an empty cell", row))),
            _ => Err(AceQlLinkError::protocol(format!(
                "Row {} has a malformed cell",
                row
            ))),
        })
        .collect()
}

/// Copy a (possibly gzipped) payload into an unnamed temp file.
pub(crate) fn spool(reader: Box<dyn Read + Send>) -> Result<File> {
    let start = Instant::now();
    let mut plain = decompressing_reader(reader)?;
    let mut file = tempfile::tempfile().map_err(AceQlLinkError::local_io)?;
    let bytes = drain_into(&mut plain, &mut file)?;
    file.seek(SeekFrom::Start(0)).map_err(AceQlLinkError::local_io)?;
    debug!(
        "[ACEQL_CURSOR] Spooled {} bytes in {:?}",
        bytes,
        start.elapsed()
    );
    Ok(file)
}

/// Top-level fields plus the offsets of every row element.
#[derive(Debug, Default)]
struct PayloadLayout {
    fields: Map<String, JsonValue>,
    row_offsets: Vec<u64>,
}

fn scan_payload(file: &mut File) -> Result<PayloadLayout> {
    file.seek(SeekFrom::Start(0)).map_err(AceQlLinkError::local_io)?;
    let layout = PayloadScanner::new(BufReader::new(&mut *file)).scan()?;
    Ok(layout)
}

/// Single pass structural scanner. Only the top-level object is tokenized;
/// row elements are skipped over with string/escape/depth tracking.
struct PayloadScanner<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> PayloadScanner<R> {
    fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    fn scan(mut self) -> Result<PayloadLayout> {
        let mut layout = PayloadLayout::default();

        self.expect(b'{')?;
        if self.skip_ws()? == Some(b'}') {
            self.bump();
            return Ok(layout);
        }

        loop {
            if self.skip_ws()? != Some(b'"') {
                return Err(malformed("expected a field name", self.offset));
            }
            let mut key = Vec::new();
            self.copy_string(Some(&mut key))?;
            let key: String = serde_json::from_slice(&key)?;
            self.expect(b':')?;

            if key == "query_rows" {
                self.scan_rows(&mut layout.row_offsets)?;
            } else {
                let mut raw = Vec::new();
                self.copy_value(Some(&mut raw))?;
                layout.fields.insert(key, serde_json::from_slice(&raw)?);
            }

            match self.skip_ws()? {
                Some(b',') => self.bump(),
                Some(b'}') => {
                    self.bump();
                    break;
                },
                _ => return Err(malformed("expected ',' or '}'", self.offset)),
            }
        }

        Ok(layout)
    }

    fn scan_rows(&mut self, offsets: &mut Vec<u64>) -> Result<()> {
        match self.skip_ws()? {
            Some(b'[') => self.bump(),
            Some(b'n') => return self.copy_value(None),
            _ => return Err(malformed("query_rows is not an array", self.offset)),
        }
        if self.skip_ws()? == Some(b']') {
            self.bump();
            return Ok(());
        }

        loop {
            self.skip_ws()?;
            offsets.push(self.offset);
            self.copy_value(None)?;
            match self.skip_ws()? {
                Some(b',') => self.bump(),
                Some(b']') => {
                    self.bump();
                    return Ok(());
                },
                _ => return Err(malformed("expected ',' or ']' in query_rows", self.offset)),
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.offset += 1;
    }

    fn next_byte(&mut self) -> Result<u8> {
        match self.peek()? {
            Some(byte) => {
                self.bump();
                Ok(byte)
            },
            None => Err(malformed("unexpected end of payload", self.offset)),
        }
    }

    /// Skip whitespace and peek at the next byte without consuming it.
    fn skip_ws(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(byte) if byte.is_ascii_whitespace() => self.bump(),
                other => return Ok(other),
            }
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.skip_ws()? {
            Some(byte) if byte == expected => {
                self.bump();
                Ok(())
            },
            _ => Err(malformed(
                &format!("expected '{}'", expected as char),
                self.offset,
            )),
        }
    }

    fn copy_value(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        match self.skip_ws()? {
            Some(b'"') => self.copy_string(out),
            Some(b'{') | Some(b'[') => self.copy_nested(out),
            Some(_) => {
                let start = self.offset;
                while let Some(byte) = self.peek()? {
                    if byte.is_ascii_whitespace() || matches!(byte, b',' | b'}' | b']') {
                        break;
                    }
                    if let Some(out) = out.as_deref_mut() {
                        out.push(byte);
                    }
                    self.bump();
                }
                if self.offset == start {
                    return Err(malformed("expected a value", start));
                }
                Ok(())
            },
            None => Err(malformed("unexpected end of payload", self.offset)),
        }
    }

    /// Copy a string including its quotes. The opening quote is next.
    fn copy_string(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        let mut escaped = false;
        let quote = self.next_byte()?;
        if let Some(out) = out.as_deref_mut() {
            out.push(quote);
        }
        loop {
            let byte = self.next_byte()?;
            if let Some(out) = out.as_deref_mut() {
                out.push(byte);
            }
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                return Ok(());
            }
        }
    }

    fn copy_nested(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        loop {
            let byte = self.next_byte()?;
            if let Some(out) = out.as_deref_mut() {
                out.push(byte);
            }
            if in_string {
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                }
                continue;
            }
            match byte {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                },
                _ => {},
            }
        }
    }
}

fn malformed(what: &str, offset: u64) -> AceQlLinkError {
    AceQlLinkError::protocol(format!(
        "Malformed query result payload at byte {}: {}",
        offset, what
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::io::{Cursor, Write};

    const PAYLOAD: &str = r#"{
        "status": "OK",
        "column_types": ["INTEGER", "VARCHAR", "DATE"],
        "query_rows": [
            {"row_1": [{"customer_id": 1}, {"fname": "Jean \"JJ\""}, {"birth": "2001-02-03"}]},
            {"row_2": [{"customer_id": 2}, {"fname": "NULL"}, {"birth": null}]},
            {"row_3": [{"customer_id": 3}, {"fname": "Zoë, [x]"}, {"birth": 0}]}
        ],
        "row_count": 3
    }"#;

    fn file_with(payload: &str) -> File {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(payload.as_bytes()).unwrap();
        file
    }

    fn cursor() -> ResultCursor {
        ResultCursor::open(file_with(PAYLOAD), 3).unwrap()
    }

    #[test]
    fn test_scanner_finds_rows_and_fields() {
        let mut file = file_with(PAYLOAD);
        let layout = scan_payload(&mut file).unwrap();
        assert_eq!(layout.row_offsets.len(), 3);
        assert_eq!(layout.fields["row_count"], 3);
        assert_eq!(layout.fields["status"], "OK");
        assert!(!layout.fields.contains_key("query_rows"));
    }

    #[test]
    fn test_columns() {
        let c = cursor();
        assert_eq!(c.column_count(), 3);
        assert_eq!(c.column_types(), ["INTEGER", "VARCHAR", "DATE"]);
        assert_eq!(c.column_name(2).unwrap(), "fname");
        assert_eq!(c.find_column("birth").unwrap(), 3);
        assert!(c.column_name(0).is_err());
        assert!(c.find_column("nope").is_err());
    }

    #[test]
    fn test_next_walks_every_row_then_stops() {
        let mut c = cursor();
        let mut seen = Vec::new();
        for _ in 0..3 {
            assert!(c.next().unwrap());
            seen.push(c.get_int(1).unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(!c.next().unwrap());
        assert_eq!(c.row(), 3);
    }

    #[test]
    fn test_values_with_escapes_and_delimiters() {
        let mut c = cursor();
        c.absolute(1).unwrap();
        assert_eq!(c.get_string("fname").unwrap().as_deref(), Some("Jean \"JJ\""));
        c.absolute(3).unwrap();
        assert_eq!(c.get_string(2usize).unwrap().as_deref(), Some("Zoë, [x]"));
    }

    #[test]
    fn test_null_handling() {
        let mut c = cursor();
        c.absolute(2).unwrap();

        assert_eq!(c.get_string("fname").unwrap(), None);
        assert!(c.was_null());
        assert_eq!(c.get_int("fname").unwrap(), 0);
        assert!(c.was_null());
        assert_eq!(c.get_date("birth").unwrap(), None);
        assert!(!c.get_boolean("birth").unwrap());

        assert_eq!(c.get_long(1).unwrap(), 2);
        assert!(!c.was_null(), "was_null reflects only the last access");
    }

    #[test]
    fn test_lowercase_null_text_is_kept() {
        let payload = r#"{"status":"OK","query_rows":[
            {"row_1": [{"a": "null"}, {"b": "Null"}, {"c": "NULL"}]}
        ],"row_count":1}"#;
        let mut c = ResultCursor::open(file_with(payload), 1).unwrap();
        c.next().unwrap();

        assert_eq!(c.get_string("a").unwrap().as_deref(), Some("null"));
        assert!(c.was_null());
        assert_eq!(c.get_string("b").unwrap().as_deref(), Some("Null"));
        assert!(c.was_null());
        assert_eq!(c.get_string("c").unwrap(), None);
        assert!(c.was_null());
    }

    #[test]
    fn test_numeric_cells_keep_their_text() {
        let payload = r#"{"status":"OK","query_rows":[
            {"row_1": [{"price": 12.50}, {"big": 12345678901234567890123}, {"id": 9007199254740993}]}
        ],"row_count":1}"#;
        let mut c = ResultCursor::open(file_with(payload), 1).unwrap();
        c.next().unwrap();

        assert_eq!(c.get_string("price").unwrap().as_deref(), Some("12.50"));
        assert_eq!(c.get_double("price").unwrap(), 12.5);
        assert_eq!(
            c.get_string("big").unwrap().as_deref(),
            Some("12345678901234567890123")
        );
        assert_eq!(c.get_long("big").unwrap_err().kind(), ErrorKind::DataFormat);
        assert_eq!(c.get_long("id").unwrap(), 9_007_199_254_740_993);
    }

    #[test]
    fn test_dates_and_timestamps() {
        let mut c = cursor();
        c.first().unwrap();
        assert_eq!(
            c.get_date("birth").unwrap(),
            NaiveDate::from_ymd_opt(2001, 2, 3)
        );
        c.last().unwrap();
        assert_eq!(
            c.get_timestamp("birth").unwrap(),
            DateTime::from_timestamp_millis(0).map(|d| d.naive_utc())
        );
    }

    #[test]
    fn test_bad_number_is_data_format_error() {
        let mut c = cursor();
        c.next().unwrap();
        let err = c.get_double("fname").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn test_sentinels_have_no_current_row() {
        let mut c = cursor();
        assert!(matches!(
            c.get_string(1usize),
            Err(AceQlLinkError::InvalidColumn(_))
        ));
        c.after_last().unwrap();
        assert!(c.is_after_last());
        assert!(c.get_string(1usize).is_err());
        assert!(c.previous().unwrap());
        assert_eq!(c.row(), 3);
    }

    #[test]
    fn test_previous_policy() {
        let mut c = cursor();
        assert!(!c.previous().unwrap(), "no-op from before-first");
        assert_eq!(c.row(), 0);

        c.next().unwrap();
        assert!(!c.previous().unwrap());
        assert_eq!(c.row(), 1);

        c.absolute(3).unwrap();
        assert!(c.previous().unwrap());
        assert_eq!(c.get_int("customer_id").unwrap(), 2);
    }

    #[test]
    fn test_absolute_bounds() {
        let mut c = cursor();
        assert!(!c.absolute(4).unwrap());
        assert!(!c.absolute(-1).unwrap());
        assert_eq!(c.row(), 0);

        assert!(c.absolute(2).unwrap());
        assert!(c.absolute(0).unwrap());
        assert!(c.is_before_first());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut c = cursor();
        c.close();
        c.close();
        assert!(c.is_closed());
        assert!(matches!(c.next(), Err(AceQlLinkError::ClosedResource(_))));
        assert!(c.get_string(1usize).is_err());
    }

    #[test]
    fn test_empty_result() {
        let payload = r#"{"status":"OK","column_types":[],"query_rows":[],"row_count":0}"#;
        let mut c = ResultCursor::open(file_with(payload), 0).unwrap();
        assert!(!c.next().unwrap());
        assert!(c.is_before_first());
        assert!(!c.first().unwrap());
        assert_eq!(c.column_count(), 0);
    }

    #[test]
    fn test_declared_count_beyond_rows_is_protocol_error() {
        let err = ResultCursor::open(file_with(PAYLOAD), 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_fail_payload_is_server_error() {
        let stream = HttpStream::new(
            Box::new(Cursor::new(
                br#"{"status":"FAIL","error_type":2,"error_message":"syntax error"}"#.to_vec(),
            )),
            400,
            "Bad Request",
        );
        let err = ResultCursor::from_http_stream(stream).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.error_type(), 2);
        assert_eq!(err.http_status_code(), Some(400));
    }

    #[test]
    fn test_html_error_body_is_http_failure() {
        let stream = HttpStream::new(
            Box::new(Cursor::new(b"<html>oops</html>".to_vec())),
            500,
            "Internal Server Error",
        );
        let err = ResultCursor::from_http_stream(stream).unwrap_err();
        assert!(err.to_string().contains("HTTP_FAILURE 500"));
    }

    #[test]
    fn test_row_count_taken_from_payload() {
        let stream = HttpStream::new(Box::new(Cursor::new(PAYLOAD.as_bytes().to_vec())), 200, "OK");
        let c = ResultCursor::from_http_stream(stream).unwrap();
        assert_eq!(c.row_count(), 3);
    }
}
