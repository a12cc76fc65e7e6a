// Decoding of booking service XML replies
//
// Replies carry either a single value (`<string>Ready</string>`) or a list of
// integers (`<ArrayOfInt><int>5</int><int>17</int></ArrayOfInt>`). Scalar
// decoding is positional: it takes the first leaf element in document order,
// whatever its name.
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::str::FromStr;

use crate::error::{BookingError, BookingResult};

/// Element name of each entry in a list of booking IDs.
pub const INT_FIELD_TAG: &str = "int";

/// Text of the first leaf element in document order.
pub fn first_field(xml: &str) -> BookingResult<String> {
    let mut reader = Reader::from_str(xml);

    // Set once an element opens; a child element restarts the text
    let mut in_element = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                in_element = true;
                text.clear();
            }
            Event::Empty(_) => return Ok(String::new()),
            // The first end tag always closes the innermost open element
            Event::End(_) => return Ok(text.trim().to_string()),
            Event::Eof => {
                return Err(BookingError::Parse("response contains no field".to_string()))
            }
            event if in_element => push_content(&mut text, event)?,
            _ => (),
        }
    }
}

/// Text of every element named `tag`, in document order.
pub fn all_fields(xml: &str, tag: &str) -> BookingResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut values = Vec::new();
    let mut depth = 0usize;
    // Depth of the matching element being collected
    let mut open_at: Option<usize> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                if open_at.is_none() && e.local_name().as_ref() == tag.as_bytes() {
                    open_at = Some(depth);
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if open_at.is_none() && e.local_name().as_ref() == tag.as_bytes() {
                    values.push(String::new());
                }
            }
            Event::End(_) => {
                if open_at == Some(depth) {
                    values.push(text.trim().to_string());
                    open_at = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            event if open_at.is_some() => push_content(&mut text, event)?,
            _ => (),
        }
    }

    Ok(values)
}

/// Parse a decoded field into a number.
pub fn parse_number<T: FromStr>(field: &str, value: &str) -> BookingResult<T> {
    value.trim().parse().map_err(|_| {
        BookingError::Parse(format!("expected a number for {}, got '{}'", field, value))
    })
}

// Character data only; comments and processing instructions are skipped
fn push_content(text: &mut String, event: Event<'_>) -> BookingResult<()> {
    match event {
        Event::Text(t) => text.push_str(&unescape_str(utf8(&t)?)?),
        Event::CData(c) => text.push_str(utf8(&c)?),
        Event::GeneralRef(r) => text.push_str(&unescape_str(&format!("&{};", utf8(&r)?))?),
        _ => (),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> BookingResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| BookingError::Parse(e.to_string()))
}

fn unescape_str(raw: &str) -> BookingResult<String> {
    unescape(raw)
        .map(|s| s.into_owned())
        .map_err(|e| BookingError::Parse(e.to_string()))
}
