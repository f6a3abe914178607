//! Profile generic (class 7) tabular reader.
//!
//! A profile generic buffer is an array of rows, each row a structure with
//! one cell per capture object. Reads are flattened into a
//! [`TabularResult`] whose column names are the capture objects' logical
//! names.
//!
//! | ID | Attribute       | Type                   |
//! |----|-----------------|------------------------|
//! | 2  | buffer          | array of structure     |
//! | 3  | capture_objects | array of structure(4)  |
//! | 4  | capture_period  | double-long-unsigned   |
//! | 5  | sort_method     | enum                   |
//! | 6  | sort_object     | structure(4) or null   |
//! | 7  | entries_in_use  | double-long-unsigned   |
//! | 8  | profile_entries | double-long-unsigned   |

use crate::codec::Codec;
use crate::data::TypedValue;
use crate::error::{Error, Result};
use crate::marshal::marshal_value;
use crate::obis_code::ObisCode;
use crate::session::{CLOCK_CLASS_ID, CLOCK_TIME_ATTRIBUTE_ID, MeterSession, clock_value};
use crate::tabular::{ERROR_PLACEHOLDER, TabularResult};
use crate::transport::Connector;

pub const PROFILE_GENERIC_CLASS_ID: u16 = 7;

const BUFFER: i8 = 2;
const CAPTURE_OBJECTS: i8 = 3;
const CAPTURE_PERIOD: i8 = 4;
const SORT_METHOD: i8 = 5;
const SORT_OBJECT: i8 = 6;
const ENTRIES_IN_USE: i8 = 7;
const PROFILE_ENTRIES: i8 = 8;

/// One column definition: the captured attribute of another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CaptureObject {
    pub class_id: u16,
    pub logical_name: ObisCode,
    pub attribute_index: i8,
    /// 0 captures the whole attribute.
    pub data_index: u16,
}

impl CaptureObject {
    /// Decodes `structure { class_id, logical_name, attribute_index, data_index }`.
    pub fn from_value(value: &TypedValue) -> Option<Self> {
        let [class_id, logical_name, attribute_index, rest @ ..] = value.as_elements()? else {
            return None;
        };
        let data_index = match rest.first() {
            Some(data_index) => u16::try_from(data_index.as_integer()?).ok()?,
            None => 0,
        };

        Some(Self {
            class_id: u16::try_from(class_id.as_integer()?).ok()?,
            logical_name: ObisCode::from_slice(logical_name.as_bytes()?)?,
            attribute_index: i8::try_from(attribute_index.as_integer()?).ok()?,
            data_index,
        })
    }

    fn is_clock_time(&self) -> bool {
        self.class_id == CLOCK_CLASS_ID && self.attribute_index == CLOCK_TIME_ATTRIBUTE_ID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SortMethod {
    Fifo = 1,
    Lifo = 2,
    Largest = 3,
    Smallest = 4,
    NearestToZero = 5,
    FarthestFromZero = 6,
}

impl SortMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(SortMethod::Fifo),
            2 => Some(SortMethod::Lifo),
            3 => Some(SortMethod::Largest),
            4 => Some(SortMethod::Smallest),
            5 => Some(SortMethod::NearestToZero),
            6 => Some(SortMethod::FarthestFromZero),
            _ => None,
        }
    }
}

/// Metadata of one profile generic object, reused across page reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileHandle {
    logical_name: ObisCode,
    capture_objects: Vec<Option<CaptureObject>>,
    column_names: Vec<String>,
    capture_period: u32,
    sort_method: Option<SortMethod>,
    sort_object: Option<CaptureObject>,
    entries_in_use: u32,
    profile_entries: u32,
    buffer: Vec<TypedValue>,
}

impl ProfileHandle {
    pub fn logical_name(&self) -> ObisCode {
        self.logical_name
    }

    /// Capture objects in column order; `None` where an entry could not be
    /// decoded.
    pub fn capture_objects(&self) -> &[Option<CaptureObject>] {
        &self.capture_objects
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Capture period in seconds; 0 for event-driven profiles.
    pub fn capture_period(&self) -> u32 {
        self.capture_period
    }

    /// `None` when the meter reported an unknown sort method.
    pub fn sort_method(&self) -> Option<SortMethod> {
        self.sort_method
    }

    pub fn sort_object(&self) -> Option<&CaptureObject> {
        self.sort_object.as_ref()
    }

    pub fn entries_in_use(&self) -> u32 {
        self.entries_in_use
    }

    pub fn profile_entries(&self) -> u32 {
        self.profile_entries
    }

    /// Number of rows buffered by the last page read.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Raw rows of the last page read.
    pub fn buffer(&self) -> &[TypedValue] {
        &self.buffer
    }
}

fn capture_object_list(value: &TypedValue) -> Result<Vec<Option<CaptureObject>>> {
    let entries = match value {
        TypedValue::Array(entries) => entries,
        other => {
            return Err(Error::InvalidResponse(format!(
                "capture objects: expected an array, got type {}",
                other.tag()
            )));
        }
    };

    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let capture_object = CaptureObject::from_value(entry);
            if capture_object.is_none() {
                log::debug!("capture object {} cannot be decoded: {:?}", index, entry);
            }
            capture_object
        })
        .collect())
}

fn column_names(capture_objects: &[Option<CaptureObject>]) -> Vec<String> {
    capture_objects
        .iter()
        .enumerate()
        .map(|(index, capture_object)| match capture_object {
            Some(capture_object) => capture_object.logical_name.to_string(),
            None => format!("Column_{}", index),
        })
        .collect()
}

fn buffer_rows(value: TypedValue) -> Result<Vec<TypedValue>> {
    match value {
        TypedValue::Array(rows) => Ok(rows),
        other => Err(Error::InvalidResponse(format!("buffer: expected an array, got type {}", other.tag()))),
    }
}

fn format_cell(capture_object: Option<&CaptureObject>, cell: &TypedValue) -> String {
    match capture_object {
        Some(capture_object) if capture_object.is_clock_time() => marshal_value(&clock_value(cell.clone())),
        _ => marshal_value(cell),
    }
}

/// Flattens buffer rows into a table with one column per capture object.
fn flatten(column_names: &[String], capture_objects: &[Option<CaptureObject>], rows: &[TypedValue]) -> TabularResult {
    let mut table = TabularResult::builder(column_names.to_vec());

    for (index, row) in rows.iter().enumerate() {
        let Some(cells) = row.as_elements() else {
            log::debug!("buffer row {} is not a structure", index);
            table.push_row(vec![ERROR_PLACEHOLDER.to_owned(); column_names.len()]);
            continue;
        };
        if cells.len() < column_names.len() {
            log::debug!("buffer row {} has {} of {} cells", index, cells.len(), column_names.len());
        }

        let row = cells
            .iter()
            .take(column_names.len())
            .enumerate()
            .map(|(column, cell)| format_cell(capture_objects.get(column).and_then(Option::as_ref), cell))
            .collect();
        table.push_row(row);
    }

    table.finish()
}

fn unsigned_attribute(name: &str, value: &TypedValue) -> Result<u32> {
    value
        .as_integer()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::InvalidResponse(format!("{}: expected an unsigned integer, got {:?}", name, value)))
}

impl<C: Connector, K: Codec> MeterSession<C, K> {
    fn read_capture_objects(&mut self, obis: &ObisCode, attribute: i8) -> Result<Vec<Option<CaptureObject>>> {
        let value = self.read_value(PROFILE_GENERIC_CLASS_ID, obis, attribute)?;
        capture_object_list(&value)
    }

    fn read_buffer_page(&mut self, obis: &ObisCode, start_index: u32, count: u32) -> Result<Vec<TypedValue>> {
        log::debug!("read {} entries {}..{}", obis, start_index, start_index.saturating_add(count.saturating_sub(1)));
        let replies = self.exchange(|codec| {
            codec.read_rows_by_entry_request(PROFILE_GENERIC_CLASS_ID, obis, BUFFER, start_index, count)
        })?;
        let value = replies
            .into_iter()
            .last()
            .and_then(|reply| reply.value)
            .ok_or_else(|| Error::InvalidResponse(format!("{} buffer returned no data", obis)))?;
        buffer_rows(value)
    }

    /// Reads the first page (`max_entries` rows) of a profile generic.
    pub fn read_profile_generic(&mut self, obis: &str) -> Result<TabularResult> {
        let obis = self.resolve(obis)?;
        let attribute = self.config().attribute_index;
        let max_entries = self.config().max_entries;

        let capture_objects = self.read_capture_objects(&obis, attribute)?;
        let names = column_names(&capture_objects);
        let rows = self.read_buffer_page(&obis, 1, max_entries)?;

        Ok(flatten(&names, &capture_objects, &rows))
    }

    /// Reads the metadata of a profile generic into a reusable handle.
    pub fn open_profile_generic(&mut self, obis: &str) -> Result<ProfileHandle> {
        let obis = self.resolve(obis)?;

        let capture_objects = self.read_capture_objects(&obis, CAPTURE_OBJECTS)?;
        let capture_period =
            unsigned_attribute("capture period", &self.read_value(PROFILE_GENERIC_CLASS_ID, &obis, CAPTURE_PERIOD)?)?;

        let sort_method = match self.read_value(PROFILE_GENERIC_CLASS_ID, &obis, SORT_METHOD)? {
            TypedValue::Enum(value) => SortMethod::from_u8(value),
            other => return Err(Error::InvalidResponse(format!("sort method: expected an enum, got {:?}", other))),
        };

        let sort_object = match self.read_value(PROFILE_GENERIC_CLASS_ID, &obis, SORT_OBJECT)? {
            TypedValue::Null => None,
            other => CaptureObject::from_value(&other),
        };

        let entries_in_use =
            unsigned_attribute("entries in use", &self.read_value(PROFILE_GENERIC_CLASS_ID, &obis, ENTRIES_IN_USE)?)?;
        let profile_entries =
            unsigned_attribute("profile entries", &self.read_value(PROFILE_GENERIC_CLASS_ID, &obis, PROFILE_ENTRIES)?)?;

        log::debug!("opened {}: {} columns, {} of {} entries", obis, capture_objects.len(), entries_in_use, profile_entries);

        Ok(ProfileHandle {
            logical_name: obis,
            column_names: column_names(&capture_objects),
            capture_objects,
            capture_period,
            sort_method,
            sort_object,
            entries_in_use,
            profile_entries,
            buffer: Vec::new(),
        })
    }

    /// Reads `count` rows starting at the 1-based `start_index` into `handle`.
    ///
    /// Previously buffered rows are dropped first. Capture objects are not
    /// read again.
    pub fn read_rows(&mut self, handle: &mut ProfileHandle, start_index: u32, count: u32) -> Result<TabularResult> {
        self.ensure_connected()?;
        if start_index == 0 || count == 0 {
            return Err(Error::invalid_config("start index and count must be positive"));
        }

        handle.buffer.clear();
        handle.buffer = self.read_buffer_page(&handle.logical_name, start_index, count)?;

        Ok(flatten(&handle.column_names, &handle.capture_objects, &handle.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Authentication, LnCodec, Security};
    use crate::data::DateTime;
    use crate::test_support::{MockConnector, Script, aare_accepted, get_error, get_response};

    const LOAD_PROFILE: &str = "1.0.99.1.0.255";

    fn capture(class_id: u16, obis: [u8; 6], attribute: i8) -> TypedValue {
        TypedValue::Structure(vec![
            TypedValue::LongUnsigned(class_id),
            TypedValue::OctetString(obis.to_vec()),
            TypedValue::Integer(attribute),
            TypedValue::LongUnsigned(0),
        ])
    }

    fn capture_objects() -> TypedValue {
        TypedValue::Array(vec![capture(8, [0, 0, 1, 0, 0, 255], 2), capture(3, [1, 0, 1, 8, 0, 255], 2)])
    }

    fn connected(script: &Script) -> MeterSession<MockConnector> {
        script.reply(aare_accepted());
        let mut session = MeterSession::with_parts(MockConnector::new(script.clone()), LnCodec::new());
        session.set_host("meter.local").unwrap();
        session.set_authentication(Authentication::None);
        session.set_security(Security::None);
        session.connect().unwrap();
        session
    }

    fn clock_cell(timestamp: i64) -> (TypedValue, String) {
        let date_time = DateTime::from_unix(timestamp).unwrap();
        let text = date_time.to_string();
        (TypedValue::OctetString(date_time.to_bytes()), text)
    }

    #[test]
    fn test_capture_object_from_value() {
        let object = CaptureObject::from_value(&capture(3, [1, 0, 1, 8, 0, 255], 2)).unwrap();

        assert_eq!(object.class_id, 3);
        assert_eq!(object.logical_name, ObisCode::new(1, 0, 1, 8, 0, 255));
        assert_eq!(object.attribute_index, 2);

        let short_name = TypedValue::Structure(vec![
            TypedValue::LongUnsigned(3),
            TypedValue::OctetString(vec![1, 0, 1]),
            TypedValue::Integer(2),
            TypedValue::LongUnsigned(0),
        ]);
        assert_eq!(CaptureObject::from_value(&short_name), None);
        assert_eq!(CaptureObject::from_value(&TypedValue::Null), None);
    }

    #[test]
    fn test_column_names_fall_back_to_index() {
        let list = capture_object_list(&TypedValue::Array(vec![
            capture(3, [1, 0, 1, 8, 0, 255], 2),
            TypedValue::Unsigned(9),
        ]))
        .unwrap();

        assert_eq!(column_names(&list), ["1.0.1.8.0.255", "Column_1"]);
    }

    #[test]
    fn test_flatten_pads_short_and_bad_rows() {
        let list = capture_object_list(&capture_objects()).unwrap();
        let names = column_names(&list);
        let (clock, clock_text) = clock_cell(1_704_067_200);

        let rows = vec![
            TypedValue::Structure(vec![clock.clone(), TypedValue::DoubleLongUnsigned(1200)]),
            TypedValue::Structure(vec![clock]),
            TypedValue::Unsigned(1),
        ];
        let table = flatten(&names, &list, &rows);

        assert_eq!(table.rows(), 3);
        assert_eq!(table.columns(), 2);
        assert_eq!(table.cell(0, 0), Some(clock_text.as_str()));
        assert_eq!(table.cell(0, 1), Some("1200"));
        assert_eq!(table.cell(1, 1), Some(ERROR_PLACEHOLDER));
        assert_eq!(table.cell(2, 0), Some(ERROR_PLACEHOLDER));
    }

    #[test]
    fn test_one_shot_read() {
        let script = Script::new();
        let mut session = connected(&script);
        let (clock, clock_text) = clock_cell(1_704_067_200);

        script.reply(get_response(&capture_objects()));
        script.reply(get_response(&TypedValue::Array(vec![TypedValue::Structure(vec![
            clock,
            TypedValue::DoubleLongUnsigned(42),
        ])])));

        let table = session.read_profile_generic(LOAD_PROFILE).unwrap();

        assert_eq!(table.column_names(), ["0.0.1.0.0.255", "1.0.1.8.0.255"]);
        assert_eq!(table.cell_by_name(0, "0.0.1.0.0.255"), Some(clock_text.as_str()));
        assert_eq!(table.parse_cell::<u32>(0, "1.0.1.8.0.255"), Some(42));

        let sent = script.sent();
        // capture objects (attribute 3), then entries 1..=10 of the buffer
        assert_eq!(sent[1][8 + 11], 3);
        assert_eq!(&sent[2][8 + 11..8 + 13], &[0x02, 0x01]);
        assert_eq!(&sent[2][8 + 16..8 + 26], &[0x06, 0, 0, 0, 1, 0x06, 0, 0, 0, 10]);
    }

    #[test]
    fn test_one_shot_stops_at_failed_capture_read() {
        let script = Script::new();
        let mut session = connected(&script);
        script.reply(get_error(4));

        assert!(matches!(session.read_profile_generic(LOAD_PROFILE), Err(Error::Rejected { status: 4, .. })));
        assert_eq!(script.sent().len(), 2);
    }

    fn open(script: &Script, session: &mut MeterSession<MockConnector>) -> ProfileHandle {
        script.reply(get_response(&capture_objects()));
        script.reply(get_response(&TypedValue::DoubleLongUnsigned(900)));
        script.reply(get_response(&TypedValue::Enum(1)));
        script.reply(get_response(&TypedValue::Null));
        script.reply(get_response(&TypedValue::DoubleLongUnsigned(96)));
        script.reply(get_response(&TypedValue::DoubleLongUnsigned(2880)));
        session.open_profile_generic(LOAD_PROFILE).unwrap()
    }

    #[test]
    fn test_open_reads_metadata() {
        let script = Script::new();
        let mut session = connected(&script);
        let handle = open(&script, &mut session);

        assert_eq!(handle.logical_name(), ObisCode::new(1, 0, 99, 1, 0, 255));
        assert_eq!(handle.column_names(), ["0.0.1.0.0.255", "1.0.1.8.0.255"]);
        assert_eq!(handle.capture_period(), 900);
        assert_eq!(handle.sort_method(), Some(SortMethod::Fifo));
        assert_eq!(handle.sort_object(), None);
        assert_eq!(handle.entries_in_use(), 96);
        assert_eq!(handle.profile_entries(), 2880);
        assert_eq!(handle.buffer_size(), 0);

        let attributes: Vec<u8> = script.sent()[1..].iter().map(|m| m[8 + 11]).collect();
        assert_eq!(attributes, [3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_open_fails_on_wrong_shape() {
        let script = Script::new();
        let mut session = connected(&script);
        script.reply(get_response(&capture_objects()));
        script.reply(get_response(&TypedValue::VisibleString(b"900".to_vec())));

        let err = session.open_profile_generic(LOAD_PROFILE).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
        assert_eq!(script.sent().len(), 3);
    }

    #[test]
    fn test_read_rows_reuses_metadata() {
        let script = Script::new();
        let mut session = connected(&script);
        let mut handle = open(&script, &mut session);

        let row = |energy| TypedValue::Structure(vec![TypedValue::Null, TypedValue::DoubleLongUnsigned(energy)]);
        script.reply(get_response(&TypedValue::Array(vec![row(1), row(2), row(3)])));
        let table = session.read_rows(&mut handle, 5, 3).unwrap();

        assert_eq!(table.rows(), 3);
        assert_eq!(table.cell(0, 0), Some("[Type 0 not handled]"));
        assert_eq!(table.cell(2, 1), Some("3"));
        assert_eq!(handle.buffer_size(), 3);

        script.reply(get_response(&TypedValue::Array(vec![row(4)])));
        let table = session.read_rows(&mut handle, 8, 1).unwrap();
        assert_eq!(table.rows(), 1);
        assert_eq!(handle.buffer_size(), 1);

        // eight metadata/page reads after the association, no capture object re-read
        let sent = script.sent();
        assert_eq!(sent.len(), 1 + 6 + 2);
        assert_eq!(&sent[7][8 + 16..8 + 26], &[0x06, 0, 0, 0, 5, 0x06, 0, 0, 0, 7]);
    }

    #[test]
    fn test_read_rows_failure_clears_buffer() {
        let script = Script::new();
        let mut session = connected(&script);
        let mut handle = open(&script, &mut session);

        script.reply(get_response(&TypedValue::Array(vec![TypedValue::Structure(vec![])])));
        session.read_rows(&mut handle, 1, 1).unwrap();
        assert_eq!(handle.buffer_size(), 1);

        script.reply(get_error(2));
        assert!(session.read_rows(&mut handle, 2, 1).is_err());
        assert_eq!(handle.buffer_size(), 0);

        assert!(matches!(session.read_rows(&mut handle, 0, 1), Err(Error::InvalidConfiguration(_))));
    }
}
