//! Object list of the current association.
//!
//! The Association LN object (`0.0.40.0.0.255`, class 15) exposes in
//! attribute 2 every object visible to the client together with its access
//! rights:
//!
//! ```text
//! object_list_element ::= structure {
//!     class_id        long-unsigned,
//!     version         unsigned,
//!     logical_name    octet-string(6),
//!     access_rights   structure {
//!         attribute_access  array of structure { attribute_id, access_mode, access_selectors },
//!         method_access     array of structure { method_id, access_mode },
//!     },
//! }
//! ```

use core::fmt;

use crate::codec::Codec;
use crate::data::TypedValue;
use crate::error::{Error, Result};
use crate::obis_code::ObisCode;
use crate::session::MeterSession;
use crate::transport::Connector;

pub const ASSOCIATION_LN_CLASS_ID: u16 = 15;
pub const CURRENT_ASSOCIATION: ObisCode = ObisCode::new(0, 0, 40, 0, 0, 255);

const OBJECT_LIST: i8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeAccessMode {
    None,
    Read,
    Write,
    ReadWrite,
    AuthenticatedRead,
    AuthenticatedWrite,
    AuthenticatedReadWrite,
    Unknown(u8),
}

impl AttributeAccessMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Read,
            2 => Self::Write,
            3 => Self::ReadWrite,
            4 => Self::AuthenticatedRead,
            5 => Self::AuthenticatedWrite,
            6 => Self::AuthenticatedReadWrite,
            other => Self::Unknown(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read-write",
            Self::AuthenticatedRead => "authenticated-read",
            Self::AuthenticatedWrite => "authenticated-write",
            Self::AuthenticatedReadWrite => "authenticated-read-write",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for AttributeAccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MethodAccessMode {
    None,
    Access,
    AuthenticatedAccess,
    AuthenticatedRequest,
    EncryptedRequest,
    DigitallySignedRequest,
    AuthenticatedResponse,
    EncryptedResponse,
    DigitallySignedResponse,
    Unknown(u8),
}

impl MethodAccessMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Access,
            2 => Self::AuthenticatedAccess,
            4 => Self::AuthenticatedRequest,
            8 => Self::EncryptedRequest,
            16 => Self::DigitallySignedRequest,
            32 => Self::AuthenticatedResponse,
            64 => Self::EncryptedResponse,
            128 => Self::DigitallySignedResponse,
            other => Self::Unknown(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Access => "access",
            Self::AuthenticatedAccess => "authenticated-access",
            Self::AuthenticatedRequest => "authenticated-request",
            Self::EncryptedRequest => "encrypted-request",
            Self::DigitallySignedRequest => "digitally-signed-request",
            Self::AuthenticatedResponse => "authenticated-response",
            Self::EncryptedResponse => "encrypted-response",
            Self::DigitallySignedResponse => "digitally-signed-response",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for MethodAccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name, attribute count and method count of the known interface classes.
#[rustfmt::skip]
fn interface_class(class_id: u16) -> Option<(&'static str, usize, usize)> {
    Some(match class_id {
        1  => ("Data", 2, 0),
        3  => ("Register", 3, 1),
        4  => ("Extended register", 5, 1),
        5  => ("Demand register", 9, 2),
        6  => ("Register activation", 4, 3),
        7  => ("Profile generic", 8, 4),
        8  => ("Clock", 9, 6),
        9  => ("Script table", 2, 1),
        10 => ("Schedule", 2, 3),
        11 => ("Special days table", 2, 2),
        12 => ("Association SN", 4, 8),
        15 => ("Association LN", 11, 6),
        17 => ("SAP assignment", 2, 1),
        18 => ("Image transfer", 7, 4),
        19 => ("IEC local port setup", 9, 0),
        20 => ("Activity calendar", 10, 1),
        21 => ("Register monitor", 4, 0),
        22 => ("Single action schedule", 4, 0),
        23 => ("IEC HDLC setup", 9, 0),
        26 => ("Utility tables", 4, 0),
        40 => ("Push setup", 7, 1),
        41 => ("TCP-UDP setup", 6, 0),
        42 => ("IPv4 setup", 10, 3),
        64 => ("Security setup", 5, 2),
        70 => ("Disconnect control", 4, 2),
        71 => ("Limiter", 9, 0),
        _ => return None,
    })
}

/// One object of the association's object list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectEntry {
    pub logical_name: ObisCode,
    pub class_id: u16,
    pub version: u8,
    pub attribute_count: usize,
    pub method_count: usize,
    /// Access of attributes `1..=attribute_count`.
    pub attribute_access: Vec<AttributeAccessMode>,
    /// Access of methods `1..=method_count`.
    pub method_access: Vec<MethodAccessMode>,
}

impl ObjectEntry {
    /// Name of the interface class, `"Unknown"` for classes not in the table.
    pub fn class_name(&self) -> &'static str {
        interface_class(self.class_id).map_or("Unknown", |(name, _, _)| name)
    }

    /// Access of the 1-based attribute `index`.
    pub fn attribute_access(&self, index: usize) -> Option<AttributeAccessMode> {
        self.attribute_access.get(index.checked_sub(1)?).copied()
    }

    /// Access of the 1-based method `index`.
    pub fn method_access(&self, index: usize) -> Option<MethodAccessMode> {
        self.method_access.get(index.checked_sub(1)?).copied()
    }

    fn from_value(value: &TypedValue) -> Option<Self> {
        let [class_id, version, logical_name, rest @ ..] = value.as_elements()? else {
            return None;
        };
        let class_id = u16::try_from(class_id.as_integer()?).ok()?;
        let version = u8::try_from(version.as_integer()?).ok()?;
        let logical_name = ObisCode::from_slice(logical_name.as_bytes()?)?;

        let (attribute_items, method_items) = match rest.first().and_then(TypedValue::as_elements) {
            Some([attributes, methods, ..]) => (attributes.as_elements(), methods.as_elements()),
            Some([attributes]) => (attributes.as_elements(), None),
            _ => (None, None),
        };
        let attribute_items = attribute_items.unwrap_or_default();
        let method_items = method_items.unwrap_or_default();

        let (attribute_count, method_count) = match interface_class(class_id) {
            Some((_, attributes, methods)) => (attributes, methods),
            None => (attribute_items.len(), method_items.len()),
        };

        let attribute_access = (1..=attribute_count)
            .map(|id| {
                access_code(attribute_items, id).map_or(AttributeAccessMode::ReadWrite, AttributeAccessMode::from_code)
            })
            .collect();
        let method_access = (1..=method_count)
            .map(|id| access_code(method_items, id).map_or(MethodAccessMode::Access, MethodAccessMode::from_code))
            .collect();

        Some(Self { logical_name, class_id, version, attribute_count, method_count, attribute_access, method_access })
    }
}

/// Access code of the item whose id is `id`. Method access of older meters
/// is a boolean.
fn access_code(items: &[TypedValue], id: usize) -> Option<u8> {
    items.iter().find_map(|item| {
        let [item_id, mode, ..] = item.as_elements()? else {
            return None;
        };
        if usize::try_from(item_id.as_integer()?).ok()? != id {
            return None;
        }
        match mode {
            TypedValue::Boolean(allowed) => Some(u8::from(*allowed)),
            mode => u8::try_from(mode.as_integer()?).ok(),
        }
    })
}

/// Objects visible in the current association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssociationView {
    objects: Vec<ObjectEntry>,
}

impl AssociationView {
    /// Builds the view from an object list value. Elements that are not
    /// object descriptions are skipped.
    pub fn from_object_list(value: &TypedValue) -> Result<Self> {
        let TypedValue::Array(elements) = value else {
            return Err(Error::InvalidResponse(format!("object list: expected an array, got type {}", value.tag())));
        };

        let objects = elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let entry = ObjectEntry::from_value(element);
                if entry.is_none() {
                    log::debug!("object list element {} skipped: {:?}", index, element);
                }
                entry
            })
            .collect();

        Ok(Self { objects })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[ObjectEntry] {
        &self.objects
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.objects.iter()
    }

    pub fn find(&self, logical_name: &ObisCode) -> Option<&ObjectEntry> {
        self.objects.iter().find(|entry| entry.logical_name == *logical_name)
    }
}

impl<C: Connector, K: Codec> MeterSession<C, K> {
    /// Reads the object list of the current association.
    pub fn association_view(&mut self) -> Result<AssociationView> {
        self.ensure_connected()?;
        let value = self.read_value(ASSOCIATION_LN_CLASS_ID, &CURRENT_ASSOCIATION, OBJECT_LIST)?;
        let view = AssociationView::from_object_list(&value)?;
        log::debug!("association exposes {} objects", view.len());
        Ok(view)
    }
}
