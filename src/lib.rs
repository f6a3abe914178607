//! A synchronous DLMS/COSEM client session layer.
//!
//! [`MeterSession`] connects to a meter over the IEC 62056-47 TCP wrapper,
//! associates (no security, LLS password or HLS-GMAC, optionally
//! glo-ciphered) and then reads attributes, pages through profile generic
//! buffers, lists the association's objects, writes attributes and invokes
//! methods. Every operation blocks until the meter answers.
//!
//! ```no_run
//! use dlms_meter::{Authentication, MeterSession, Security};
//!
//! # fn main() -> dlms_meter::Result<()> {
//! let mut session = MeterSession::new();
//! session.set_host("10.0.0.17")?;
//! session.set_authentication(Authentication::HighGmac);
//! session.set_security(Security::AuthenticationEncryption);
//! session.set_system_title("4D4D4D0000BC614E")?;
//! session.set_block_cipher_key("000102030405060708090A0B0C0D0E0F")?;
//! session.set_authentication_key("D0D1D2D3D4D5D6D7D8D9DADBDCDDDEDF")?;
//! session.connect()?;
//!
//! let mut profile = session.open_profile_generic("1.0.99.1.0.255")?;
//! let table = session.read_rows(&mut profile, 1, 96)?;
//! for row in table.iter_rows() {
//!     println!("{}", row.join(";"));
//! }
//!
//! session.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`session`], [`profile_generic`], [`association_view`], [`dispatch`]:
//!   the public operations.
//! - [`exchange`]: drives a message sequence over a [`Transport`].
//! - [`codec`]: the [`Codec`] seam and its logical-name implementation.
//! - [`association`], [`get`], [`set`], [`action`], [`general_glo_ciphering`]:
//!   APDU encoders and parsers.
//! - [`data`], [`marshal`], [`obis_code`]: values and their text forms.
//!
//! # Features
//!
//! - `transport-tcp` (default): the std TCP connector and
//!   [`MeterSession::new`].
//! - `serde`: `Serialize` for results, `Deserialize` for [`MeterConfig`].

pub mod action;
pub mod association;
pub mod association_view;
pub mod codec;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod general_glo_ciphering;
pub mod get;
pub mod marshal;
pub mod obis_code;
pub mod profile_generic;
pub mod security_control;
pub mod session;
pub mod set;
pub mod tabular;
pub mod trace;
pub mod transport;
pub mod wrapper;

#[cfg(test)]
mod lib_tests;
#[cfg(test)]
mod test_support;

pub use association_view::{AssociationView, AttributeAccessMode, MethodAccessMode, ObjectEntry};
pub use codec::{Authentication, Codec, CodecError, Command, InterfaceType, LnCodec, Reply, Security};
pub use data::{DataType, Date, DateTime, Time, TypedValue};
pub use error::{Error, Result, Stage};
pub use marshal::marshal;
pub use obis_code::{ObisCode, ObisError};
pub use profile_generic::{CaptureObject, ProfileHandle, SortMethod};
pub use security_control::SecurityControl;
pub use session::{MeterConfig, MeterSession, SessionConfig};
pub use tabular::TabularResult;
pub use transport::{Connector, Transport};
#[cfg(feature = "transport-tcp")]
pub use transport::tcp::{TcpConnector, TcpTransport};
