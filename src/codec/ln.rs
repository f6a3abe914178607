use nom::error::ErrorKind;

use super::{
    Authentication, Codec, CodecError, CodecSettings, Command, INVOKE_ID_AND_PRIORITY, Reply, Security,
};
use crate::SecurityControl;
use crate::action::{ActionRequestNormal, ActionResponseNormal, MethodDescriptor};
use crate::association::initiate::{CONFIRMED_SERVICE_ERROR_TAG, parse_confirmed_service_error};
use crate::association::{
    AARE_TAG, AareApdu, AarqApdu, ApplicationContextName, AssociationResult, InitiateRequest, InitiateResponse,
    MechanismName, RLRE_TAG, encode_release_request,
};
use crate::data::TypedValue;
use crate::general_glo_ciphering::{self as glo, GloCipher, TAG_LEN};
use crate::get::{AccessSelector, AttributeDescriptor, GetDataBlockResult, GetDataResult, GetRequest, GetResponse};
use crate::obis_code::ObisCode;
use crate::set::{SetRequestNormal, SetResponseNormal};
use crate::wrapper::{encode_frame, split_frame};

const EXCEPTION_RESPONSE_TAG: u8 = 0xD8;

/// Association LN object answering HLS pass 3.
const ASSOCIATION_LN: ObisCode = ObisCode::new(0, 0, 40, 0, 0, 255);
const ASSOCIATION_LN_CLASS: u16 = 15;
const REPLY_TO_HLS_AUTHENTICATION: i8 = 1;

/// HLS challenge length.
const CHALLENGE_LEN: usize = 16;

/// Security control of HLS-GMAC pass 3/4 tags.
const HLS_SECURITY_CONTROL: SecurityControl = SecurityControl::new(0x10);

/// Upper bound on a value reassembled from data blocks.
const MAX_BLOCK_DATA: usize = 1 << 20;

/// Logical-name referencing codec over the TCP wrapper.
#[derive(Debug, Default)]
pub struct LnCodec {
    settings: Option<CodecSettings>,
    cipher: Option<GloCipher>,
    invocation_counter: u32,
    client_challenge: Vec<u8>,
    server_challenge: Option<Vec<u8>>,
    server_system_title: Option<[u8; 8]>,
    authentication_pending: bool,
    block: Option<BlockTransfer>,
    negotiated: Option<InitiateResponse>,
}

#[derive(Debug, Default)]
struct BlockTransfer {
    block_number: u32,
    data: Vec<u8>,
}

impl LnCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters the meter returned in its InitiateResponse.
    pub fn negotiated(&self) -> Option<&InitiateResponse> {
        self.negotiated.as_ref()
    }

    fn settings(&self) -> Result<&CodecSettings, CodecError> {
        self.settings.as_ref().ok_or(CodecError::MissingSecurityMaterial("codec settings"))
    }

    fn security_control(&self) -> Result<Option<SecurityControl>, CodecError> {
        Ok(match self.settings()?.security {
            Security::None => None,
            Security::Authentication => Some(SecurityControl::from_flags(true, false)),
            Security::Encryption => Some(SecurityControl::from_flags(false, true)),
            Security::AuthenticationEncryption => Some(SecurityControl::from_flags(true, true)),
        })
    }

    fn client_system_title(&self) -> Result<[u8; 8], CodecError> {
        self.settings()?.system_title.ok_or(CodecError::MissingSecurityMaterial("system title"))
    }

    fn cipher(&self) -> Result<&GloCipher, CodecError> {
        self.cipher.as_ref().ok_or(CodecError::MissingSecurityMaterial("block cipher key"))
    }

    /// Protects `apdu` with the next invocation counter.
    fn protect(&mut self, glo_tag: u8, security_control: SecurityControl, apdu: &[u8]) -> Result<Vec<u8>, CodecError> {
        let system_title = self.client_system_title()?;
        let protected = self.cipher()?.encrypt(security_control, &system_title, self.invocation_counter, apdu)?;
        self.invocation_counter = self.invocation_counter.wrapping_add(1);
        Ok(glo::wrap(glo_tag, &protected))
    }

    /// Applies the configured protection to an xDLMS request and frames it.
    fn frame(&mut self, apdu: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let apdu = match (self.security_control()?, apdu.first().copied().and_then(glo::glo_request_tag)) {
            (Some(security_control), Some(glo_tag)) => self.protect(glo_tag, security_control, &apdu)?,
            _ => apdu,
        };
        self.frame_raw(&apdu)
    }

    fn frame_raw(&self, apdu: &[u8]) -> Result<Vec<u8>, CodecError> {
        let settings = self.settings()?;
        let frame = encode_frame(settings.client_address, settings.server_address, apdu)
            .ok_or(CodecError::TooLarge(apdu.len()))?;
        log::trace!("framed {} byte APDU", apdu.len());
        Ok(frame)
    }

    fn unprotect(&self, apdu: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (_, (_, protected)) = glo::unwrap(apdu).map_err(|_| CodecError::Malformed("glo APDU"))?;
        let system_title =
            self.server_system_title.ok_or(CodecError::MissingSecurityMaterial("server system title"))?;
        Ok(self.cipher()?.decrypt(&system_title, protected)?)
    }

    fn check_invoke_id(actual: u8) -> Result<(), CodecError> {
        if actual != INVOKE_ID_AND_PRIORITY {
            return Err(CodecError::InvokeIdMismatch { expected: INVOKE_ID_AND_PRIORITY, actual });
        }
        Ok(())
    }

    fn decode_aare(&mut self, apdu: &[u8]) -> Result<Reply, CodecError> {
        let (_, aare) = AareApdu::parse(apdu).map_err(|_| CodecError::Malformed("AARE"))?;

        if aare.result != AssociationResult::Accepted {
            log::debug!("association {} ({})", aare.result, aare.result_source_diagnostic);
            return Ok(Reply::new(Command::Aare, aare.result.as_u8(), None));
        }

        if let Some(title) = aare.responding_ap_title.as_deref() {
            let title: [u8; 8] = title.try_into().map_err(|_| CodecError::Malformed("responding AP title"))?;
            self.server_system_title = Some(title);
        }
        self.server_challenge = aare.responding_authentication_value.clone();
        self.authentication_pending = aare.requires_authentication();

        let user_information = aare.user_information.ok_or(CodecError::Malformed("AARE user information"))?;
        let initiate = match user_information.first() {
            Some(&glo::GLO_INITIATE_RESPONSE) => self.unprotect(&user_information)?,
            _ => user_information,
        };

        if initiate.first() == Some(&CONFIRMED_SERVICE_ERROR_TAG) {
            let (_, (service, class, code)) =
                parse_confirmed_service_error(&initiate).map_err(|_| CodecError::Malformed("service error"))?;
            return Err(CodecError::ServiceError { service, class, code });
        }

        let (_, response) = InitiateResponse::parse(&initiate).map_err(|_| CodecError::Malformed("InitiateResponse"))?;
        log::debug!(
            "association accepted: conformance {:?}, max PDU {}",
            response.negotiated_conformance,
            response.server_max_receive_pdu_size
        );
        self.negotiated = Some(response);

        Ok(Reply::new(Command::Aare, 0, None))
    }

    fn decode_get(&mut self, apdu: &[u8]) -> Result<Reply, CodecError> {
        let (_, response) = GetResponse::parse(apdu).map_err(|_| CodecError::Malformed("GET response"))?;
        Self::check_invoke_id(response.invoke_id())?;

        match response {
            GetResponse::Normal { result: GetDataResult::Data(value), .. } => {
                Ok(Reply::new(Command::GetResponse, 0, Some(value)))
            }
            GetResponse::Normal { result: GetDataResult::DataAccessError(code), .. } => {
                Ok(Reply::new(Command::GetResponse, code, None))
            }
            GetResponse::WithDataBlock { result: GetDataBlockResult::DataAccessError(code), .. } => {
                self.block = None;
                Ok(Reply::new(Command::GetResponse, code, None))
            }
            GetResponse::WithDataBlock { last_block, block_number, result: GetDataBlockResult::RawData(raw), .. } => {
                let expected = self.block.as_ref().map_or(1, |block| block.block_number.wrapping_add(1));
                if block_number != expected {
                    self.block = None;
                    return Err(CodecError::Malformed("block number"));
                }
                let block = self.block.get_or_insert_with(BlockTransfer::default);
                if block.data.len() + raw.len() > MAX_BLOCK_DATA {
                    self.block = None;
                    return Err(CodecError::Malformed("block transfer size"));
                }
                block.block_number = block_number;
                block.data.extend_from_slice(&raw);
                log::trace!("data block {} ({} bytes, last: {})", block_number, raw.len(), last_block);

                if !last_block {
                    return Ok(Reply { more_data: true, ..Reply::new(Command::GetResponse, 0, None) });
                }

                let data = self.block.take().map(|block| block.data).unwrap_or_default();
                let (_, value) = TypedValue::parse(&data).map_err(|err| match err {
                    nom::Err::Error(e) | nom::Err::Failure(e) if e.code == ErrorKind::Eof => CodecError::Incomplete,
                    _ => CodecError::Malformed("data block"),
                })?;
                Ok(Reply::new(Command::GetResponse, 0, Some(value)))
            }
        }
    }

    fn decode_apdu(&mut self, apdu: &[u8]) -> Result<Reply, CodecError> {
        let tag = *apdu.first().ok_or(CodecError::Malformed("empty APDU"))?;

        match tag {
            AARE_TAG => self.decode_aare(apdu),
            RLRE_TAG => Ok(Reply::new(Command::ReleaseResponse, 0, None)),
            t if glo::is_glo_response(t) => {
                let plain = self.unprotect(apdu)?;
                if plain.first().copied().is_some_and(glo::is_glo_response) {
                    return Err(CodecError::Malformed("nested glo APDU"));
                }
                self.decode_apdu(&plain)
            }
            crate::get::GET_RESPONSE_TAG => self.decode_get(apdu),
            crate::set::SET_RESPONSE_TAG => {
                let (_, response) =
                    SetResponseNormal::parse(apdu).map_err(|_| CodecError::Malformed("SET response"))?;
                Self::check_invoke_id(response.invoke_id)?;
                Ok(Reply::new(Command::SetResponse, response.result, None))
            }
            crate::action::ACTION_RESPONSE_TAG => {
                let (_, response) =
                    ActionResponseNormal::parse(apdu).map_err(|_| CodecError::Malformed("ACTION response"))?;
                Self::check_invoke_id(response.invoke_id)?;
                Ok(match response.return_parameters {
                    Some(Err(code)) if response.result == 0 => Reply::new(Command::MethodResponse, code, None),
                    Some(Ok(value)) => Reply::new(Command::MethodResponse, response.result, Some(value)),
                    _ => Reply::new(Command::MethodResponse, response.result, None),
                })
            }
            EXCEPTION_RESPONSE_TAG => match apdu {
                [_, state_error, service_error, ..] => {
                    log::debug!("exception response: state {}, service {}", state_error, service_error);
                    Ok(Reply::new(Command::ExceptionResponse, (*service_error).max(1), None))
                }
                _ => Err(CodecError::Malformed("exception response")),
            },
            CONFIRMED_SERVICE_ERROR_TAG => {
                let (_, (service, class, code)) =
                    parse_confirmed_service_error(apdu).map_err(|_| CodecError::Malformed("service error"))?;
                log::debug!("confirmed service error: service {}, class {}", service, class);
                Ok(Reply::new(Command::ConfirmedServiceError, code.max(1), None))
            }
            other => Err(CodecError::UnexpectedApdu(other)),
        }
    }
}

impl Codec for LnCodec {
    fn initialize(&mut self, settings: &CodecSettings) -> Result<(), CodecError> {
        self.clear();

        let needs_keys = settings.security.is_ciphered() || settings.authentication == Authentication::HighGmac;
        if needs_keys {
            settings.system_title.ok_or(CodecError::MissingSecurityMaterial("system title"))?;
            let block_cipher_key =
                settings.block_cipher_key.ok_or(CodecError::MissingSecurityMaterial("block cipher key"))?;
            let authentication_key =
                settings.authentication_key.ok_or(CodecError::MissingSecurityMaterial("authentication key"))?;
            self.cipher = Some(GloCipher::new(block_cipher_key, authentication_key));
        }
        if settings.authentication == Authentication::Low && settings.password.is_empty() {
            return Err(CodecError::MissingSecurityMaterial("password"));
        }

        self.invocation_counter = settings.invocation_counter;
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn clear(&mut self) {
        // Keep the counter so a reassociation never reuses an IV.
        let invocation_counter = self.invocation_counter;
        *self = Self { invocation_counter, ..Self::default() };
    }

    fn invocation_counter(&self) -> u32 {
        self.invocation_counter
    }

    fn association_request(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        let settings = self.settings()?.clone();
        let ciphered = settings.security.is_ciphered();

        let initiate = InitiateRequest::new_ln(settings.max_pdu_size).encode();
        let user_information = if ciphered {
            let security_control = self.security_control()?.unwrap_or(SecurityControl::new(0x30));
            self.protect(glo::GLO_INITIATE_REQUEST, security_control, &initiate)?
        } else {
            initiate
        };

        let context = if ciphered {
            ApplicationContextName::LogicalNameReferencingWithCiphering
        } else {
            ApplicationContextName::LogicalNameReferencing
        };
        let mut aarq = AarqApdu::new(context, user_information);

        match settings.authentication {
            Authentication::None => {}
            Authentication::Low => {
                aarq.mechanism_name = Some(MechanismName::LowLevel);
                aarq.calling_authentication_value = Some(settings.password.clone());
            }
            Authentication::HighGmac => {
                let mut challenge = vec![0u8; CHALLENGE_LEN];
                getrandom::getrandom(&mut challenge).map_err(CodecError::Random)?;
                aarq.mechanism_name = Some(MechanismName::HighLevelGmac);
                aarq.calling_authentication_value = Some(challenge.clone());
                self.client_challenge = challenge;
            }
        }

        if ciphered || settings.authentication == Authentication::HighGmac {
            aarq.calling_ap_title = Some(self.client_system_title()?);
        }

        Ok(vec![self.frame_raw(&aarq.encode())?])
    }

    fn authentication_request(&mut self) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        if self.settings()?.authentication != Authentication::HighGmac {
            return Ok(None);
        }
        if !self.authentication_pending {
            log::debug!("meter did not request HLS pass 3");
            return Ok(None);
        }

        let server_challenge = self.server_challenge.clone().ok_or(CodecError::Malformed("AARE server challenge"))?;
        let system_title = self.client_system_title()?;
        let invocation_counter = self.invocation_counter;
        let tag = self.cipher()?.gmac(HLS_SECURITY_CONTROL, &system_title, invocation_counter, &server_challenge)?;
        self.invocation_counter = self.invocation_counter.wrapping_add(1);

        let mut answer = Vec::with_capacity(5 + TAG_LEN);
        answer.push(HLS_SECURITY_CONTROL.bits());
        answer.extend_from_slice(&invocation_counter.to_be_bytes());
        answer.extend_from_slice(&tag);

        let messages = self.method_request(
            ASSOCIATION_LN_CLASS,
            &ASSOCIATION_LN,
            REPLY_TO_HLS_AUTHENTICATION,
            Some(&TypedValue::OctetString(answer)),
        )?;
        Ok(Some(messages))
    }

    fn verify_authentication(&mut self, reply: &Reply) -> Result<(), CodecError> {
        let Some(TypedValue::OctetString(answer)) = reply.value.as_ref() else {
            return Err(CodecError::AuthenticationFailed);
        };
        if answer.len() != 5 + TAG_LEN {
            return Err(CodecError::AuthenticationFailed);
        }

        let security_control = SecurityControl::new(answer[0]);
        let mut counter = [0u8; 4];
        counter.copy_from_slice(&answer[1..5]);
        let server_system_title =
            self.server_system_title.ok_or(CodecError::MissingSecurityMaterial("server system title"))?;

        let expected = self.cipher()?.gmac(
            security_control,
            &server_system_title,
            u32::from_be_bytes(counter),
            &self.client_challenge,
        )?;
        if expected[..] != answer[5..] {
            return Err(CodecError::AuthenticationFailed);
        }

        self.authentication_pending = false;
        Ok(())
    }

    fn release_request(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        Ok(vec![self.frame_raw(&encode_release_request())?])
    }

    fn read_request(&mut self, class_id: u16, obis: &ObisCode, attribute: i8) -> Result<Vec<Vec<u8>>, CodecError> {
        self.block = None;
        let request = GetRequest::Normal {
            invoke_id: INVOKE_ID_AND_PRIORITY,
            attribute: AttributeDescriptor::new(class_id, *obis, attribute),
            access_selection: None,
        };
        Ok(vec![self.frame(request.encode())?])
    }

    fn read_rows_by_entry_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        attribute: i8,
        index: u32,
        count: u32,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        self.block = None;
        let to_entry = index.saturating_add(count.saturating_sub(1));
        let request = GetRequest::Normal {
            invoke_id: INVOKE_ID_AND_PRIORITY,
            attribute: AttributeDescriptor::new(class_id, *obis, attribute),
            access_selection: Some(AccessSelector::by_entry(index, to_entry)),
        };
        Ok(vec![self.frame(request.encode())?])
    }

    fn write_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        attribute: i8,
        value: &TypedValue,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let request = SetRequestNormal {
            invoke_id: INVOKE_ID_AND_PRIORITY,
            attribute: AttributeDescriptor::new(class_id, *obis, attribute),
            value: value.clone(),
        };
        Ok(vec![self.frame(request.encode())?])
    }

    fn method_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        method: i8,
        parameters: Option<&TypedValue>,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let request = ActionRequestNormal {
            invoke_id: INVOKE_ID_AND_PRIORITY,
            method: MethodDescriptor::new(class_id, *obis, method),
            parameters: parameters.cloned(),
        };
        Ok(vec![self.frame(request.encode())?])
    }

    fn next_block_request(&mut self) -> Result<Vec<u8>, CodecError> {
        let block_number = self.block.as_ref().ok_or(CodecError::NoBlockTransfer)?.block_number;
        let request = GetRequest::NextDataBlock { invoke_id: INVOKE_ID_AND_PRIORITY, block_number };
        self.frame(request.encode())
    }

    fn decode(&mut self, data: &[u8]) -> Result<Option<Reply>, CodecError> {
        let Some((header, apdu)) = split_frame(data).map_err(|_| CodecError::Frame)? else {
            return Ok(None);
        };

        let settings = self.settings()?;
        if header.source != settings.server_address || header.destination != settings.client_address {
            return Err(CodecError::UnexpectedAddress {
                source_port: header.source,
                destination_port: header.destination,
            });
        }

        self.decode_apdu(apdu).map(Some)
    }
}
