//! Wire types for talking to the Temporal server, plus the payload conversions shared by the
//! client, the worker, and the HTTP front-end.

pub mod temporal;

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use temporal::api::{
    common::v1::{Payload, Payloads},
    failure::v1::{failure::FailureInfo, ApplicationFailureInfo, Failure},
};

pub static ENCODING_PAYLOAD_KEY: &str = "encoding";
pub static JSON_ENCODING_VAL: &str = "json/plain";
/// Reported as the `source` of failures produced by this process
pub static FAILURE_SOURCE: &str = "temporal-trigger";

pub trait AsJsonPayloadExt {
    fn as_json_payload(&self) -> anyhow::Result<Payload>;
}
impl<T> AsJsonPayloadExt for T
where
    T: Serialize,
{
    fn as_json_payload(&self) -> anyhow::Result<Payload> {
        let as_json = serde_json::to_string(self)?;
        let mut metadata = HashMap::new();
        metadata.insert(
            ENCODING_PAYLOAD_KEY.to_string(),
            JSON_ENCODING_VAL.as_bytes().to_vec(),
        );
        Ok(Payload {
            metadata,
            data: as_json.into_bytes(),
        })
    }
}

pub trait FromJsonPayloadExt: Sized {
    fn from_json_payload(payload: &Payload) -> Result<Self, PayloadDeserializeErr>;
}
impl<T> FromJsonPayloadExt for T
where
    T: DeserializeOwned,
{
    fn from_json_payload(payload: &Payload) -> Result<Self, PayloadDeserializeErr> {
        if !payload.is_json_payload() {
            return Err(PayloadDeserializeErr::DeserializerDoesNotHandle);
        }
        let payload_str = std::str::from_utf8(&payload.data).map_err(anyhow::Error::from)?;
        Ok(serde_json::from_str(payload_str).map_err(anyhow::Error::from)?)
    }
}

/// Errors when decoding a [Payload] into a concrete type
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum PayloadDeserializeErr {
    /// Payload is not json/plain encoded
    DeserializerDoesNotHandle,
    /// Payload could not be deserialized: {0}
    DeserializeErr(#[from] anyhow::Error),
}

pub trait IntoPayloadsExt {
    fn into_payloads(self) -> Option<Payloads>;
}
impl<T> IntoPayloadsExt for T
where
    T: IntoIterator<Item = Payload>,
{
    fn into_payloads(self) -> Option<Payloads> {
        let mut iterd = self.into_iter().peekable();
        if iterd.peek().is_none() {
            None
        } else {
            Some(Payloads {
                payloads: iterd.collect(),
            })
        }
    }
}

impl Payload {
    pub fn is_json_payload(&self) -> bool {
        self.metadata
            .get(ENCODING_PAYLOAD_KEY)
            .map(|v| v.as_slice() == JSON_ENCODING_VAL.as_bytes())
            .unwrap_or_default()
    }

    /// Renders the payload as text: JSON strings unquoted, anything else as (lossy) UTF-8 of the
    /// raw data.
    pub fn to_display_string(&self) -> String {
        String::from_json_payload(self)
            .unwrap_or_else(|_| String::from_utf8_lossy(&self.data).into_owned())
    }
}

impl Failure {
    /// An application failure carrying the given message
    pub fn application_failure(message: String, non_retryable: bool) -> Self {
        Self {
            message,
            source: FAILURE_SOURCE.to_string(),
            failure_info: Some(FailureInfo::ApplicationFailureInfo(ApplicationFailureInfo {
                r#type: "Error".to_string(),
                non_retryable,
                details: None,
            })),
            ..Default::default()
        }
    }

    /// Messages of this failure and all of its causes, outermost first, joined by `: `
    pub fn chain_message(&self) -> String {
        let mut messages = vec![self.message.as_str()];
        let mut cur = self.cause.as_deref();
        while let Some(c) = cur {
            messages.push(c.message.as_str());
            cur = c.cause.as_deref();
        }
        messages.retain(|m| !m.is_empty());
        messages.join(": ")
    }
}

/// Builds protobuf bytes field by field from wire tags, without going through the message
/// declarations in [temporal]
#[cfg(test)]
pub(crate) mod wire {
    use prost::encoding::{encode_key, encode_varint, WireType};

    #[derive(Default)]
    pub(crate) struct Fields(Vec<u8>);

    impl Fields {
        pub(crate) fn varint(mut self, tag: u32, value: u64) -> Self {
            encode_key(tag, WireType::Varint, &mut self.0);
            encode_varint(value, &mut self.0);
            self
        }

        pub(crate) fn bytes(mut self, tag: u32, value: &[u8]) -> Self {
            encode_key(tag, WireType::LengthDelimited, &mut self.0);
            encode_varint(value.len() as u64, &mut self.0);
            self.0.extend_from_slice(value);
            self
        }

        pub(crate) fn string(self, tag: u32, value: &str) -> Self {
            self.bytes(tag, value.as_bytes())
        }

        pub(crate) fn message(self, tag: u32, value: Fields) -> Self {
            self.bytes(tag, &value.0)
        }

        pub(crate) fn into_bytes(self) -> Vec<u8> {
            self.0
        }
    }

    /// `HistoryEvent` with its attributes in oneof field `attrs_tag`
    pub(crate) fn history_event(
        event_id: u64,
        event_type: i32,
        attrs_tag: u32,
        attrs: Fields,
    ) -> Fields {
        Fields::default()
            .varint(1, event_id)
            .varint(3, event_type as u64)
            .message(attrs_tag, attrs)
    }

    /// `GetWorkflowExecutionHistoryResponse` with one page holding `events`
    pub(crate) fn history_page(events: Vec<Fields>) -> Vec<u8> {
        let history = events
            .into_iter()
            .fold(Fields::default(), |h, ev| h.message(1, ev));
        Fields::default().message(1, history).into_bytes()
    }
}
