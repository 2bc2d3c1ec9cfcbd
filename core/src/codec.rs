//! Envelope codec: turns a buffered response into data or an `ApiError`.
//!
//! # Design
//! The status code is inspected before the body is parsed. A non-200 body is
//! only ever read as an `ErrorEnvelope`; a 200 body is only ever read as a
//! `SuccessEnvelope<T>`. Decoding is all-or-nothing.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::{ErrorEnvelope, SuccessEnvelope};

pub const STATUS_OK: u16 = 200;

// `data` stays raw so a missing key fails even when `T` is an `Option`.
#[derive(Deserialize)]
struct RawSuccess {
    #[serde(default)]
    code: i64,
    data: Box<RawValue>,
}

/// Decode `body` according to `status`.
pub fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<SuccessEnvelope<T>, ApiError> {
    if status != STATUS_OK {
        return match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(env) => Err(ApiError::Remote {
                code: env.code,
                message: env.message,
            }),
            Err(_) => Err(ApiError::UnknownStatus(status)),
        };
    }

    let decode_error = |e: serde_json::Error| {
        log::warn!("failed to decode success envelope: {e}");
        ApiError::Decode(e.to_string())
    };
    let raw: RawSuccess = serde_json::from_slice(body).map_err(decode_error)?;
    let data = serde_json::from_str(raw.data.get()).map_err(decode_error)?;
    Ok(SuccessEnvelope {
        code: raw.code,
        data,
    })
}

/// Decode a buffered `HttpResponse`.
pub fn decode_response<T: DeserializeOwned>(
    response: &HttpResponse,
) -> Result<SuccessEnvelope<T>, ApiError> {
    decode(response.status, &response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Face {
        id: u32,
        name: String,
        tags: Vec<String>,
        score: Option<f64>,
    }

    #[test]
    fn success_decodes_data() {
        let env = decode::<Point>(200, br#"{"code":0,"data":{"x":1}}"#).unwrap();
        assert_eq!(env.code, 0);
        assert_eq!(env.into_data(), Point { x: 1 });
    }

    #[test]
    fn error_envelope_becomes_remote_error() {
        let err = decode::<Point>(404, br#"{"code":404,"message":"not found"}"#).unwrap_err();
        match err {
            ApiError::Remote { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_keeps_status() {
        let err = decode::<Point>(502, b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::UnknownStatus(502)));
    }

    #[test]
    fn empty_error_body_keeps_status() {
        let err = decode::<Point>(500, b"").unwrap_err();
        assert!(matches!(err, ApiError::UnknownStatus(500)));
    }

    #[test]
    fn created_is_not_ok() {
        // Only 200 counts as success on this wire.
        let err = decode::<Point>(201, br#"{"code":0,"data":{"x":1}}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnknownStatus(201)));
    }

    #[test]
    fn success_without_data_is_decode_error() {
        let err = decode::<serde_json::Value>(200, br#"{"code":0}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn optional_target_still_requires_data() {
        let err = decode::<Option<serde_json::Value>>(200, br#"{"code":0}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn optional_target_accepts_null_data() {
        let env = decode::<Option<Point>>(200, br#"{"code":0,"data":null}"#).unwrap();
        assert_eq!(env.into_data(), None);
    }

    #[test]
    fn success_with_invalid_json_is_decode_error() {
        let err = decode::<Point>(200, b"not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn success_with_wrong_shape_is_decode_error() {
        let err = decode::<Point>(200, br#"{"code":0,"data":{"x":"one"}}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn error_message_is_preferred_over_data_on_failure() {
        let body = br#"{"code":403,"message":"forbidden","data":{"x":1}}"#;
        let err = decode::<Point>(403, body).unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
    }

    #[test]
    fn encoded_envelope_decodes_to_same_value() {
        let face = Face {
            id: 7,
            name: "abc".to_string(),
            tags: vec!["front".to_string(), "lit".to_string()],
            score: Some(0.5),
        };
        let body = serde_json::to_vec(&SuccessEnvelope {
            code: 0,
            data: face.clone(),
        })
        .unwrap();
        assert_eq!(decode::<Face>(200, &body).unwrap().into_data(), face);

        let value = json!([1, "two", null, {"three": [3.5]}]);
        let body = serde_json::to_vec(&json!({"code": 0, "data": value})).unwrap();
        assert_eq!(
            decode::<serde_json::Value>(200, &body).unwrap().into_data(),
            value
        );
    }

    #[test]
    fn decode_response_reads_status_and_body() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: br#"{"code":404,"message":"no such key"}"#.to_vec(),
        };
        let err = decode_response::<Point>(&response).unwrap_err();
        assert_eq!(err.to_string(), "no such key");
    }
}
