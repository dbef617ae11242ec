//! JSON bodies of the `generateContent` method.
//!
//! Only the fields vestir reads or writes are modelled; everything else
//! in a response is ignored.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use vestir_pipeline::{EditError, ImagePayload};

/// Media type assumed when the service omits one.
const FALLBACK_MEDIA_TYPE: &str = "image/png";

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation; vestir always sends a single user turn.
    pub contents: Vec<Content>,
    /// Output options.
    pub generation_config: GenerationConfig,
}

/// Output options of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Kinds of output the model may produce, e.g. `["IMAGE", "TEXT"]`.
    pub response_modalities: Vec<String>,
}

/// One turn of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// `"user"` or `"model"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a message: text or inline image data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text of a text part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image of an inline data part.
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Base64 image data with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Media type; may be empty in responses.
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    /// Standard base64 of the image bytes.
    pub data: String,
}

/// Body of a successful `generateContent` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated answers, best first. Empty when the prompt was blocked.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Safety verdict on the request.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The answer's parts, absent when generation stopped early.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation ended, e.g. `"STOP"` or `"SAFETY"`.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Safety verdict on the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the request itself was refused.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Build the request body: every image in order, then the instruction.
#[must_use]
pub fn build_request(instruction: &str, inputs: &[ImagePayload]) -> GenerateContentRequest {
    let parts = inputs
        .iter()
        .map(|image| Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.media_type.clone(),
                data: image.encoded_data.clone(),
            }),
        })
        .chain(std::iter::once(Part {
            text: Some(instruction.to_owned()),
            inline_data: None,
        }))
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_owned()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_owned(), "TEXT".to_owned()],
        },
    }
}

/// Parse a 2xx response body.
///
/// # Errors
///
/// Returns [`EditError::Decode`] if the body is not a response object.
pub fn parse_response(body: &str) -> Result<GenerateContentResponse, EditError> {
    serde_json::from_str(body)
        .map_err(|e| EditError::Decode(format!("failed to parse response: {e}")))
}

/// Human-readable text for a non-2xx response.
#[must_use]
pub fn describe_failure(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_owned());
    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

/// Take the first image of the first candidate.
///
/// # Errors
///
/// Returns [`EditError::ContentBlockedOrEmpty`] when there is no image
/// part, carrying the block reason, a non-`STOP` finish reason, or the
/// model's text, in that order of preference. Returns
/// [`EditError::Decode`] if the image data is not valid base64.
pub fn extract_image(response: GenerateContentResponse) -> Result<ImagePayload, EditError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(EditError::ContentBlockedOrEmpty(block_reason));
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    if let Some(inline) = parts.iter().find_map(|part| part.inline_data.as_ref()) {
        STANDARD
            .decode(&inline.data)
            .map_err(|e| EditError::Decode(format!("invalid image data: {e}")))?;
        let media_type = if inline.mime_type.trim().is_empty() {
            FALLBACK_MEDIA_TYPE.to_owned()
        } else {
            inline.mime_type.clone()
        };
        return Ok(ImagePayload::new(inline.data.clone(), media_type));
    }

    let finish_reason = candidate
        .finish_reason
        .filter(|reason| reason != "STOP" && reason != "FINISH_REASON_UNSPECIFIED");
    let text = parts
        .into_iter()
        .filter_map(|part| part.text)
        .map(|text| text.trim().to_owned())
        .find(|text| !text.is_empty());
    Err(EditError::ContentBlockedOrEmpty(
        block_reason.or(finish_reason).or(text),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        parse_response(json).unwrap()
    }

    #[test]
    fn request_orders_images_before_text() {
        let inputs = [
            ImagePayload::new("AAAA", "image/jpeg"),
            ImagePayload::new("QkJC", "image/png"),
        ];
        let body = serde_json::to_value(build_request("dress them", &inputs)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "AAAA"}},
                        {"inlineData": {"mimeType": "image/png", "data": "QkJC"}},
                        {"text": "dress them"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }

    #[test]
    fn first_image_part_is_used() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"AAAA"}},
                {"inlineData":{"mimeType":"image/jpeg","data":"QkJC"}}
            ]},"finishReason":"STOP"}]}"#,
        );
        let image = extract_image(response).unwrap();
        assert_eq!(image, ImagePayload::new("AAAA", "image/png"));
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"inline_data":{"mime_type":"image/webp","data":"AAAA"}}
            ]}}]}"#,
        );
        assert_eq!(extract_image(response).unwrap().media_type, "image/webp");
    }

    #[test]
    fn text_only_answer_is_content_blocked_or_empty() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"I can't do that."}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(
            extract_image(response),
            Err(EditError::ContentBlockedOrEmpty(Some(
                "I can't do that.".into()
            )))
        );
    }

    #[test]
    fn block_reason_is_reported() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(
            extract_image(response),
            Err(EditError::ContentBlockedOrEmpty(Some("SAFETY".into())))
        );
    }

    #[test]
    fn abnormal_finish_reason_is_reported() {
        let response = parse(r#"{"candidates":[{"finishReason":"IMAGE_SAFETY"}]}"#);
        assert_eq!(
            extract_image(response),
            Err(EditError::ContentBlockedOrEmpty(Some("IMAGE_SAFETY".into())))
        );
    }

    #[test]
    fn empty_response_has_no_reason() {
        assert_eq!(
            extract_image(parse("{}")),
            Err(EditError::ContentBlockedOrEmpty(None))
        );
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"image/png","data":"not base64!"}}
            ]}}]}"#,
        );
        assert!(matches!(extract_image(response), Err(EditError::Decode(_))));
    }

    #[test]
    fn missing_mime_type_falls_back_to_png() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AAAA"}}]}}]}"#,
        );
        assert_eq!(extract_image(response).unwrap().media_type, "image/png");
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            parse_response("<html>"),
            Err(EditError::Decode(_))
        ));
    }

    #[test]
    fn failure_description_prefers_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(describe_failure(400, body), "HTTP 400: API key not valid.");
        assert_eq!(describe_failure(502, "Bad Gateway\n"), "HTTP 502: Bad Gateway");
        assert_eq!(describe_failure(500, ""), "HTTP 500");
    }
}
