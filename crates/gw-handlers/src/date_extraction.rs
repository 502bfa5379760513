//! `extract_dates_from_email`: walk a Gmail message's MIME tree, then ask
//! Anthropic to find calendar-relevant dates (vision for image attachments,
//! text otherwise), falling back to regex pattern matching when no API key
//! is configured or the call fails (spec.md §4.3 Gmail special case).

use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use serde_json::{Value, json};

use gw_mcp::CallToolResult;

use crate::common::{RestClient, finish};
use crate::rfc822;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";

const AI_MIN_BODY_CHARS: usize = 50;
const AI_MAX_BODY_CHARS: usize = 20_000;

fn extraction_prompt(body: &str, email_year: &str) -> String {
    format!(
        "The following email was sent in {email_year}. Extract any events, important \
         dates, and date ranges it mentions, resolving ambiguous dates (like \"Dec 15\") \
         against that year. Respond with JSON only: \
         {{\"summary\": string, \"events\": [], \"important_dates\": [], \"date_ranges\": []}}.\n\n{body}"
    )
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim()
}

async fn call_anthropic(api_key: &Secret<String>, content: Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let body = json!({
        "model": ANTHROPIC_MODEL,
        "max_tokens": 1024,
        "messages": [{ "role": "user", "content": content }],
    });
    let resp = client
        .post(ANTHROPIC_URL)
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("anthropic returned {}", resp.status().as_u16()));
    }
    resp.json::<Value>().await.map_err(|e| e.to_string())
}

fn extract_text_reply(response: &Value) -> Option<&str> {
    response.get("content")?.as_array()?.first()?.get("text")?.as_str()
}

fn regex_fallback(body: &str) -> CallToolResult {
    let patterns = [
        r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
        r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?\b",
        r"\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)[a-z]*,?\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2}\b",
        r"\b\d{1,2}(?:st|nd|rd|th)?[-–]\d{1,2}(?:st|nd|rd|th)?\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\b",
        r"\b\d{1,2}:\d{2}\s?(?:am|pm|AM|PM)?\s+on\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2}\b",
    ];
    let mut dates_found = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).expect("static pattern is valid");
        for m in re.find_iter(body) {
            dates_found.push(m.as_str().to_string());
        }
    }
    let result = json!({
        "dates_found": dates_found,
        "extraction_method": "regex",
        "fallback_used": true,
    });
    CallToolResult::ok(serde_json::to_string_pretty(&result).unwrap_or_default())
}

pub(crate) fn mime_walk<'a>(part: &'a Value, body: &mut String, images: &mut Vec<&'a Value>, pdfs: &mut Vec<&'a Value>) {
    let mime_type = part.get("mimeType").and_then(Value::as_str).unwrap_or_default();
    if mime_type == "text/plain" {
        if let Some(data) = part.get("body").and_then(|b| b.get("data")).and_then(Value::as_str) {
            if let Ok(bytes) = rfc822::decode_base64url(data) {
                body.push_str(&String::from_utf8_lossy(&bytes));
            }
        }
    } else if mime_type.starts_with("image/") {
        images.push(part);
    } else if mime_type == "application/pdf" {
        pdfs.push(part);
    }
    if let Some(children) = part.get("parts").and_then(Value::as_array) {
        for child in children {
            mime_walk(child, body, images, pdfs);
        }
    }
}

pub(crate) async fn extract_dates_from_email(
    client: &RestClient,
    anthropic_api_key: Option<&Secret<String>>,
    message_id: &str,
) -> CallToolResult {
    let message = match client.get(&format!("/messages/{message_id}?format=full")).await {
        Ok(resp) if resp.status.is_success() => resp.body,
        other => return finish(other),
    };

    let mut body = String::new();
    let mut images = Vec::new();
    let mut pdfs = Vec::new();
    if let Some(payload) = message.get("payload") {
        mime_walk(payload, &mut body, &mut images, &mut pdfs);
    }

    for pdf in &pdfs {
        let Some(attachment_id) = pdf.get("body").and_then(|b| b.get("attachmentId")).and_then(Value::as_str) else {
            continue;
        };
        let path = format!("/messages/{message_id}/attachments/{attachment_id}");
        if let Ok(resp) = client.get(&path).await {
            if resp.status.is_success() {
                if let Some(data) = resp.body.get("data").and_then(Value::as_str) {
                    if let Ok(bytes) = rfc822::decode_base64url(data) {
                        if let Ok(text) = pdf_extract::extract_text_from_mem(&bytes) {
                            body.push('\n');
                            body.push_str(&text);
                        }
                    }
                }
            }
        }
    }

    let email_year = message
        .get("internalDate")
        .and_then(Value::as_str)
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(|ms| chrono::DateTime::from_timestamp(ms / 1000, 0))
        .map(|dt| dt.format("%Y").to_string())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y").to_string());

    let has_image = !images.is_empty();
    let body_is_long_enough = body.trim().chars().count() >= AI_MIN_BODY_CHARS;

    if let Some(api_key) = anthropic_api_key {
        if has_image || body_is_long_enough {
            let (content, method) = if has_image {
                let image_data = images[0].get("body").and_then(|b| b.get("attachmentId")).and_then(Value::as_str);
                let Some(attachment_id) = image_data else {
                    return regex_fallback(&body);
                };
                let path = format!("/messages/{message_id}/attachments/{attachment_id}");
                let standard_b64 = match client.get(&path).await {
                    Ok(resp) if resp.status.is_success() => resp
                        .body
                        .get("data")
                        .and_then(Value::as_str)
                        .and_then(|d| rfc822::base64url_to_standard(d).ok()),
                    _ => None,
                };
                let Some(standard_b64) = standard_b64 else {
                    return regex_fallback(&body);
                };
                let media_type = images[0].get("mimeType").and_then(Value::as_str).unwrap_or("image/png");
                let content = json!([
                    { "type": "image", "source": { "type": "base64", "media_type": media_type, "data": standard_b64 } },
                    { "type": "text", "text": extraction_prompt("", &email_year) },
                ]);
                (content, "claude_vision_api")
            } else {
                let truncated: String = body.chars().take(AI_MAX_BODY_CHARS).collect();
                (json!(extraction_prompt(&truncated, &email_year)), "claude_api")
            };

            match call_anthropic(api_key, content).await {
                Ok(response) => {
                    if let Some(text) = extract_text_reply(&response) {
                        if let Ok(mut parsed) = serde_json::from_str::<Value>(strip_code_fence(text)) {
                            parsed["extraction_method"] = json!(method);
                            return CallToolResult::ok(serde_json::to_string_pretty(&parsed).unwrap_or_default());
                        }
                    }
                    regex_fallback(&body)
                },
                Err(_) => regex_fallback(&body),
            }
        } else {
            regex_fallback(&body)
        }
    } else {
        regex_fallback(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_removes_json_fence() {
        let fenced = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"a\":1}");
    }

    #[test]
    fn regex_fallback_finds_month_name_dates() {
        let result = regex_fallback("Let's meet on Dec 15 to plan the offsite.");
        assert!(!result.is_error);
    }

    #[test]
    fn mime_walk_collects_plain_text_and_attachment_handles() {
        let payload = json!({
            "mimeType": "multipart/mixed",
            "parts": [
                { "mimeType": "text/plain", "body": { "data": "aGVsbG8" } },
                { "mimeType": "application/pdf", "body": { "attachmentId": "att1" } },
                { "mimeType": "image/png", "body": { "attachmentId": "att2" } },
            ],
        });
        let mut body = String::new();
        let mut images = Vec::new();
        let mut pdfs = Vec::new();
        mime_walk(&payload, &mut body, &mut images, &mut pdfs);
        assert_eq!(images.len(), 1);
        assert_eq!(pdfs.len(), 1);
    }
}
