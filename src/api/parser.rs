// src/api/parser.rs
//! Turns raw HTTP results into typed responses or typed errors.

use super::client::ApiResponse;
use super::responses::{NotionApiError, PageRecord, PaginatedResponse, RawBlock};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};

/// Parse any Notion API response, mapping error statuses to `NotionService`.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_body(&result.data, &result.url)
    } else {
        Err(parse_error(&result.data, result.status.as_u16(), &result.url))
    }
}

fn parse_body<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

fn parse_error(body: &str, status: u16, url: &str) -> AppError {
    match serde_json::from_str::<NotionApiError>(body) {
        Ok(error) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status: error.status,
        },
        // Fallback to generic error with HTTP status code
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(status),
            message: format!("HTTP {} from {}", status, url),
            status,
        },
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_PREVIEW_LENGTH) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub fn parse_page_response(result: ApiResponse<String>) -> Result<PageRecord, AppError> {
    parse_api_response(result)
}

pub fn parse_children_response(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<RawBlock>, AppError> {
    parse_api_response(result)
}
