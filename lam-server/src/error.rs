use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lam_core::{RankingError, StorageError, UnknownAction, ValidationError};
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] JsonRejection),

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),

    #[error("Record {0} not found")]
    NotFound(u64),

    #[error("Record {id}: {message}")]
    Conflict { id: u64, message: String },

    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),

    #[error("Store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<RankingError<StorageError>> for AppError {
    fn from(err: RankingError<StorageError>) -> Self {
        match err {
            RankingError::Validation(e) => Self::Validation(e),
            RankingError::NotFound(id) => Self::NotFound(id),
            RankingError::Conflict { id, source } => Self::Conflict {
                id,
                message: source.to_string(),
            },
            RankingError::Storage(e) => Self::Storage(e),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_)
            | Self::InvalidId(_)
            | Self::Validation(_)
            | Self::UnknownAction(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message clients see. Storage details stay in the log.
    fn public_message(&self) -> String {
        match self {
            Self::MalformedPayload(_) => "请求格式错误".to_string(),
            Self::InvalidId(_) => "无效的记录ID".to_string(),
            Self::Validation(ValidationError::InvalidFloor(_)) => {
                "楼层数值不合法（1-15层，第5层可选普牢5-1或困牢5-2）".to_string()
            }
            Self::Validation(ValidationError::NegativeTime(_)) => "通关时间不能为负数".to_string(),
            Self::Validation(ValidationError::MissingFields(_)) => "缺少必填字段".to_string(),
            Self::UnknownAction(_) => "无效的操作".to_string(),
            Self::NotFound(_) => "记录不存在".to_string(),
            Self::Conflict { .. } => "该记录已审核，不能重复审核".to_string(),
            Self::Storage(_) | Self::Worker(_) => "服务器错误".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        let body = json!({
            "code": status.as_u16(),
            "success": false,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}
