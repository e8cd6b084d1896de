//! Các loại lỗi của lõi phân loại.

use crate::patient::{PatientId, PatientStatus};

/// Giá trị đầu vào vi phạm ràng buộc của hồ sơ bệnh nhân.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Trường `{field}` ngoài khoảng cho phép {min}..={max}: {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Trường `{field}` không phải số hữu hạn")]
    NotFinite { field: &'static str },
    #[error("Thiếu trường bắt buộc `{0}`")]
    MissingField(&'static str),
    #[error("Không thể đưa mức phân loại về Pending sau khi đã đánh giá")]
    PendingNotAssignable,
    #[error("Giá trị không hợp lệ cho `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn check_range(
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

/// Lỗi từ bộ chấm điểm AI bên ngoài.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Dịch vụ chấm điểm quá thời gian chờ")]
    Timeout,
    #[error("Dịch vụ chấm điểm không khả dụng: {0}")]
    Unavailable(String),
    #[error("Phản hồi chấm điểm không hợp lệ: {0}")]
    InvalidResponse(String),
}

/// Lỗi chung của các thao tác phân loại.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Không thể chuyển trạng thái từ {from} sang {to}")]
    IllegalTransition {
        from: PatientStatus,
        to: PatientStatus,
    },
    #[error("Không tìm thấy bệnh nhân {0}")]
    NotFound(PatientId),
    #[error("Chấm điểm AI thất bại: {0}")]
    Scoring(#[from] ScoringError),
    #[error("Lỗi kho lưu trữ: {0}")]
    Repository(String),
}
