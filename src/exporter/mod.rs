// ==========================================
// 学员管理后台 - 导出层
// ==========================================
// 职责: 学员列表导出为 CSV
// ==========================================

pub mod error;
pub mod participant_csv;
pub mod source;

pub use error::{ExportError, ExportResult};
pub use participant_csv::{
    render_participants_csv, write_participants_csv, ParticipantExportRow, DEFAULT_EXPORT_FILE_NAME,
    EXPORT_HEADERS,
};
pub use source::{export_participants, ParticipantSource};
