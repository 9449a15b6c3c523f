// ==========================================
// 学员管理后台 - 导入层
// ==========================================
// 职责: 表头匹配、行归一化、必填校验、文件解析
// 支持: CSV / Excel / ODS
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod header_matcher;
pub mod import_service_trait;
pub mod local_service;
pub mod row_normalizer;
pub mod validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, SpreadsheetParser, UniversalFileParser};
pub use header_matcher::{normalize_header, HeaderMatcher};
pub use local_service::LocalPreviewService;
pub use row_normalizer::RowNormalizer;
pub use validator::{RequiredFieldValidator, RowIssue, ValidationReport};

// 重导出 Trait 接口
pub use import_service_trait::{CommitService, FileParser, PreviewService};
