// ==========================================
// 学员管理后台 - 学员 CSV 导出
// ==========================================
// 表头: ID, First Name, Last Name, Email, Phone Number,
//       Division, Deanery, Parish, Program, Modules Count
// 表头行不加引号；数据行每个字段都加引号，内部 " 双写
// ==========================================

use crate::exporter::error::{ExportError, ExportResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use std::path::Path;
use tracing::info;

pub const EXPORT_HEADERS: [&str; 10] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Phone Number",
    "Division",
    "Deanery",
    "Parish",
    "Program",
    "Modules Count",
];

pub const DEFAULT_EXPORT_FILE_NAME: &str = "participants_export.csv";

/// 导出用的一行（由接口返回的学员 JSON 推导）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantExportRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub division: String,
    pub deanery: String,
    pub parish: String,
    pub program: String,
    pub modules_count: usize,
}

impl ParticipantExportRow {
    pub fn from_value(participant: &Value) -> Self {
        let full_name = text(participant.get("fullName"));
        let mut name_parts = full_name.split(' ');
        let full_first = name_parts.next().unwrap_or("").to_string();
        let full_last = name_parts.collect::<Vec<_>>().join(" ");

        let first_name = non_empty(text(participant.get("firstName"))).unwrap_or(full_first);
        let last_name = non_empty(text(participant.get("lastName"))).unwrap_or(full_last);

        let id = non_empty(text(participant.get("_id")))
            .unwrap_or_else(|| text(participant.get("id")));

        let program = match participant.get("program") {
            Some(Value::Object(program)) => text(program.get("title")),
            other => text(other),
        };

        let modules_count = participant
            .get("modules")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        Self {
            id,
            first_name,
            last_name,
            email: text(participant.get("email")),
            phone_number: text(participant.get("phoneNumber")),
            division: text(participant.get("division")),
            deanery: text(participant.get("deanery")),
            parish: text(participant.get("parish")),
            program,
            modules_count,
        }
    }

    fn fields(&self) -> [String; 10] {
        [
            self.id.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.phone_number.clone(),
            self.division.clone(),
            self.deanery.clone(),
            self.parish.clone(),
            self.program.clone(),
            self.modules_count.to_string(),
        ]
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// 生成 CSV 文本；空列表返回 NoParticipants
pub fn render_participants_csv(participants: &[Value]) -> ExportResult<String> {
    if participants.is_empty() {
        return Err(ExportError::NoParticipants);
    }

    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(EXPORT_HEADERS)?;

    let mut body = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for participant in participants {
        body.write_record(ParticipantExportRow::from_value(participant).fields())?;
    }

    let mut bytes = into_bytes(header)?;
    bytes.extend(into_bytes(body)?);
    String::from_utf8(bytes).map_err(|e| ExportError::InternalError(e.to_string()))
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> ExportResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// 写出 CSV 文件，返回导出的学员数
pub fn write_participants_csv(participants: &[Value], path: impl AsRef<Path>) -> ExportResult<usize> {
    let path = path.as_ref();
    let content = render_participants_csv(participants)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), count = participants.len(), "学员导出完成");
    Ok(participants.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_name_fallback_and_program_object() {
        let row = ParticipantExportRow::from_value(&json!({
            "_id": "64f0",
            "id": "ignored",
            "fullName": "Grace Ngozi Eze",
            "email": "grace@example.com",
            "program": {"title": "Diploma"},
            "modules": [{}, {}, {}]
        }));
        assert_eq!(row.id, "64f0");
        assert_eq!(row.first_name, "Grace");
        assert_eq!(row.last_name, "Ngozi Eze");
        assert_eq!(row.program, "Diploma");
        assert_eq!(row.modules_count, 3);
        assert_eq!(row.phone_number, "");
    }

    #[test]
    fn test_explicit_names_win() {
        let row = ParticipantExportRow::from_value(&json!({
            "id": 7,
            "firstName": "Ada",
            "lastName": "",
            "fullName": "Adaeze Obi",
            "program": "Certificate"
        }));
        assert_eq!(row.id, "7");
        assert_eq!(row.first_name, "Ada");
        assert_eq!(row.last_name, "Obi");
        assert_eq!(row.program, "Certificate");
        assert_eq!(row.modules_count, 0);
    }

    #[test]
    fn test_render_quotes_every_data_field() {
        let csv = render_participants_csv(&[json!({
            "id": "1",
            "firstName": "Sam \"The Rock\"",
            "lastName": "Udo",
            "parish": "St. Paul, Lekki"
        })])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "ID,First Name,Last Name,Email,Phone Number,Division,Deanery,Parish,Program,Modules Count"
        );
        assert_eq!(
            lines[1],
            r#""1","Sam ""The Rock""","Udo","","","","","St. Paul, Lekki","","0""#
        );
    }

    #[test]
    fn test_empty_list_is_error() {
        assert!(matches!(
            render_participants_csv(&[]),
            Err(ExportError::NoParticipants)
        ));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE_NAME);
        let count = write_participants_csv(&[json!({"id": "1"}), json!({"id": "2"})], &path).unwrap();
        assert_eq!(count, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
