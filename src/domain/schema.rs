// ==========================================
// 学员管理后台 - 导入 Schema 注册表
// ==========================================
// 职责: 各可导入实体的目标字段声明（key / 标签 / 是否必填）
// 约束: 字段顺序即表格列顺序，也是自动匹配的迭代顺序
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 目标记录字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

impl SchemaField {
    const fn required(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: true,
        }
    }

    const fn optional(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: false,
        }
    }
}

const PARTICIPANT_FIELDS: &[SchemaField] = &[
    SchemaField::required("firstName", "First Name"),
    SchemaField::required("lastName", "Last Name"),
    SchemaField::required("email", "Email"),
    SchemaField::required("phoneNumber", "Phone Number"),
    SchemaField::optional("password", "Password"),
    SchemaField::optional("division", "Division"),
    SchemaField::optional("deanery", "Deanery"),
    SchemaField::optional("parish", "Parish"),
    SchemaField::optional("program", "Program"),
    SchemaField::optional("semester", "Semester"),
];

const PROGRAM_FIELDS: &[SchemaField] = &[
    SchemaField::required("title", "Program Name"),
    SchemaField::required("semester", "Semester"),
    SchemaField::required("duration", "Duration"),
    SchemaField::optional("description", "Description"),
];

const MODULE_FIELDS: &[SchemaField] = &[
    SchemaField::required("title", "Module Name"),
    SchemaField::required("credits", "Credits"),
    SchemaField::required("program", "Program"),
    SchemaField::optional("isActive", "Active"),
];

// ==========================================
// 实体类型 (Entity Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Participant,
    Program,
    Module,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [
        EntityType::Participant,
        EntityType::Program,
        EntityType::Module,
    ];

    /// 接口路径中使用的模型名（/import/preview/{model}）
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityType::Participant => "participant",
            EntityType::Program => "program",
            EntityType::Module => "module",
        }
    }

    /// 该实体的目标字段（有序）
    pub fn fields(&self) -> &'static [SchemaField] {
        fields_for(*self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

/// 未知实体标识
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "participant" | "participants" => Ok(EntityType::Participant),
            "program" | "programs" => Ok(EntityType::Program),
            "module" | "modules" => Ok(EntityType::Module),
            _ => Err(UnknownEntityType(s.to_string())),
        }
    }
}

/// Schema 注册表查询
pub fn fields_for(entity: EntityType) -> &'static [SchemaField] {
    match entity {
        EntityType::Participant => PARTICIPANT_FIELDS,
        EntityType::Program => PROGRAM_FIELDS,
        EntityType::Module => MODULE_FIELDS,
    }
}

/// 按 key 查找字段
pub fn find_field(fields: &[SchemaField], key: &str) -> Option<SchemaField> {
    fields.iter().copied().find(|f| f.key == key)
}
