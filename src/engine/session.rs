// ==========================================
// 学员管理后台 - 导入会话（选择与编辑状态）
// ==========================================
// 职责: 可编辑记录集、选中集合、分页游标、校验提示
// 约束:
// - 选中下标始终位于 [0, 记录数)
// - 所有修改只作用于单个下标，不影响其他行的编辑
// - 任何编辑/选择变化都会清除上一次确认产生的校验提示
// ==========================================

use crate::domain::import::PreviewPayload;
use crate::domain::schema::{fields_for, find_field, EntityType, SchemaField};
use crate::domain::types::{EditableRecord, HeaderMapping, SourceRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_matcher::HeaderMatcher;
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::validator::{RequiredFieldValidator, ValidationReport};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// 每页行数
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 分页中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRow {
    pub index: usize,
    pub selected: bool,
    pub record: EditableRecord,
    pub missing: Vec<String>,
}

/// 分页视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub rows: Vec<PageRow>,
}

#[derive(Debug, Clone)]
pub struct ImportSession {
    entity: EntityType,
    fields: &'static [SchemaField],
    mapping: HeaderMapping,
    records: Vec<EditableRecord>,
    selection: BTreeSet<usize>,
    page: usize,
    page_size: usize,
    banner: Option<String>,
}

impl ImportSession {
    /// 由预览结果创建会话：首行表头匹配 + 全量归一化 + 默认全选
    pub fn from_payload(entity: EntityType, payload: &PreviewPayload, page_size: usize) -> Self {
        let fields = fields_for(entity);
        let mapping = HeaderMatcher.match_headers(&payload.headers(), fields);
        let records = RowNormalizer.normalize_rows(&payload.full_data, &mapping, fields);
        Self::new(entity, mapping, records, page_size)
    }

    pub fn new(
        entity: EntityType,
        mapping: HeaderMapping,
        records: Vec<EditableRecord>,
        page_size: usize,
    ) -> Self {
        let selection = (0..records.len()).collect();
        Self {
            entity,
            fields: fields_for(entity),
            mapping,
            records,
            selection,
            page: 1,
            page_size: page_size.max(1),
            banner: None,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn fields(&self) -> &'static [SchemaField] {
        self.fields
    }

    pub fn mapping(&self) -> &HeaderMapping {
        &self.mapping
    }

    pub fn records(&self) -> &[EditableRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&EditableRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ==========================================
    // 选择
    // ==========================================

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn select_all(&mut self) {
        self.selection = (0..self.records.len()).collect();
        self.clear_banner();
    }

    pub fn select_none(&mut self) {
        self.selection.clear();
        self.clear_banner();
    }

    /// 切换单行选中状态，返回切换后的状态
    pub fn toggle(&mut self, index: usize) -> ImportResult<bool> {
        self.check_index(index)?;
        let selected = if self.selection.remove(&index) {
            false
        } else {
            self.selection.insert(index);
            true
        };
        self.clear_banner();
        Ok(selected)
    }

    // ==========================================
    // 编辑
    // ==========================================

    /// 覆盖单元格值（仅允许 schema 内的字段）
    pub fn edit_cell(&mut self, index: usize, field_key: &str, value: impl Into<String>) -> ImportResult<()> {
        self.check_index(index)?;
        self.check_field(field_key)?;
        if let Some(cell) = self.records[index].get_mut(field_key) {
            *cell = value.into();
        }
        self.clear_banner();
        debug!(index, field = field_key, "单元格已编辑");
        Ok(())
    }

    /// 列重映射：把字段改为取自另一个源表头（None 表示取消映射）
    ///
    /// 说明：
    /// - 同一表头只能被一个字段占用，原占用字段被取消映射并清空该列
    /// - 被重映射的列会从原始行重新投影，覆盖该列已有编辑
    pub fn remap_field(
        &mut self,
        field_key: &str,
        header: Option<&str>,
        source_rows: &[SourceRow],
    ) -> ImportResult<()> {
        self.check_field(field_key)?;

        if let Some(header) = header {
            if !source_rows.iter().any(|row| row.contains_key(header)) {
                return Err(ImportError::UnknownHeader(header.to_string()));
            }
            let previous_owner = self
                .mapping
                .field_for_header(header)
                .filter(|owner| *owner != field_key)
                .map(str::to_string);
            if let Some(owner) = previous_owner {
                self.mapping.remove(&owner);
                self.fill_column(&owner, std::iter::repeat(String::new()));
            }
            self.mapping.insert(field_key, header);
        } else {
            self.mapping.remove(field_key);
        }

        let column = RowNormalizer.project_column(source_rows, &self.mapping, field_key);
        self.fill_column(field_key, column.into_iter());
        self.clear_banner();
        Ok(())
    }

    fn fill_column(&mut self, field_key: &str, values: impl Iterator<Item = String>) {
        for (record, value) in self.records.iter_mut().zip(values) {
            if let Some(cell) = record.get_mut(field_key) {
                *cell = value;
            }
        }
    }

    // ==========================================
    // 校验
    // ==========================================

    /// 单行缺失的必填字段标签
    pub fn missing_fields(&self, index: usize) -> ImportResult<Vec<String>> {
        self.check_index(index)?;
        Ok(RequiredFieldValidator.validate(&self.records[index], self.fields))
    }

    /// 选中行的校验报告（每次重新计算）
    pub fn validation_report(&self) -> ValidationReport {
        RequiredFieldValidator.validate_selected(&self.records, &self.selection, self.fields)
    }

    /// 选中行（按下标升序）
    pub fn selected_records(&self) -> Vec<EditableRecord> {
        self.selection
            .iter()
            .filter_map(|&index| self.records.get(index))
            .cloned()
            .collect()
    }

    // ==========================================
    // 分页
    // ==========================================

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.records.len().div_ceil(self.page_size).max(1)
    }

    /// 跳转到第 n 页（越界时夹紧到 [1, total_pages]）
    pub fn page(&mut self, n: usize) -> PageView {
        self.page = n.clamp(1, self.total_pages());
        self.current_view()
    }

    pub fn current_view(&self) -> PageView {
        let start = (self.page - 1) * self.page_size;
        let rows = self
            .records
            .iter()
            .enumerate()
            .skip(start)
            .take(self.page_size)
            .map(|(index, record)| PageRow {
                index,
                selected: self.is_selected(index),
                record: record.clone(),
                missing: RequiredFieldValidator.validate(record, self.fields),
            })
            .collect();

        PageView {
            page: self.page,
            total_pages: self.total_pages(),
            page_size: self.page_size,
            total_rows: self.records.len(),
            rows,
        }
    }

    // ==========================================
    // 校验提示（仅由上一次确认尝试产生）
    // ==========================================

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub(crate) fn set_banner(&mut self, message: String) {
        self.banner = Some(message);
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    fn check_index(&self, index: usize) -> ImportResult<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(ImportError::RowOutOfRange {
                index,
                count: self.records.len(),
            })
        }
    }

    fn check_field(&self, field_key: &str) -> ImportResult<()> {
        find_field(self.fields, field_key)
            .map(|_| ())
            .ok_or_else(|| ImportError::UnknownField {
                entity: self.entity.to_string(),
                field: field_key.to_string(),
            })
    }
}
