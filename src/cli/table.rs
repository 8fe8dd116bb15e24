//! List output: tables, CSV and bare IDs

use std::collections::HashMap;

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::core::identity::EntityId;
use crate::core::shortid::ShortIdIndex;

/// A column of list output
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self { key, header }
    }
}

/// One record's cells, keyed by column
#[derive(Debug, Clone)]
pub struct TableRow {
    id: EntityId,
    short_id: String,
    cells: HashMap<&'static str, String>,
}

impl TableRow {
    pub fn new(id: EntityId, short_ids: &ShortIdIndex) -> Self {
        let short_id = short_ids.alias(&id).unwrap_or("-").to_string();
        Self {
            id,
            short_id,
            cells: HashMap::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.cells.insert(key, value.into());
        self
    }

    fn value(&self, key: &str) -> &str {
        self.cells.get(key).map(String::as_str).unwrap_or("-")
    }
}

/// Renders rows of one record type in the table, CSV or ID formats
pub struct TableFormatter {
    columns: &'static [ColumnDef],
    entity_plural: &'static str,
}

impl TableFormatter {
    pub fn new(columns: &'static [ColumnDef], entity_plural: &'static str) -> Self {
        Self {
            columns,
            entity_plural,
        }
    }

    /// Print rows; `Auto` means table. JSON and YAML are handled by callers.
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.id);
                }
            }
            OutputFormat::Csv => print!("{}", self.render_csv(rows)),
            _ => {
                println!("{}", self.render_table(rows));
                println!("{} {}", rows.len(), self.entity_plural);
            }
        }
    }

    fn headers(&self) -> Vec<String> {
        std::iter::once("SHORT".to_string())
            .chain(self.columns.iter().map(|c| c.header.to_string()))
            .collect()
    }

    fn values(&self, row: &TableRow) -> Vec<String> {
        std::iter::once(row.short_id.clone())
            .chain(self.columns.iter().map(|c| row.value(c.key).to_string()))
            .collect()
    }

    pub fn render_table(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers());
        for row in rows {
            builder.push_record(self.values(row));
        }
        let mut table = builder.build();
        table.with(Style::sharp());
        table.to_string()
    }

    pub fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["id".to_string()];
        header.extend(self.columns.iter().map(|c| c.key.to_string()));
        let _ = writer.write_record(&header);
        for row in rows {
            let mut record = vec![row.id.to_string()];
            record.extend(self.columns.iter().map(|c| row.value(c.key).to_string()));
            let _ = writer.write_record(&record);
        }
        writer
            .into_inner()
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }
}
