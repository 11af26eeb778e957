use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};

use crate::broadcast::log_sink::LogEntry;
use crate::classifier::ClassifiedItem;
use crate::error::ExportError;
use crate::pipeline::page::PageResult;

use super::Exporter;

/// `type` value of every equipment row.
pub const EQUIPMENT_TYPE: &str = "EQUIP";

const SCHEMA: &str = "
    CREATE TABLE tags (
        source_file TEXT NOT NULL,
        page        INTEGER NOT NULL,
        type        TEXT NOT NULL,
        value       TEXT NOT NULL,
        confidence  REAL NOT NULL
    );
    CREATE TABLE equipment (
        source_file TEXT NOT NULL,
        page        INTEGER NOT NULL,
        type        TEXT NOT NULL,
        value       TEXT NOT NULL,
        confidence  REAL NOT NULL
    );
    CREATE TABLE log (
        timestamp   TEXT NOT NULL,
        file_name   TEXT NOT NULL,
        page        INTEGER NOT NULL,
        status      TEXT NOT NULL,
        message     TEXT NOT NULL
    );
";

/// Writes one `tag_index_<timestamp>.sqlite` database per run.
pub struct SqliteExporter;

impl SqliteExporter {
    pub fn new() -> Self {
        Self
    }

    fn write(
        path: &Path,
        results: &[PageResult],
        logs: &[LogEntry],
    ) -> Result<(), rusqlite::Error> {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;

        {
            let mut insert_tag = tx.prepare(
                "INSERT INTO tags (source_file, page, type, value, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut insert_equipment = tx.prepare(
                "INSERT INTO equipment (source_file, page, type, value, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for page in results {
                for item in &page.items {
                    match item {
                        ClassifiedItem::Tag {
                            tag_type,
                            value,
                            confidence,
                        } => {
                            insert_tag.execute(params![
                                page.source_file,
                                page.page_number,
                                tag_type,
                                value,
                                confidence,
                            ])?;
                        }
                        ClassifiedItem::Equipment { value, confidence } => {
                            insert_equipment.execute(params![
                                page.source_file,
                                page.page_number,
                                EQUIPMENT_TYPE,
                                value,
                                confidence,
                            ])?;
                        }
                    }
                }
            }

            let mut insert_log = tx.prepare(
                "INSERT INTO log (timestamp, file_name, page, status, message)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in logs {
                insert_log.execute(params![
                    entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    entry.file_name,
                    entry.page,
                    entry.status.as_str(),
                    entry.message,
                ])?;
            }
        }

        tx.commit()
    }
}

impl Default for SqliteExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for SqliteExporter {
    fn export(
        &self,
        output_dir: &Path,
        results: &[PageResult],
        logs: &[LogEntry],
    ) -> Result<PathBuf, ExportError> {
        let _span = tracing::info_span!("export.sqlite").entered();

        std::fs::create_dir_all(output_dir).map_err(|e| ExportError::CreateDirectory {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let file_name = format!("tag_index_{}.sqlite", Utc::now().format("%Y%m%d_%H%M%S_%3f"));
        let path = output_dir.join(file_name);
        if path.exists() {
            return Err(ExportError::FileExists(path));
        }

        Self::write(&path, results, logs).map_err(|e| {
            // do not leave a half-written database behind
            let _ = std::fs::remove_file(&path);
            ExportError::Database {
                path: path.clone(),
                source: e,
            }
        })?;

        tracing::info!(path = %path.display(), pages = results.len(), "Exported tag index");
        Ok(path)
    }
}
