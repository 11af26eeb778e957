use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Input path is not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("Output target is not a directory: {0}")]
    OutputNotDirectory(PathBuf),

    #[error("Output target is empty")]
    EmptyOutputTarget,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("Document has no pages: {0}")]
    Empty(PathBuf),
}

/// Internal to the OCR engine; never crosses the `OcrEngine` boundary.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to load image: {0}")]
    LoadImage(String),

    #[error("Failed to convert image: {0}")]
    ConvertImage(String),

    #[error("Failed to initialize Tesseract: {0}")]
    Init(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export file already exists: {0}")]
    FileExists(PathBuf),

    #[error("Failed to write export database '{path}': {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, TagscanError>;
