use thiserror::Error;

use std::io::Error as IoError;

/// Errors that may rise when parsing RINEX content
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("header line too short (invalid)")]
    HeaderLineTooShort,
    #[error("bad rinex revision format")]
    VersionFormat,
    #[error("non supported rinex revision")]
    NonSupportedVersion,
    #[error("rinex format identification")]
    TypeParsing,
    #[error("constellation parsing")]
    ConstellationParsing,
    #[error("sv parsing")]
    SVParsing,
    #[error("observable parsing")]
    ObservableParsing,
    #[error("datetime parsing")]
    DatetimeParsing,
    #[error("invalid epoch flag")]
    EpochFlag,
    #[error("end of header never found")]
    MissingEndOfHeader,
    #[error("file i/o error")]
    IoError(#[from] IoError),
}

/// Errors that may rise when producing RINEX content
#[derive(Debug, Error)]
pub enum FormattingError {
    #[error("i/o: output error")]
    OutputError(#[from] IoError),
    #[error("version to produce is not defined")]
    UndefinedVersion,
    #[error("no constellation defined or none selected")]
    NoConstellationDefinition,
    #[error("V2 navigation files require a single selected system")]
    NoSystemSelected,
}
