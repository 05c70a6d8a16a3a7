use thiserror::Error;

use crate::models::SubjectId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttendanceError {
    #[error("invalid record for subject {id}: attended {attended} of {total} classes")]
    InvalidRecord {
        id: SubjectId,
        attended: u32,
        total: u32,
    },

    #[error("invalid required percentage {value} for subject {id}: must be within 0..=100")]
    InvalidThreshold { id: SubjectId, value: f64 },

    #[error("attendance percentage for subject {id} is undefined: no classes held")]
    DivisionUndefined { id: SubjectId },

    #[error("subject {id} cannot reach {required}% by attending more classes")]
    ThresholdUnreachable { id: SubjectId, required: f64 },

    #[error("unknown subject: {0}")]
    UnknownSubject(SubjectId),

    #[error("duplicate subject: {0}")]
    DuplicateSubject(SubjectId),
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
