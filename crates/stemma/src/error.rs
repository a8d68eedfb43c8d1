#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fulcrum person not found in pedigree: {id}")]
    UnknownFulcrum { id: String },
    #[error("family {family_id} references an unknown person: {person_id}")]
    UnknownPerson {
        family_id: String,
        person_id: String,
    },
    #[error("pedigree contains a duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("pedigree JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
