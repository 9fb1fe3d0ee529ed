use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub created: i64,
    pub tool: String,
    /// `ImageCollection::fingerprint` at build time
    pub fingerprint: [u8; 32],
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// File name of each row, in row order
    pub sources: Vec<String>,
    pub meta: Meta,
}
