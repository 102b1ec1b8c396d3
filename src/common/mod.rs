mod download;
mod fs;

pub(crate) use download::*;
pub(crate) use fs::*;
