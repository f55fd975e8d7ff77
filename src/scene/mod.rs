//! Scene model: the validated description every pipeline stage reads.

pub(crate) mod model;
pub(crate) mod theme;
pub(crate) mod timing;
