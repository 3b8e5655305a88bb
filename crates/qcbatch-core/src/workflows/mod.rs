pub mod collect;
pub mod submit;
