pub mod manifest;
pub mod xyz;
