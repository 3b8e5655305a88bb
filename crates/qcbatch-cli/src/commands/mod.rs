pub mod check;
pub mod collect;
pub mod run;
