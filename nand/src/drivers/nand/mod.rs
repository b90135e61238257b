//! NAND flash controllers
//!
//! Only the Denali front end lives here. The [`catalog`] says what each
//! integration needs; [`denali_dt`] gathers resources and probes.

pub mod catalog;
pub mod denali_dt;
