//! Utility modules for genrepo-rs.

pub mod accessible;
pub mod checksum;

pub use accessible::{
    classify, collect_accessible, filter_accessible, ExistenceCheck, RequestFault, Visibility,
};
pub use checksum::sha256_hex;
