pub mod company;
pub mod device;

pub use company::{CompanyRepository, MemoryCompanyRepository, PgCompanyRepository};
pub use device::{DeviceRepository, MemoryDeviceRepository, PgDeviceRepository};

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
