pub mod company;
pub mod device;

pub use company::{Company, CompanyChanges, NewCompany};
pub use device::{Device, DeviceChanges, DeviceFilter, NewDevice};
