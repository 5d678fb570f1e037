pub mod company;
pub mod device;
pub mod health;
