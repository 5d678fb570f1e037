mod handler;

pub use handler::{create_device, delete_device, search_devices, update_device};
