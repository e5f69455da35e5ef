pub mod descriptor;
pub mod index;
pub mod responses;
pub mod status;
pub mod tick;
