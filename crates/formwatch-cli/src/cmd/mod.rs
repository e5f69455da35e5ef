pub mod responses;
pub mod serve;
pub mod tick;
pub mod tracked;
