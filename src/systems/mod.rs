pub mod intake;
pub mod market;
pub mod notify;
pub mod police;
pub mod trust;
pub mod wanted;
