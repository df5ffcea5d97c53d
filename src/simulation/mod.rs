pub mod city;
pub mod crime;
pub mod economy;
pub mod market;
pub mod profile;
pub mod time;
pub mod underworld;
