//! End-to-end behaviour against in-memory providers

mod test_profiles;
mod test_tiling_controller;
